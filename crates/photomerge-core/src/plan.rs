// photomerge - merge photo sidecar metadata into media files
// Copyright (C) 2026  photomerge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Merge planning
//!
//! Decides which embedded tags a media file receives from its sidecar.

use crate::error::MergeError;
use crate::sidecar::SidecarRecord;
use crate::time::{TimeResolver, TimeStrategy};
use photomerge_config::MergeSettings;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Embedded metadata tags this tool writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tag {
    Title,
    ImageDescription,
    DateTimeOriginal,
    #[serde(rename = "URL")]
    Url,
    #[serde(rename = "GPSLatitude")]
    GpsLatitude,
    #[serde(rename = "GPSLongitude")]
    GpsLongitude,
    #[serde(rename = "GPSAltitude")]
    GpsAltitude,
}

impl Tag {
    /// Tag name as the metadata writer expects it
    pub fn name(self) -> &'static str {
        match self {
            Tag::Title => "Title",
            Tag::ImageDescription => "ImageDescription",
            Tag::DateTimeOriginal => "DateTimeOriginal",
            Tag::Url => "URL",
            Tag::GpsLatitude => "GPSLatitude",
            Tag::GpsLongitude => "GPSLongitude",
            Tag::GpsAltitude => "GPSAltitude",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value for one tag
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Text(String),
    /// Decimal degrees or meters
    Number(f64),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Text(s) => f.write_str(s),
            TagValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Tags to write to one media file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldPlan {
    /// Tag values, in tag order
    pub fields: BTreeMap<Tag, TagValue>,
    /// Passed through to the writer; the planner cannot see existing tags
    pub overwrite_existing: bool,
    /// Pass the writer's minor-error tolerance flag
    pub ignore_minor_errors: bool,
}

impl FieldPlan {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of tags to write
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Value planned for `tag`, if any
    pub fn get(&self, tag: Tag) -> Option<&TagValue> {
        self.fields.get(&tag)
    }

    /// Tags in the plan, in canonical order
    pub fn tags(&self) -> Vec<Tag> {
        self.fields.keys().copied().collect()
    }
}

/// Result of planning one sidecar
#[derive(Debug)]
pub struct PlannedMerge {
    pub plan: FieldPlan,
    /// How `DateTimeOriginal` was resolved, when it is in the plan
    pub time: Option<TimeStrategy>,
    /// Non-fatal problems hit while planning
    pub warnings: Vec<MergeError>,
}

/// Builds a [`FieldPlan`] per sidecar record
#[derive(Debug, Clone, Copy)]
pub struct MergePlanner<'a> {
    settings: &'a MergeSettings,
    resolver: &'a TimeResolver,
}

impl<'a> MergePlanner<'a> {
    pub fn new(settings: &'a MergeSettings, resolver: &'a TimeResolver) -> Self {
        Self { settings, resolver }
    }

    /// Plan the merge of `record`.
    ///
    /// A recorded-as-zero GPS axis is never planned. A plan with no fields
    /// is valid and writes nothing.
    pub fn plan(&self, record: &SidecarRecord) -> PlannedMerge {
        let toggles = &self.settings.fields;
        let mut fields = BTreeMap::new();
        let mut warnings = Vec::new();
        let mut time = None;

        if toggles.title {
            fields.insert(Tag::Title, TagValue::Text(record.title.clone()));
        }
        if toggles.description {
            fields.insert(
                Tag::ImageDescription,
                TagValue::Text(record.description.clone()),
            );
        }
        if toggles.date_taken {
            match self.resolver.resolve(
                record.captured_at_epoch,
                record.geo.as_ref(),
                self.settings,
            ) {
                Ok(resolved) => {
                    fields.insert(Tag::DateTimeOriginal, TagValue::Text(resolved.formatted));
                    time = Some(resolved.strategy);
                    warnings.extend(resolved.warnings);
                }
                Err(e) => warnings.push(e),
            }
        }
        if toggles.url {
            fields.insert(Tag::Url, TagValue::Text(record.source_url.clone()));
        }
        if toggles.gps {
            if let Some(geo) = &record.geo {
                let axes = [
                    (Tag::GpsLatitude, geo.latitude()),
                    (Tag::GpsLongitude, geo.longitude()),
                    (Tag::GpsAltitude, geo.altitude()),
                ];
                for (tag, value) in axes {
                    if let Some(v) = value {
                        fields.insert(tag, TagValue::Number(v));
                    }
                }
            }
        }

        PlannedMerge {
            plan: FieldPlan {
                fields,
                overwrite_existing: self.settings.overwrite_existing_tags,
                ignore_minor_errors: self.settings.ignore_minor_errors,
            },
            time,
            warnings,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sidecar::GeoData;
    use crate::time::StaticLookup;
    use photomerge_config::FieldToggles;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn resolver() -> TimeResolver {
        TimeResolver::new(Arc::new(StaticLookup::new("Asia/Tokyo")))
    }

    fn settings(fields: FieldToggles) -> MergeSettings {
        MergeSettings {
            fields,
            timezone_offset: "+0000".to_string(),
            ..MergeSettings::default()
        }
    }

    fn sunset() -> SidecarRecord {
        SidecarRecord {
            title: "Sunset".to_string(),
            description: String::new(),
            captured_at_epoch: 1_609_459_200,
            source_url: "https://example.com/p/1".to_string(),
            geo: Some(GeoData {
                latitude: 35.0,
                longitude: 139.0,
                altitude: 0.0,
            }),
        }
    }

    #[test]
    fn test_tag_names() {
        let names: Vec<_> = [
            Tag::Title,
            Tag::ImageDescription,
            Tag::DateTimeOriginal,
            Tag::Url,
            Tag::GpsLatitude,
            Tag::GpsLongitude,
            Tag::GpsAltitude,
        ]
        .iter()
        .map(|t| t.name())
        .collect();
        assert_eq!(
            names,
            [
                "Title",
                "ImageDescription",
                "DateTimeOriginal",
                "URL",
                "GPSLatitude",
                "GPSLongitude",
                "GPSAltitude"
            ]
        );
    }

    #[test]
    fn test_full_plan() {
        let s = settings(FieldToggles::all());
        let r = resolver();
        let planned = MergePlanner::new(&s, &r).plan(&sunset());
        let plan = planned.plan;

        assert_eq!(plan.get(Tag::Title), Some(&TagValue::Text("Sunset".into())));
        assert_eq!(plan.get(Tag::ImageDescription), Some(&TagValue::Text(String::new())));
        assert_eq!(
            plan.get(Tag::DateTimeOriginal),
            Some(&TagValue::Text("2021:01:01 09:00:00".into()))
        );
        assert_eq!(plan.get(Tag::GpsLatitude), Some(&TagValue::Number(35.0)));
        assert_eq!(plan.get(Tag::GpsLongitude), Some(&TagValue::Number(139.0)));
        assert_eq!(plan.get(Tag::GpsAltitude), None);
        assert!(plan.overwrite_existing);
        assert!(planned.warnings.is_empty());
        assert!(matches!(planned.time, Some(TimeStrategy::Gps { .. })));
    }

    #[test]
    fn test_all_disabled_is_empty() {
        let s = settings(FieldToggles::none());
        let r = resolver();
        let planned = MergePlanner::new(&s, &r).plan(&sunset());
        assert!(planned.plan.is_empty());
        assert!(planned.time.is_none());
    }

    #[test]
    fn test_single_category() {
        let s = settings(FieldToggles {
            url: true,
            ..FieldToggles::none()
        });
        let r = resolver();
        let plan = MergePlanner::new(&s, &r).plan(&sunset()).plan;
        assert_eq!(plan.tags(), vec![Tag::Url]);
    }

    #[test]
    fn test_invalid_timestamp_drops_date_only() {
        let s = settings(FieldToggles::all());
        let r = resolver();
        let mut record = sunset();
        record.captured_at_epoch = i64::MIN;

        let planned = MergePlanner::new(&s, &r).plan(&record);
        assert!(planned.plan.get(Tag::DateTimeOriginal).is_none());
        assert!(planned.plan.get(Tag::Title).is_some());
        assert!(matches!(planned.warnings[..], [MergeError::InvalidTimestamp(_)]));
    }

    #[test]
    fn test_plan_serializes_with_tag_names() {
        let s = settings(FieldToggles {
            title: true,
            gps: true,
            ..FieldToggles::none()
        });
        let r = resolver();
        let plan = MergePlanner::new(&s, &r).plan(&sunset()).plan;
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["fields"]["Title"], "Sunset");
        assert_eq!(json["fields"]["GPSLatitude"], 35.0);
    }

    proptest! {
        #[test]
        fn prop_zero_axes_never_planned(
            lat in prop_oneof![Just(0.0f64), -90.0f64..90.0],
            lon in prop_oneof![Just(0.0f64), -180.0f64..180.0],
            alt in prop_oneof![Just(0.0f64), -500.0f64..9000.0],
        ) {
            let s = settings(FieldToggles::all());
            let r = resolver();
            let mut record = sunset();
            record.geo = Some(GeoData { latitude: lat, longitude: lon, altitude: alt });

            let plan = MergePlanner::new(&s, &r).plan(&record).plan;
            for (tag, value) in [(Tag::GpsLatitude, lat), (Tag::GpsLongitude, lon), (Tag::GpsAltitude, alt)] {
                prop_assert_eq!(plan.get(tag).is_some(), value != 0.0);
            }
        }

        #[test]
        fn prop_planning_is_deterministic(epoch in 0i64..4_102_444_800, title in ".*") {
            let s = settings(FieldToggles::all());
            let r = resolver();
            let mut record = sunset();
            record.captured_at_epoch = epoch;
            record.title = title;

            let planner = MergePlanner::new(&s, &r);
            prop_assert_eq!(planner.plan(&record).plan, planner.plan(&record).plan);
        }
    }
}
