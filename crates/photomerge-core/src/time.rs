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

//! Capture time resolution
//!
//! Turns a sidecar's UTC epoch into the local wall-clock string embedded as
//! `DateTimeOriginal`. Strategies, tried in order:
//!
//! 1. **GPS**: when both coordinates are recorded and GPS inference is on,
//!    the zone at that location.
//! 2. **Fixed offset**: the configured `±HHMM` offset.
//! 3. **UTC**: when the configured offset is malformed.
//!
//! Each downgrade is kept as a warning on the [`ResolvedTime`].

use crate::error::{MergeError, Result};
use crate::sidecar::GeoData;
use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Utc};
use chrono_tz::Tz;
use photomerge_config::MergeSettings;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use tzf_rs::DefaultFinder;

/// Embedded metadata date pattern
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Format `local` for embedding.
///
/// The pattern only holds four-digit years, so anything outside 0..=9999
/// is rejected as an invalid timestamp.
fn exif_format<Z: TimeZone>(local: DateTime<Z>, epoch: i64) -> Result<String>
where
    Z::Offset: fmt::Display,
{
    if !(0..=9999).contains(&local.year()) {
        return Err(MergeError::InvalidTimestamp(epoch));
    }
    Ok(local.format(EXIF_DATE_FORMAT).to_string())
}

/// Parse a signed `+HHMM` / `-HHMM` offset.
///
/// The sign is mandatory and applies to both hours and minutes.
pub fn parse_offset(raw: &str) -> Result<FixedOffset> {
    let invalid = || MergeError::TimezoneOffset(raw.to_string());

    if raw.len() != 5 || !raw.is_ascii() {
        return Err(invalid());
    }
    let (sign, digits) = raw.split_at(1);
    let sign = match sign {
        "+" => 1,
        "-" => -1,
        _ => return Err(invalid()),
    };
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Maps a coordinate pair to an IANA zone name
pub trait TimezoneLookup: Send + Sync {
    /// Zone name at the given position, if any
    fn zone_name(&self, latitude: f64, longitude: f64) -> Option<String>;
}

/// Offline lookup backed by the bundled timezone boundary data
#[derive(Clone)]
pub struct TzfLookup {
    finder: Arc<DefaultFinder>,
}

impl TzfLookup {
    /// Load the boundary data. This takes a noticeable moment; build once per process.
    pub fn new() -> Self {
        Self {
            finder: Arc::new(DefaultFinder::new()),
        }
    }
}

impl Default for TzfLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TzfLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TzfLookup").finish_non_exhaustive()
    }
}

impl TimezoneLookup for TzfLookup {
    fn zone_name(&self, latitude: f64, longitude: f64) -> Option<String> {
        let name = self.finder.get_tz_name(longitude, latitude);
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// Lookup that answers the same zone everywhere
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    zone: Option<String>,
}

impl StaticLookup {
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            zone: Some(zone.into()),
        }
    }

    /// A lookup that never finds a zone
    pub fn none() -> Self {
        Self { zone: None }
    }
}

impl TimezoneLookup for StaticLookup {
    fn zone_name(&self, _latitude: f64, _longitude: f64) -> Option<String> {
        self.zone.clone()
    }
}

/// Strategy that produced a [`ResolvedTime`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeStrategy {
    /// Zone found at the recorded coordinates
    Gps { zone: String },
    /// Configured `±HHMM` offset
    FixedOffset { offset: String },
    /// Malformed offset fallback
    Utc,
}

impl fmt::Display for TimeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeStrategy::Gps { zone } => write!(f, "GPS timezone {}", zone),
            TimeStrategy::FixedOffset { offset } => write!(f, "fixed offset {}", offset),
            TimeStrategy::Utc => write!(f, "UTC"),
        }
    }
}

/// Formatted local capture time
#[derive(Debug)]
pub struct ResolvedTime {
    /// `YYYY:MM:DD HH:MM:SS`
    pub formatted: String,
    /// How `formatted` was obtained
    pub strategy: TimeStrategy,
    /// Fallbacks taken on the way, oldest first
    pub warnings: Vec<MergeError>,
}

/// Resolves capture times against a timezone lookup
#[derive(Clone)]
pub struct TimeResolver {
    lookup: Arc<dyn TimezoneLookup>,
}

impl TimeResolver {
    pub fn new(lookup: Arc<dyn TimezoneLookup>) -> Self {
        Self { lookup }
    }

    /// Resolver using [`TzfLookup`]
    pub fn with_default_lookup() -> Self {
        Self::new(Arc::new(TzfLookup::new()))
    }

    /// Resolve `epoch` (UTC seconds) into a local timestamp.
    ///
    /// Fails only with [`MergeError::InvalidTimestamp`]; every other problem
    /// degrades to the next strategy and is recorded as a warning.
    pub fn resolve(
        &self,
        epoch: i64,
        geo: Option<&GeoData>,
        settings: &MergeSettings,
    ) -> Result<ResolvedTime> {
        let utc =
            DateTime::<Utc>::from_timestamp(epoch, 0).ok_or(MergeError::InvalidTimestamp(epoch))?;
        let mut warnings = Vec::new();

        if settings.infer_timezone_from_gps {
            let coordinates = geo.and_then(|g| Some((g.latitude()?, g.longitude()?)));
            if let Some((latitude, longitude)) = coordinates {
                match self.zone_at(latitude, longitude) {
                    Ok((zone, tz)) => {
                        debug!(zone = %zone, "Capture time resolved from GPS");
                        return Ok(ResolvedTime {
                            formatted: exif_format(utc.with_timezone(&tz), epoch)?,
                            strategy: TimeStrategy::Gps { zone },
                            warnings,
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "Falling back to fixed offset");
                        warnings.push(e);
                    }
                }
            }
        }

        match parse_offset(&settings.timezone_offset) {
            Ok(offset) => Ok(ResolvedTime {
                formatted: exif_format(utc.with_timezone(&offset), epoch)?,
                strategy: TimeStrategy::FixedOffset {
                    offset: settings.timezone_offset.clone(),
                },
                warnings,
            }),
            Err(e) => {
                warn!(error = %e, "Falling back to UTC");
                warnings.push(e);
                Ok(ResolvedTime {
                    formatted: exif_format(utc, epoch)?,
                    strategy: TimeStrategy::Utc,
                    warnings,
                })
            }
        }
    }

    fn zone_at(&self, latitude: f64, longitude: f64) -> Result<(String, Tz)> {
        let lookup_error = |reason: String| MergeError::TimezoneLookup {
            latitude,
            longitude,
            reason,
        };

        let zone = self
            .lookup
            .zone_name(latitude, longitude)
            .ok_or_else(|| lookup_error("no zone at this position".to_string()))?;
        let tz = zone
            .parse::<Tz>()
            .map_err(|e| lookup_error(format!("unknown zone '{}': {}", zone, e)))?;
        Ok((zone, tz))
    }
}

impl fmt::Debug for TimeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NEW_YEAR_2021: i64 = 1_609_459_200;

    fn settings(offset: &str, gps: bool) -> MergeSettings {
        MergeSettings {
            timezone_offset: offset.to_string(),
            infer_timezone_from_gps: gps,
            ..MergeSettings::default()
        }
    }

    fn geo(latitude: f64, longitude: f64) -> GeoData {
        GeoData {
            latitude,
            longitude,
            altitude: 0.0,
        }
    }

    fn resolver(zone: Option<&str>) -> TimeResolver {
        let lookup = match zone {
            Some(z) => StaticLookup::new(z),
            None => StaticLookup::none(),
        };
        TimeResolver::new(Arc::new(lookup))
    }

    #[test]
    fn test_parse_offset_values() {
        assert_eq!(parse_offset("+0530").unwrap().local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!(parse_offset("-0800").unwrap().local_minus_utc(), -8 * 3600);
        assert_eq!(parse_offset("-0030").unwrap().local_minus_utc(), -30 * 60);
        assert_eq!(parse_offset("+0000").unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_offset_rejects_malformed() {
        for raw in ["abcd", "0530", "+530", "+05:30", "+2400", "+0560", "", "++0530", "+05a0", "+é12"] {
            assert!(
                matches!(parse_offset(raw), Err(MergeError::TimezoneOffset(_))),
                "accepted {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_fixed_offset_forward() {
        let t = resolver(None)
            .resolve(NEW_YEAR_2021, None, &settings("+0530", true))
            .unwrap();
        assert_eq!(t.formatted, "2021:01:01 05:30:00");
        assert_eq!(
            t.strategy,
            TimeStrategy::FixedOffset {
                offset: "+0530".to_string()
            }
        );
        assert!(t.warnings.is_empty());
    }

    #[test]
    fn test_fixed_offset_backward() {
        let t = resolver(None)
            .resolve(NEW_YEAR_2021, None, &settings("-0800", true))
            .unwrap();
        assert_eq!(t.formatted, "2020:12:31 16:00:00");
    }

    #[test]
    fn test_malformed_offset_falls_back_to_utc() {
        let t = resolver(None)
            .resolve(NEW_YEAR_2021, None, &settings("abcd", true))
            .unwrap();
        assert_eq!(t.formatted, "2021:01:01 00:00:00");
        assert_eq!(t.strategy, TimeStrategy::Utc);
        assert!(matches!(t.warnings[..], [MergeError::TimezoneOffset(_)]));
    }

    #[test]
    fn test_gps_zone_used() {
        let g = geo(35.0, 139.0);
        let t = resolver(Some("Asia/Tokyo"))
            .resolve(NEW_YEAR_2021, Some(&g), &settings("-0800", true))
            .unwrap();
        assert_eq!(t.formatted, "2021:01:01 09:00:00");
        assert_eq!(
            t.strategy,
            TimeStrategy::Gps {
                zone: "Asia/Tokyo".to_string()
            }
        );
    }

    #[test]
    fn test_gps_zone_observes_daylight_saving() {
        // 2021-07-01 12:00:00 UTC
        let g = geo(40.7, -74.0);
        let t = resolver(Some("America/New_York"))
            .resolve(1_625_140_800, Some(&g), &settings("+0000", true))
            .unwrap();
        assert_eq!(t.formatted, "2021:07:01 08:00:00");
    }

    #[test]
    fn test_gps_disabled_uses_offset() {
        let g = geo(35.0, 139.0);
        let t = resolver(Some("Asia/Tokyo"))
            .resolve(NEW_YEAR_2021, Some(&g), &settings("+0100", false))
            .unwrap();
        assert_eq!(t.formatted, "2021:01:01 01:00:00");
    }

    #[test]
    fn test_gps_needs_both_axes() {
        let g = geo(35.0, 0.0);
        let t = resolver(Some("Asia/Tokyo"))
            .resolve(NEW_YEAR_2021, Some(&g), &settings("+0100", true))
            .unwrap();
        assert_eq!(t.formatted, "2021:01:01 01:00:00");
        assert!(t.warnings.is_empty());
    }

    #[test]
    fn test_lookup_miss_falls_back_to_offset() {
        let g = geo(35.0, 139.0);
        let t = resolver(None)
            .resolve(NEW_YEAR_2021, Some(&g), &settings("+0100", true))
            .unwrap();
        assert_eq!(t.formatted, "2021:01:01 01:00:00");
        assert!(matches!(t.warnings[..], [MergeError::TimezoneLookup { .. }]));
    }

    #[test]
    fn test_unknown_zone_falls_back_to_offset() {
        let g = geo(35.0, 139.0);
        let t = resolver(Some("Mars/Olympus_Mons"))
            .resolve(NEW_YEAR_2021, Some(&g), &settings("+0100", true))
            .unwrap();
        assert_eq!(t.formatted, "2021:01:01 01:00:00");
        assert!(matches!(t.warnings[..], [MergeError::TimezoneLookup { .. }]));
    }

    #[test]
    fn test_double_fallback_keeps_both_warnings() {
        let g = geo(35.0, 139.0);
        let t = resolver(None)
            .resolve(NEW_YEAR_2021, Some(&g), &settings("bogus", true))
            .unwrap();
        assert_eq!(t.strategy, TimeStrategy::Utc);
        assert_eq!(t.warnings.len(), 2);
    }

    #[test]
    fn test_zero_epoch_is_unix_epoch() {
        let t = resolver(None).resolve(0, None, &settings("+0000", true)).unwrap();
        assert_eq!(t.formatted, "1970:01:01 00:00:00");
    }

    #[test]
    fn test_out_of_range_epoch() {
        let err = resolver(None)
            .resolve(i64::MAX, None, &settings("+0000", true))
            .unwrap_err();
        assert!(matches!(err, MergeError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_epoch_outside_four_digit_years() {
        let r = resolver(None);
        for epoch in [253_402_300_800, -62_167_219_201] {
            let err = r
                .resolve(epoch, None, &settings("+0000", true))
                .unwrap_err();
            assert!(matches!(err, MergeError::InvalidTimestamp(e) if e == epoch));
        }

        // 9999-12-31 23:30 UTC only overflows once shifted east
        let late = 253_402_299_000;
        assert!(r.resolve(late, None, &settings("+0100", true)).is_err());
        let ok = r.resolve(late, None, &settings("-0100", true)).unwrap();
        assert_eq!(ok.formatted, "9999:12:31 22:30:00");
        let utc = r.resolve(late, None, &settings("bogus", true)).unwrap();
        assert_eq!(utc.formatted, "9999:12:31 23:30:00");
    }

    #[test]
    fn test_tzf_lookup_tokyo() {
        let lookup = TzfLookup::new();
        assert_eq!(
            lookup.zone_name(35.6812, 139.7671).as_deref(),
            Some("Asia/Tokyo")
        );
    }

    proptest! {
        #[test]
        fn prop_well_formed_offsets_parse(negative in any::<bool>(), h in 0i32..=23, m in 0i32..=59) {
            let raw = format!("{}{:02}{:02}", if negative { '-' } else { '+' }, h, m);
            let expected = (h * 3600 + m * 60) * if negative { -1 } else { 1 };
            prop_assert_eq!(parse_offset(&raw).unwrap().local_minus_utc(), expected);
        }

        #[test]
        fn prop_unsigned_offsets_rejected(digits in "[0-9]{4}") {
            prop_assert!(parse_offset(&digits).is_err());
        }

        #[test]
        fn prop_formatted_shape(epoch in 0i64..4_102_444_800) {
            let t = resolver(None).resolve(epoch, None, &settings("+0000", false)).unwrap();
            prop_assert_eq!(t.formatted.len(), 19);
            prop_assert_eq!(&t.formatted[4..5], ":");
            prop_assert_eq!(&t.formatted[10..11], " ");
        }
    }
}
