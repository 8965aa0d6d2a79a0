//! End-to-end tests for the merge pipeline
//!
//! These tests run the orchestrator over real directory trees built with
//! [`TakeoutFixture`], with a [`MockWriter`] standing in for exiftool and a
//! fixed timezone lookup so results do not depend on the host.

use async_trait::async_trait;
use photomerge_config::{FieldToggles, MergeSettings};
use photomerge_core::writer::mock::MockWriter;
use photomerge_core::{
    CancelHandle, CandidateKind, CollectingSink, EventLevel, FieldPlan, MergeOrchestrator,
    MetadataWriter, OutcomeStatus, RunOptions, StaticLookup, Tag, TagValue, TimeResolver,
};
use photomerge_test_utils::{sidecar_json, TakeoutFixture};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const NEW_YEAR_2021: i64 = 1_609_459_200;

fn settings() -> MergeSettings {
    MergeSettings {
        timezone_offset: "+0000".to_string(),
        ..MergeSettings::default()
    }
}

fn options(concurrency: usize) -> RunOptions {
    RunOptions {
        concurrency,
        write_timeout: Duration::from_secs(5),
        dry_run: false,
    }
}

fn orchestrator(settings: MergeSettings, writer: Arc<dyn MetadataWriter>) -> MergeOrchestrator {
    let resolver = TimeResolver::new(Arc::new(StaticLookup::new("Asia/Tokyo")));
    MergeOrchestrator::new(settings, writer, resolver).with_options(options(4))
}

#[tokio::test]
async fn test_sunset_scenario_writes_both_candidates() {
    let fixture = TakeoutFixture::new();
    let json = r#"{"title":"Sunset","photoTakenTime":{"timestamp":"1609459200"},"geoData":{"latitude":35.0,"longitude":139.0,"altitude":0}}"#;
    let (original, _) = fixture.photo("photo.jpg", json);
    let edited = fixture.edited("photo.jpg", "-edited");

    let writer = MockWriter::new();
    let report = orchestrator(settings(), Arc::new(writer.clone()))
        .run(&[fixture.photos()], &CollectingSink::new())
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.summary().written, 2);

    for target in [&original, &edited] {
        let plan = writer.plan_for(target).await.unwrap();
        assert_eq!(plan.get(Tag::Title), Some(&TagValue::Text("Sunset".into())));
        assert_eq!(
            plan.get(Tag::DateTimeOriginal),
            Some(&TagValue::Text("2021:01:01 09:00:00".into()))
        );
        assert_eq!(plan.get(Tag::GpsLatitude), Some(&TagValue::Number(35.0)));
        assert_eq!(plan.get(Tag::GpsLongitude), Some(&TagValue::Number(139.0)));
        assert_eq!(plan.get(Tag::GpsAltitude), None);
    }

    let kinds: Vec<_> = report.outcomes.iter().filter_map(|o| o.kind).collect();
    assert!(kinds.contains(&CandidateKind::Original));
    assert!(kinds.contains(&CandidateKind::Edited));
}

#[tokio::test]
async fn test_sidecar_without_media_is_informational() {
    let fixture = TakeoutFixture::new();
    let orphan = fixture.sidecar("gone.jpg", &sidecar_json("gone", NEW_YEAR_2021, 0.0, 0.0, 0.0));
    fixture.photo("kept.jpg", &sidecar_json("kept", NEW_YEAR_2021, 0.0, 0.0, 0.0));

    let sink = CollectingSink::new();
    let report = orchestrator(settings(), Arc::new(MockWriter::new()))
        .run(&[fixture.photos()], &sink)
        .await
        .unwrap();

    let summary = report.summary();
    assert_eq!(summary.no_media, 1);
    assert_eq!(summary.written, 1);
    assert_eq!(summary.failed(), 0);

    let orphan_outcome = report
        .outcomes
        .iter()
        .find(|o| o.sidecar == orphan)
        .unwrap();
    assert_eq!(orphan_outcome.status, OutcomeStatus::NoMedia);
    assert!(orphan_outcome.target.is_none());

    assert!(sink
        .at_level(EventLevel::Info)
        .iter()
        .any(|e| e.sidecar.as_deref() == Some(orphan.as_path())));
    assert!(sink.at_level(EventLevel::Error).is_empty());
}

#[tokio::test]
async fn test_one_malformed_sidecar_among_ten() {
    let fixture = TakeoutFixture::new();
    for i in 0..9 {
        fixture.photo(
            &format!("img_{i:02}.jpg"),
            &sidecar_json(&format!("photo {i}"), NEW_YEAR_2021 + i, 0.0, 0.0, 0.0),
        );
    }
    let (_, broken) = fixture.photo("broken.jpg", "{\"title\": \"oops\"");

    let sink = CollectingSink::new();
    let writer = MockWriter::new();
    let report = orchestrator(settings(), Arc::new(writer.clone()))
        .run(&[fixture.photos()], &sink)
        .await
        .unwrap();

    let summary = report.summary();
    assert_eq!(summary.written, 9);
    assert_eq!(summary.parse_failed, 1);
    assert_eq!(summary.write_failed, 0);
    assert_eq!(writer.calls(), 9);

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].sidecar, broken);

    let errors = sink.at_level(EventLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].sidecar.as_deref(), Some(broken.as_path()));
}

#[tokio::test]
async fn test_runs_are_idempotent() {
    let fixture = TakeoutFixture::new();
    fixture.photo("a.jpg", &sidecar_json("a", NEW_YEAR_2021, 48.85, 2.35, 35.0));
    fixture.photo("b.jpg", &sidecar_json("b", NEW_YEAR_2021 + 60, -33.86, 151.2, 0.0));
    fixture.edited("b.jpg", "-edited");

    let dry = orchestrator(settings(), Arc::new(MockWriter::new())).with_options(RunOptions {
        dry_run: true,
        ..options(4)
    });
    let first = dry.run(&[fixture.photos()], &CollectingSink::new()).await.unwrap();
    let second = dry.run(&[fixture.photos()], &CollectingSink::new()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.summary().planned, 3);

    let writer_a = MockWriter::new();
    let writer_b = MockWriter::new();
    for writer in [&writer_a, &writer_b] {
        orchestrator(settings(), Arc::new(writer.clone()))
            .run(&[fixture.photos()], &CollectingSink::new())
            .await
            .unwrap();
    }
    assert_eq!(writer_a.written().await, writer_b.written().await);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let fixture = TakeoutFixture::new();
    fixture.photo("a.jpg", &sidecar_json("a", NEW_YEAR_2021, 0.0, 0.0, 0.0));

    let writer = MockWriter::new();
    let report = orchestrator(settings(), Arc::new(writer.clone()))
        .with_options(RunOptions {
            dry_run: true,
            ..options(2)
        })
        .run(&[fixture.photos()], &CollectingSink::new())
        .await
        .unwrap();

    assert_eq!(writer.calls(), 0);
    match &report.outcomes[0].status {
        OutcomeStatus::Planned { plan } => assert!(plan.get(Tag::Title).is_some()),
        other => panic!("expected a planned outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_write_timeout_is_per_file() {
    let fixture = TakeoutFixture::new();
    fixture.photo("slow.jpg", &sidecar_json("slow", NEW_YEAR_2021, 0.0, 0.0, 0.0));

    let writer = MockWriter::new().with_delay(Duration::from_millis(500));
    let report = orchestrator(settings(), Arc::new(writer))
        .with_options(RunOptions {
            write_timeout: Duration::from_millis(20),
            ..options(1)
        })
        .run(&[fixture.photos()], &CollectingSink::new())
        .await
        .unwrap();

    assert_eq!(report.summary().write_failed, 1);
    match &report.outcomes[0].status {
        OutcomeStatus::WriteFailed { reason } => assert!(reason.contains("timed out")),
        other => panic!("expected a write failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_original_failure_does_not_block_edited() {
    let fixture = TakeoutFixture::new();
    let (original, _) = fixture.photo("p.jpg", &sidecar_json("p", NEW_YEAR_2021, 0.0, 0.0, 0.0));
    let edited = fixture.edited("p.jpg", "-edited");

    let writer = MockWriter::new().fail_on(original.clone(), "permission denied");
    let report = orchestrator(settings(), Arc::new(writer.clone()))
        .run(&[fixture.photos()], &CollectingSink::new())
        .await
        .unwrap();

    let status_of = |path: &Path| {
        report
            .outcomes
            .iter()
            .find(|o| o.target.as_deref() == Some(path))
            .map(|o| o.status.clone())
            .unwrap()
    };
    assert!(matches!(status_of(&original), OutcomeStatus::WriteFailed { .. }));
    assert!(matches!(status_of(&edited), OutcomeStatus::Written { .. }));
    assert!(writer.plan_for(&edited).await.is_some());
}

#[tokio::test]
async fn test_edited_variants_respect_settings() {
    let fixture = TakeoutFixture::new();
    fixture.photo("p.jpg", &sidecar_json("p", NEW_YEAR_2021, 0.0, 0.0, 0.0));
    fixture.edited("p.jpg", "-edited");
    let custom = fixture.edited("p.jpg", "_bearbeitet");

    let custom_settings = MergeSettings {
        edited_suffix: "_bearbeitet".to_string(),
        ..settings()
    };
    let writer = MockWriter::new();
    orchestrator(custom_settings, Arc::new(writer.clone()))
        .run(&[fixture.photos()], &CollectingSink::new())
        .await
        .unwrap();
    let written = writer.written().await;
    assert_eq!(written.len(), 2);
    assert!(written.contains_key(&custom));

    let no_edits = MergeSettings {
        process_edited: false,
        ..settings()
    };
    let writer = MockWriter::new();
    orchestrator(no_edits, Arc::new(writer.clone()))
        .run(&[fixture.photos()], &CollectingSink::new())
        .await
        .unwrap();
    assert_eq!(writer.written().await.len(), 1);
}

#[tokio::test]
async fn test_disabled_categories_give_empty_plans() {
    let fixture = TakeoutFixture::new();
    let (media, _) = fixture.photo("p.jpg", &sidecar_json("p", NEW_YEAR_2021, 1.0, 2.0, 3.0));

    let none = MergeSettings {
        fields: FieldToggles::none(),
        ..settings()
    };
    let writer = MockWriter::new();
    let report = orchestrator(none, Arc::new(writer.clone()))
        .run(&[fixture.photos()], &CollectingSink::new())
        .await
        .unwrap();

    assert!(writer.plan_for(&media).await.unwrap().is_empty());
    assert_eq!(
        report.outcomes[0].status,
        OutcomeStatus::Written { fields: Vec::new() }
    );
}

#[tokio::test]
async fn test_malformed_offset_warns_and_uses_utc() {
    let fixture = TakeoutFixture::new();
    let (media, _) = fixture.photo("p.jpg", &sidecar_json("p", NEW_YEAR_2021, 0.0, 0.0, 0.0));

    let bad_offset = MergeSettings {
        timezone_offset: "abcd".to_string(),
        ..settings()
    };
    let sink = CollectingSink::new();
    let writer = MockWriter::new();
    let report = orchestrator(bad_offset, Arc::new(writer.clone()))
        .run(&[fixture.photos()], &sink)
        .await
        .unwrap();

    assert_eq!(report.summary().written, 1);
    assert_eq!(report.outcomes[0].warnings.len(), 1);
    assert_eq!(sink.at_level(EventLevel::Warning).len(), 1);
    assert_eq!(
        writer.plan_for(&media).await.unwrap().get(Tag::DateTimeOriginal),
        Some(&TagValue::Text("2021:01:01 00:00:00".into()))
    );
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let fixture = TakeoutFixture::new();
    for i in 0..8 {
        fixture.photo(
            &format!("p{i}.jpg"),
            &sidecar_json("p", NEW_YEAR_2021, 0.0, 0.0, 0.0),
        );
    }

    let writer = MockWriter::new().with_delay(Duration::from_millis(20));
    let report = orchestrator(settings(), Arc::new(writer.clone()))
        .with_options(options(2))
        .run(&[fixture.photos()], &CollectingSink::new())
        .await
        .unwrap();

    assert_eq!(report.summary().written, 8);
    assert!(writer.peak_in_flight() <= 2);
}

/// Cancels the run from inside its first write
#[derive(Debug)]
struct CancellingWriter {
    inner: MockWriter,
    cancel: CancelHandle,
}

#[async_trait]
impl MetadataWriter for CancellingWriter {
    async fn write(&self, target: &Path, plan: &FieldPlan) -> photomerge_core::Result<()> {
        self.cancel.cancel();
        self.inner.write(target, plan).await
    }
}

#[tokio::test]
async fn test_cancellation_stops_between_pairs() {
    let fixture = TakeoutFixture::new();
    for i in 0..5 {
        fixture.photo(
            &format!("p{i}.jpg"),
            &sidecar_json("p", NEW_YEAR_2021, 0.0, 0.0, 0.0),
        );
    }

    let inner = MockWriter::new();
    let cancel = CancelHandle::new();
    let resolver = TimeResolver::new(Arc::new(StaticLookup::none()));
    let writer = CancellingWriter {
        inner: inner.clone(),
        cancel: cancel.clone(),
    };
    let orch = MergeOrchestrator::new(settings(), Arc::new(writer), resolver)
        .with_options(options(1))
        .with_cancel_handle(cancel);

    let sink = CollectingSink::new();
    let report = orch.run(&[fixture.photos()], &sink).await.unwrap();

    // the in-flight pair finishes, nothing else starts
    assert_eq!(report.summary().written, 1);
    assert_eq!(report.cancelled, 4);
    assert_eq!(inner.calls(), 1);
    assert!(sink
        .at_level(EventLevel::Warning)
        .iter()
        .any(|e| e.message.contains("cancelled")));
}
