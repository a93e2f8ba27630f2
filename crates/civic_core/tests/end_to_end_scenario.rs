use pretty_assertions::assert_eq;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use civic_core::auth::AdminCapability;
use civic_core::clock::ManualClock;
use civic_core::domain::{NewReport, ReportFilter, ReportStatus};
use civic_core::ids::SequentialIds;
use civic_core::kv::MemoryKv;
use civic_core::metrics::{compute_report_metrics, DurationPolicy};
use civic_core::repo::ReportStore;

#[test]
fn streetlight_report_full_lifecycle_with_dispute() {
    let clock = ManualClock::new(OffsetDateTime::parse("2026-05-04T08:30:00Z", &Rfc3339).unwrap());
    let mut store =
        ReportStore::with_collaborators(MemoryKv::new(), clock.clone(), SequentialIds::new("rep"));
    let admin = AdminCapability::from_flag(true).unwrap();

    let other = store
        .create_report(NewReport {
            title: "Graffiti on bridge".to_string(),
            description: "Fresh tags".to_string(),
            category: "graffiti".to_string(),
            location: "River bridge".to_string(),
            image_url: None,
        })
        .unwrap();

    let created = store
        .create_report(NewReport {
            title: "Broken streetlight".to_string(),
            description: "Lamp 14 is out".to_string(),
            category: "streetlight".to_string(),
            location: "41.0151, 28.9795".to_string(),
            image_url: Some("blob:local/lamp14".to_string()),
        })
        .unwrap();
    assert_eq!(created.status, ReportStatus::Submitted);
    assert_eq!(Some(created.created_at), created.submitted_at);

    clock.advance(Duration::hours(5));
    store
        .advance_status(&admin, &created.id, ReportStatus::InProgress)
        .unwrap();
    let approved = store.get_report(&created.id).unwrap();
    assert_eq!(approved.status, ReportStatus::InProgress);
    assert_eq!(approved.approved_at, Some(clock_now(&clock)));
    assert_eq!(approved.submitted_at, created.submitted_at);

    clock.advance(Duration::days(3) + Duration::hours(2));
    store
        .advance_status(&admin, &created.id, ReportStatus::Resolved)
        .unwrap();
    let resolved = store.get_report(&created.id).unwrap();
    assert_eq!(resolved.status, ReportStatus::Resolved);
    assert_eq!(resolved.resolved_at, Some(clock_now(&clock)));

    let metrics = compute_report_metrics(&resolved, DurationPolicy::Floor);
    assert_eq!(metrics.approval_to_resolution_days, Some(3));
    let metrics = compute_report_metrics(&resolved, DurationPolicy::Ceil);
    assert_eq!(metrics.approval_to_resolution_days, Some(4));

    store
        .dispute_resolution(&created.id, Some("still broken"))
        .unwrap();
    let disputed = store.get_report(&created.id).unwrap();
    assert_eq!(disputed.status, ReportStatus::Submitted);
    assert!(disputed.user_reported_unresolved);
    assert_eq!(disputed.user_explanation.as_deref(), Some("still broken"));
    assert_eq!(disputed.approved_at, resolved.approved_at);
    assert_eq!(disputed.resolved_at, resolved.resolved_at);

    let unresolved = store.list_reports(ReportFilter::UnresolvedOnly).unwrap();
    assert_eq!(unresolved, vec![disputed]);

    let all_ids: Vec<String> = store
        .list_reports(ReportFilter::All)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(all_ids, vec![other.id, created.id]);
}

fn clock_now(clock: &ManualClock) -> OffsetDateTime {
    use civic_core::clock::Clock;
    clock.now()
}
