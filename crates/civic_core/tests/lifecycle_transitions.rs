use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use civic_core::auth::AdminCapability;
use civic_core::clock::ManualClock;
use civic_core::domain::{NewReport, ReportFilter, ReportStatus};
use civic_core::error::{INVALID_TRANSITION, NOT_FOUND};
use civic_core::ids::SequentialIds;
use civic_core::kv::MemoryKv;
use civic_core::repo::ReportStore;

fn ts(s: &str) -> OffsetDateTime {
    OffsetDateTime::parse(s, &Rfc3339).unwrap()
}

fn store() -> (ReportStore<MemoryKv, ManualClock, SequentialIds>, ManualClock) {
    let clock = ManualClock::new(ts("2026-03-01T09:00:00Z"));
    let store =
        ReportStore::with_collaborators(MemoryKv::new(), clock.clone(), SequentialIds::new("r"));
    (store, clock)
}

fn streetlight() -> NewReport {
    NewReport {
        title: "Broken streetlight".to_string(),
        description: "Dark since Monday".to_string(),
        category: "streetlight".to_string(),
        location: "41.0082, 28.9784".to_string(),
        image_url: None,
    }
}

fn admin() -> AdminCapability {
    AdminCapability::from_flag(true).unwrap()
}

#[test]
fn milestones_are_stamped_once_across_a_dispute_cycle() {
    let (mut store, clock) = store();
    let id = store.create_report(streetlight()).unwrap().id;

    clock.advance(Duration::hours(3));
    store.advance_status(&admin(), &id, ReportStatus::InProgress).unwrap();
    clock.advance(Duration::days(2));
    store.advance_status(&admin(), &id, ReportStatus::Resolved).unwrap();
    let first = store.get_report(&id).unwrap();

    store.dispute_resolution(&id, None).unwrap();
    clock.advance(Duration::days(1));
    store.advance_status(&admin(), &id, ReportStatus::InProgress).unwrap();
    clock.advance(Duration::days(1));
    store.advance_status(&admin(), &id, ReportStatus::Resolved).unwrap();

    let second = store.get_report(&id).unwrap();
    assert_eq!(second.status, ReportStatus::Resolved);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.submitted_at, first.submitted_at);
    assert_eq!(second.approved_at, Some(ts("2026-03-01T12:00:00Z")));
    assert_eq!(second.resolved_at, Some(ts("2026-03-03T12:00:00Z")));
}

#[test]
fn resolving_a_submitted_report_fails_and_changes_nothing() {
    let (mut store, _) = store();
    let created = store.create_report(streetlight()).unwrap();

    let err = store
        .advance_status(&admin(), &created.id, ReportStatus::Resolved)
        .unwrap_err();
    assert_eq!(err.code, INVALID_TRANSITION);
    assert_eq!(store.get_report(&created.id).unwrap(), created);
}

#[test]
fn advancing_to_submitted_or_past_resolved_is_refused() {
    let (mut store, _) = store();
    let id = store.create_report(streetlight()).unwrap().id;

    let err = store
        .advance_status(&admin(), &id, ReportStatus::Submitted)
        .unwrap_err();
    assert_eq!(err.code, INVALID_TRANSITION);

    store.advance_status(&admin(), &id, ReportStatus::InProgress).unwrap();
    store.advance_status(&admin(), &id, ReportStatus::Resolved).unwrap();
    let err = store
        .advance_status(&admin(), &id, ReportStatus::Resolved)
        .unwrap_err();
    assert_eq!(err.code, INVALID_TRANSITION);
}

#[test]
fn dispute_on_unresolved_report_fails() {
    let (mut store, _) = store();
    let id = store.create_report(streetlight()).unwrap().id;

    for status in [ReportStatus::Submitted, ReportStatus::InProgress] {
        if status == ReportStatus::InProgress {
            store.advance_status(&admin(), &id, status).unwrap();
        }
        let err = store.dispute_resolution(&id, Some("still broken")).unwrap_err();
        assert_eq!(err.code, INVALID_TRANSITION);
        let r = store.get_report(&id).unwrap();
        assert_eq!(r.status, status);
        assert!(!r.user_reported_unresolved);
        assert_eq!(r.user_explanation, None);
    }
}

#[test]
fn admin_action_clears_dispute_flag_and_keeps_admin_response() {
    let (mut store, _) = store();
    let id = store.create_report(streetlight()).unwrap().id;
    store.advance_status(&admin(), &id, ReportStatus::InProgress).unwrap();
    store
        .advance_status_with_response(&admin(), &id, ReportStatus::Resolved, Some("Bulb replaced"))
        .unwrap();
    store.dispute_resolution(&id, Some("   ")).unwrap();

    let disputed = store.get_report(&id).unwrap();
    assert_eq!(disputed.status, ReportStatus::Submitted);
    assert!(disputed.user_reported_unresolved);
    assert_eq!(disputed.user_explanation, None);
    assert_eq!(disputed.admin_response.as_deref(), Some("Bulb replaced"));

    store.advance_status(&admin(), &id, ReportStatus::InProgress).unwrap();
    let reactioned = store.get_report(&id).unwrap();
    assert!(!reactioned.user_reported_unresolved);
    assert!(store.list_reports(ReportFilter::UnresolvedOnly).unwrap().is_empty());
}

#[test]
fn confirm_resolution_requires_resolved_and_writes_nothing() {
    let (mut store, _) = store();
    let id = store.create_report(streetlight()).unwrap().id;
    assert_eq!(
        store.confirm_resolution(&id).unwrap_err().code,
        INVALID_TRANSITION
    );

    store.advance_status(&admin(), &id, ReportStatus::InProgress).unwrap();
    store.advance_status(&admin(), &id, ReportStatus::Resolved).unwrap();
    let before = store.get_report(&id).unwrap();
    store.confirm_resolution(&id).unwrap();
    assert_eq!(store.get_report(&id).unwrap(), before);
}

#[test]
fn unknown_ids_are_not_found() {
    let (mut store, _) = store();
    assert_eq!(
        store
            .advance_status(&admin(), "missing", ReportStatus::InProgress)
            .unwrap_err()
            .code,
        NOT_FOUND
    );
    assert_eq!(store.dispute_resolution("missing", None).unwrap_err().code, NOT_FOUND);
    assert_eq!(store.confirm_resolution("missing").unwrap_err().code, NOT_FOUND);
    assert_eq!(store.add_comment("missing", "hi").unwrap_err().code, NOT_FOUND);
    assert_eq!(store.get_report("missing").unwrap_err().code, NOT_FOUND);
}
