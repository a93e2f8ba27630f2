//! Pure status transitions.
//!
//! | from        | to          | trigger           | stamps             |
//! |-------------|-------------|-------------------|--------------------|
//! | submitted   | in-progress | admin approval    | approvedAt (once)  |
//! | in-progress | resolved    | admin marks solved| resolvedAt (once)  |
//! | resolved    | submitted   | citizen dispute   | none               |
//!
//! These functions only touch the report they are given; the store decides whether the
//! result is committed.

use time::OffsetDateTime;

use crate::domain::{Report, ReportStatus};
use crate::error::AppError;

/// Status an admin may move a report into from `current`, if any.
pub fn admin_next_status(current: ReportStatus) -> Option<ReportStatus> {
    match current {
        ReportStatus::Submitted => Some(ReportStatus::InProgress),
        ReportStatus::InProgress => Some(ReportStatus::Resolved),
        ReportStatus::Resolved => None,
    }
}

fn blank_to_none(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Admin-driven forward move. Refuses anything but the single next step.
pub fn advance(
    report: &mut Report,
    target: ReportStatus,
    admin_response: Option<&str>,
    now: OffsetDateTime,
) -> Result<(), AppError> {
    if admin_next_status(report.status) != Some(target) {
        return Err(AppError::invalid_transition(format!(
            "Cannot move report from {} to {}",
            report.status, target
        ))
        .with_details(format!("id={}", report.id)));
    }

    report.status = target;
    match target {
        ReportStatus::InProgress => {
            report.approved_at.get_or_insert(now);
        }
        ReportStatus::Resolved => {
            report.resolved_at.get_or_insert(now);
        }
        ReportStatus::Submitted => {}
    }
    report.user_reported_unresolved = false;
    if let Some(response) = blank_to_none(admin_response) {
        report.admin_response = Some(response);
    }
    Ok(())
}

/// Citizen says a resolved problem still exists: back to the admin queue, history kept.
pub fn dispute(report: &mut Report, explanation: Option<&str>) -> Result<(), AppError> {
    ensure_resolved(report, "dispute")?;
    report.status = ReportStatus::Submitted;
    report.user_reported_unresolved = true;
    if let Some(explanation) = blank_to_none(explanation) {
        report.user_explanation = Some(explanation);
    }
    Ok(())
}

pub fn ensure_resolved(report: &Report, action: &str) -> Result<(), AppError> {
    if report.status == ReportStatus::Resolved {
        return Ok(());
    }
    Err(AppError::invalid_transition(format!(
        "Cannot {action} a report that is {}",
        report.status
    ))
    .with_details(format!("id={}", report.id)))
}
