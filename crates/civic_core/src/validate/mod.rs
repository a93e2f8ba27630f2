use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::clock::Clock;
use crate::domain::{Report, ReportFilter, ReportStatus, ValidationWarning};
use crate::error::AppError;
use crate::ids::IdGenerator;
use crate::kv::KeyValueStore;
use crate::repo::ReportStore;

fn order_check(
    a_field: &str,
    a: Option<OffsetDateTime>,
    b_field: &str,
    b: Option<OffsetDateTime>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let (Some(a), Some(b)) = (a, b) else { return };
    if a > b {
        warnings.push(
            ValidationWarning::new(
                "VALIDATION_TS_ORDER_VIOLATION",
                format!("Timestamp order violation: {a_field} must be <= {b_field}"),
            )
            .with_details(format!("{a_field}={a}; {b_field}={b}")),
        );
    }
}

/// Integrity check for a stored report:
/// createdAt <= submittedAt <= approvedAt <= resolvedAt (when present), each status has
/// its entry stamp, and a dispute flag only rides on a submitted report.
pub fn validate_report(report: &Report) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    order_check(
        "createdAt",
        Some(report.created_at),
        "submittedAt",
        report.submitted_at,
        &mut warnings,
    );
    order_check(
        "submittedAt",
        report.submitted_at,
        "approvedAt",
        report.approved_at,
        &mut warnings,
    );
    order_check(
        "approvedAt",
        report.approved_at,
        "resolvedAt",
        report.resolved_at,
        &mut warnings,
    );

    let missing_stamp = match report.status {
        ReportStatus::Submitted => report.submitted_at.is_none().then_some("submittedAt"),
        ReportStatus::InProgress => report.approved_at.is_none().then_some("approvedAt"),
        ReportStatus::Resolved => report.resolved_at.is_none().then_some("resolvedAt"),
    };
    if let Some(field) = missing_stamp {
        warnings.push(
            ValidationWarning::new(
                "VALIDATION_STATUS_STAMP_MISSING",
                format!("Status {} has no {field}", report.status),
            )
            .with_details(format!("id={}", report.id)),
        );
    }

    if report.user_reported_unresolved && report.status != ReportStatus::Submitted {
        warnings.push(
            ValidationWarning::new(
                "VALIDATION_DISPUTE_FLAG_MISMATCH",
                "Dispute flag set on a report that is not back in the queue",
            )
            .with_details(format!("id={}; status={}", report.id, report.status)),
        );
    }

    warnings
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportValidationItem {
    pub id: String,
    pub title: String,
    pub warnings: Vec<ValidationWarning>,
}

/// One item per stored report, in insertion order.
pub fn validate_all_reports<K, C, I>(
    store: &ReportStore<K, C, I>,
) -> Result<Vec<ReportValidationItem>, AppError>
where
    K: KeyValueStore,
    C: Clock,
    I: IdGenerator,
{
    let reports = store.list_reports(ReportFilter::All)?;
    Ok(reports
        .into_iter()
        .map(|r| {
            let warnings = validate_report(&r);
            ReportValidationItem {
                id: r.id,
                title: r.title,
                warnings,
            }
        })
        .collect())
}
