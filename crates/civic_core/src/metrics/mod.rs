use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::domain::Report;

/// How a partial day is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    /// Whole elapsed days; 23h counts as 0.
    #[default]
    Floor,
    /// Any started day counts; 1s counts as 1.
    Ceil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestonePair {
    SubmissionToApproval,
    ApprovalToResolution,
    SubmissionToResolution,
}

impl MilestonePair {
    pub fn endpoints(self, report: &Report) -> (Option<OffsetDateTime>, Option<OffsetDateTime>) {
        // Legacy records without submittedAt fall back to createdAt, which the
        // submission flow stamps with the same instant.
        let submitted = report.submitted_at.or(Some(report.created_at));
        match self {
            MilestonePair::SubmissionToApproval => (submitted, report.approved_at),
            MilestonePair::ApprovalToResolution => (report.approved_at, report.resolved_at),
            MilestonePair::SubmissionToResolution => (submitted, report.resolved_at),
        }
    }
}

/// Whole days between two milestones.
///
/// `None` when either endpoint is missing or `end` precedes `start` (no silent correction).
pub fn compute_duration(
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    policy: DurationPolicy,
) -> Option<i64> {
    let (Some(start), Some(end)) = (start, end) else {
        return None;
    };
    let elapsed = end - start;
    if elapsed.is_negative() {
        return None;
    }
    let days = elapsed.whole_days();
    match policy {
        DurationPolicy::Floor => Some(days),
        DurationPolicy::Ceil if elapsed > Duration::days(days) => Some(days + 1),
        DurationPolicy::Ceil => Some(days),
    }
}

pub fn report_duration_days(
    report: &Report,
    pair: MilestonePair,
    policy: DurationPolicy,
) -> Option<i64> {
    let (start, end) = pair.endpoints(report);
    compute_duration(start, end, policy)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportMetrics {
    pub submission_to_approval_days: Option<i64>,
    pub approval_to_resolution_days: Option<i64>,
    pub submission_to_resolution_days: Option<i64>,
}

pub fn compute_report_metrics(report: &Report, policy: DurationPolicy) -> ReportMetrics {
    ReportMetrics {
        submission_to_approval_days: report_duration_days(
            report,
            MilestonePair::SubmissionToApproval,
            policy,
        ),
        approval_to_resolution_days: report_duration_days(
            report,
            MilestonePair::ApprovalToResolution,
            policy,
        ),
        submission_to_resolution_days: report_duration_days(
            report,
            MilestonePair::SubmissionToResolution,
            policy,
        ),
    }
}
