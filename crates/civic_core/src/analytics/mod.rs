use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Report, ReportStatus};
use crate::metrics::{report_duration_days, DurationPolicy, MilestonePair};
use crate::validate::validate_report;

pub const DASHBOARD_PAYLOAD_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: ReportStatus,
    pub count: i64,
    pub report_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryBucket {
    pub category: String,
    pub count: i64,
    pub report_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DurationBucket {
    pub key: String,
    pub label: String,
    pub count: i64,
    pub report_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSummary {
    pub id: String,
    pub title: String,
    pub category: String,
    pub status: ReportStatus,
    pub user_reported_unresolved: bool,
    pub resolution_days: Option<i64>,
    pub comment_count: i64,
    pub warning_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardPayload {
    pub version: u32,
    pub report_count: i64,
    pub status_counts: Vec<StatusCount>,
    pub disputed_count: i64,
    pub category_counts: Vec<CategoryBucket>,
    pub resolution_buckets: Vec<DurationBucket>,
    pub reports: Vec<ReportSummary>,
}

const DURATION_BUCKETS: [(&str, &str); 5] = [
    ("same_day", "Same day"),
    ("1_3_days", "1-3 days"),
    ("4_7_days", "4-7 days"),
    ("over_7_days", "Over 7 days"),
    ("unknown", "Unknown"),
];

fn duration_bucket_key(days: Option<i64>) -> &'static str {
    match days {
        Some(0) => "same_day",
        Some(1..=3) => "1_3_days",
        Some(4..=7) => "4_7_days",
        Some(_) => "over_7_days",
        None => "unknown",
    }
}

/// Admin dashboard payload. Resolution time is approval -> resolution and only counted
/// for reports that are currently resolved.
pub fn build_dashboard(reports: &[Report], policy: DurationPolicy) -> DashboardPayload {
    let mut by_status: BTreeMap<ReportStatus, Vec<String>> =
        ReportStatus::ALL.iter().map(|s| (*s, Vec::new())).collect();
    let mut by_category: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut by_duration: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    let mut summaries = Vec::with_capacity(reports.len());
    let mut disputed_count = 0;

    for r in reports {
        by_status.entry(r.status).or_default().push(r.id.clone());
        by_category
            .entry(r.category.clone())
            .or_default()
            .push(r.id.clone());
        if r.user_reported_unresolved {
            disputed_count += 1;
        }

        let resolution_days = report_duration_days(r, MilestonePair::ApprovalToResolution, policy);
        if r.status == ReportStatus::Resolved {
            by_duration
                .entry(duration_bucket_key(resolution_days))
                .or_default()
                .push(r.id.clone());
        }

        summaries.push(ReportSummary {
            id: r.id.clone(),
            title: r.title.clone(),
            category: r.category.clone(),
            status: r.status,
            user_reported_unresolved: r.user_reported_unresolved,
            resolution_days,
            comment_count: r.comments.len() as i64,
            warning_count: validate_report(r).len() as i64,
        });
    }

    let status_counts = by_status
        .into_iter()
        .map(|(status, report_ids)| StatusCount {
            status,
            count: report_ids.len() as i64,
            report_ids,
        })
        .collect();

    // Largest categories first; ties by name.
    let mut category_counts: Vec<CategoryBucket> = by_category
        .into_iter()
        .map(|(category, report_ids)| CategoryBucket {
            category,
            count: report_ids.len() as i64,
            report_ids,
        })
        .collect();
    category_counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));

    let resolution_buckets = DURATION_BUCKETS
        .iter()
        .map(|(key, label)| {
            let report_ids = by_duration.remove(key).unwrap_or_default();
            DurationBucket {
                key: key.to_string(),
                label: label.to_string(),
                count: report_ids.len() as i64,
                report_ids,
            }
        })
        .collect();

    DashboardPayload {
        version: DASHBOARD_PAYLOAD_VERSION,
        report_count: reports.len() as i64,
        status_counts,
        disputed_count,
        category_counts,
        resolution_buckets,
        reports: summaries,
    }
}
