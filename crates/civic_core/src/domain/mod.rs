use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AppError;

/// Lifecycle stage of a report.
///
/// Forward order is `Submitted -> InProgress -> Resolved`; the only way back is a
/// citizen dispute, which returns a resolved report to `Submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportStatus {
    #[serde(rename = "submitted")]
    Submitted,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "resolved")]
    Resolved,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 3] = [
        ReportStatus::Submitted,
        ReportStatus::InProgress,
        ReportStatus::Resolved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Submitted => "submitted",
            ReportStatus::InProgress => "in-progress",
            ReportStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "submitted" => Ok(ReportStatus::Submitted),
            "in-progress" => Ok(ReportStatus::InProgress),
            "resolved" => Ok(ReportStatus::Resolved),
            other => Err(AppError::validation("Unknown report status")
                .with_details(format!("value={other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub created_at: OffsetDateTime,
}

/// A citizen-submitted problem report.
///
/// Notes:
/// - `title`, `description`, `category`, `location` and `image_url` never change after creation.
/// - Milestone timestamps are stamped once and never cleared; legacy records may lack
///   `submitted_at`.
/// - `user_reported_unresolved` is only set by a dispute and cleared by the next admin action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub image_url: Option<String>,
    pub status: ReportStatus,

    pub created_at: OffsetDateTime,
    pub submitted_at: Option<OffsetDateTime>,
    pub approved_at: Option<OffsetDateTime>,
    pub resolved_at: Option<OffsetDateTime>,

    pub user_reported_unresolved: bool,
    pub admin_response: Option<String>,
    pub user_explanation: Option<String>,
    pub comments: Vec<Comment>,
}

/// Citizen submission form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFilter {
    #[default]
    All,
    Status(ReportStatus),
    /// Reports whose resolution the citizen disputed and no admin has re-actioned.
    UnresolvedOnly,
}

impl ReportFilter {
    pub fn matches(&self, report: &Report) -> bool {
        match self {
            ReportFilter::All => true,
            ReportFilter::Status(s) => report.status == *s,
            ReportFilter::UnresolvedOnly => report.user_reported_unresolved,
        }
    }
}

impl FromStr for ReportFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(ReportFilter::All),
            "unresolvedOnly" => Ok(ReportFilter::UnresolvedOnly),
            other => other
                .parse::<ReportStatus>()
                .map(ReportFilter::Status)
                .map_err(|_| {
                    AppError::validation("Unknown report filter")
                        .with_details(format!("value={other}"))
                }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_parses_status_names_and_unresolved() {
        assert_eq!("all".parse::<ReportFilter>().unwrap(), ReportFilter::All);
        assert_eq!(
            "in-progress".parse::<ReportFilter>().unwrap(),
            ReportFilter::Status(ReportStatus::InProgress)
        );
        assert_eq!(
            "unresolvedOnly".parse::<ReportFilter>().unwrap(),
            ReportFilter::UnresolvedOnly
        );
        let err = "closed".parse::<ReportFilter>().unwrap_err();
        assert_eq!(err.code, crate::error::VALIDATION_ERROR);
    }

    #[test]
    fn status_round_trips_through_display() {
        for s in ReportStatus::ALL {
            assert_eq!(s.to_string().parse::<ReportStatus>().unwrap(), s);
        }
    }
}
