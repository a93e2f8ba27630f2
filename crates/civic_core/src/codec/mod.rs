//! Read/write boundary between typed reports and their persisted JSON form.
//!
//! In memory, timestamps are always `OffsetDateTime`; only this module sees the RFC3339
//! strings. Decoding never fails as a whole: bad input degrades to fewer records plus
//! warnings, and the unreadable parts ride along in a `Residue` that the next encode
//! writes back verbatim.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::domain::{Comment, Report, ReportStatus, ValidationWarning};
use crate::error::AppError;

/// Key under which the serialized collection lives.
pub const REPORTS_KEY: &str = "reports";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: String,
    pub text: String,
    pub created_at: String,
}

/// Persisted (and host-facing) shape of a report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub status: ReportStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    #[serde(default)]
    pub user_reported_unresolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_explanation: Option<String>,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
}

/// Stored content that could not be turned into typed values, kept verbatim so the next
/// write puts it back. Positions refer to the array the content was read from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Residue {
    pub skipped_records: Vec<(usize, Value)>,
    pub by_report: HashMap<String, ReportResidue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportResidue {
    /// Milestone field name (wire form) and its unparseable raw value.
    pub milestones: Vec<(String, String)>,
    pub skipped_comments: Vec<(usize, Value)>,
}

impl ReportResidue {
    fn is_empty(&self) -> bool {
        self.milestones.is_empty() && self.skipped_comments.is_empty()
    }

    /// Raw milestones win over anything stamped since load: a value that was set stays set.
    fn restore_into(&self, record: &mut Value) {
        let Some(obj) = record.as_object_mut() else { return };
        for (field, raw) in &self.milestones {
            obj.insert(field.clone(), Value::String(raw.clone()));
        }
        if self.skipped_comments.is_empty() {
            return;
        }
        if let Some(comments) = obj.get_mut("comments").and_then(Value::as_array_mut) {
            let kept = std::mem::take(comments);
            *comments = interleave(kept, &self.skipped_comments);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedCollection {
    pub reports: Vec<Report>,
    pub warnings: Vec<ValidationWarning>,
    pub residue: Residue,
}

/// Puts `skipped` back at their original indices; entries of `kept` fill the gaps in order
/// and anything appended since load goes last.
fn interleave(kept: Vec<Value>, skipped: &[(usize, Value)]) -> Vec<Value> {
    let mut out = Vec::with_capacity(kept.len() + skipped.len());
    let mut kept = kept.into_iter();
    let mut skipped = skipped.iter().peekable();
    loop {
        if let Some((_, v)) = skipped.next_if(|(idx, _)| *idx <= out.len()) {
            out.push(v.clone());
            continue;
        }
        match kept.next() {
            Some(v) => out.push(v),
            None => break,
        }
    }
    out.extend(skipped.map(|(_, v)| v.clone()));
    out
}

pub fn format_ts(ts: OffsetDateTime) -> Result<String, AppError> {
    ts.to_offset(UtcOffset::UTC).format(&Rfc3339).map_err(|e| {
        AppError::new("CODEC_TS_FORMAT_FAILED", "Failed to format timestamp")
            .with_details(format!("value={ts}; err={e}"))
    })
}

fn format_opt(ts: Option<OffsetDateTime>) -> Result<Option<String>, AppError> {
    ts.map(format_ts).transpose()
}

pub fn parse_ts(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
}

fn parse_optional_milestone(
    report_id: &str,
    field: &str,
    raw: Option<&str>,
    warnings: &mut Vec<ValidationWarning>,
    residue: &mut ReportResidue,
) -> Option<OffsetDateTime> {
    let raw = raw?;
    match parse_ts(raw) {
        Some(dt) => Some(dt),
        None => {
            warnings.push(
                ValidationWarning::new(
                    "CODEC_TS_UNPARSEABLE",
                    format!("Unparseable {field}; treated as absent"),
                )
                .with_details(format!("id={report_id}; value={raw}")),
            );
            residue.milestones.push((field.to_string(), raw.to_string()));
            None
        }
    }
}

impl ReportRecord {
    pub fn from_report(report: &Report) -> Result<Self, AppError> {
        let comments = report
            .comments
            .iter()
            .map(|c| -> Result<CommentRecord, AppError> {
                Ok(CommentRecord {
                    id: c.id.clone(),
                    text: c.text.clone(),
                    created_at: format_ts(c.created_at)?,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(Self {
            id: report.id.clone(),
            title: report.title.clone(),
            description: report.description.clone(),
            category: report.category.clone(),
            location: report.location.clone(),
            image_url: report.image_url.clone(),
            status: report.status,
            created_at: format_ts(report.created_at)?,
            submitted_at: format_opt(report.submitted_at)?,
            approved_at: format_opt(report.approved_at)?,
            resolved_at: format_opt(report.resolved_at)?,
            user_reported_unresolved: report.user_reported_unresolved,
            admin_response: report.admin_response.clone(),
            user_explanation: report.user_explanation.clone(),
            comments,
        })
    }

    /// Converts to the typed model. `None` when `createdAt` is unusable; optional
    /// milestones and comments with bad timestamps degrade with warnings and are noted in
    /// `residue` (comments by index only; the caller attaches the raw value).
    pub fn into_report(
        self,
        warnings: &mut Vec<ValidationWarning>,
        residue: &mut ReportResidue,
        skipped_comment_indices: &mut Vec<usize>,
    ) -> Option<Report> {
        let Some(created_at) = parse_ts(&self.created_at) else {
            warnings.push(
                ValidationWarning::new(
                    "CODEC_RECORD_SKIPPED",
                    "Report skipped: createdAt is not a valid timestamp",
                )
                .with_details(format!("id={}; value={}", self.id, self.created_at)),
            );
            return None;
        };

        let id = self.id;
        let submitted_at = parse_optional_milestone(
            &id,
            "submittedAt",
            self.submitted_at.as_deref(),
            warnings,
            residue,
        );
        let approved_at = parse_optional_milestone(
            &id,
            "approvedAt",
            self.approved_at.as_deref(),
            warnings,
            residue,
        );
        let resolved_at = parse_optional_milestone(
            &id,
            "resolvedAt",
            self.resolved_at.as_deref(),
            warnings,
            residue,
        );

        let mut comments = Vec::with_capacity(self.comments.len());
        for (idx, c) in self.comments.into_iter().enumerate() {
            match parse_ts(&c.created_at) {
                Some(created_at) => comments.push(Comment {
                    id: c.id,
                    text: c.text,
                    created_at,
                }),
                None => {
                    warnings.push(
                        ValidationWarning::new(
                            "CODEC_COMMENT_SKIPPED",
                            "Comment skipped: createdAt is not a valid timestamp",
                        )
                        .with_details(format!("report={id}; comment={}", c.id)),
                    );
                    skipped_comment_indices.push(idx);
                }
            }
        }

        Some(Report {
            id,
            title: self.title,
            description: self.description,
            category: self.category,
            location: self.location,
            image_url: self.image_url,
            status: self.status,
            created_at,
            submitted_at,
            approved_at,
            resolved_at,
            user_reported_unresolved: self.user_reported_unresolved,
            admin_response: self.admin_response,
            user_explanation: self.user_explanation,
            comments,
        })
    }
}

fn encode_failed(e: serde_json::Error) -> AppError {
    AppError::new("CODEC_ENCODE_FAILED", "Failed to serialize reports").with_details(e.to_string())
}

/// Serializes `reports` and re-inserts everything `residue` kept from the last read.
pub fn encode_collection(reports: &[Report], residue: &Residue) -> Result<String, AppError> {
    let mut encoded = Vec::with_capacity(reports.len());
    for report in reports {
        let mut value =
            serde_json::to_value(ReportRecord::from_report(report)?).map_err(encode_failed)?;
        if let Some(extra) = residue.by_report.get(&report.id) {
            extra.restore_into(&mut value);
        }
        encoded.push(value);
    }
    let merged = interleave(encoded, &residue.skipped_records);
    serde_json::to_string(&merged).map_err(encode_failed)
}

/// Decode a persisted collection. Absent input is an empty collection, silently.
///
/// Only a payload that is not a JSON array is discarded; anything unreadable inside the
/// array is kept in `residue` so writes do not lose it.
pub fn decode_collection(raw: Option<&str>) -> DecodedCollection {
    let mut out = DecodedCollection::default();
    let Some(raw) = raw else { return out };
    if raw.trim().is_empty() {
        return out;
    }

    let values: Vec<Value> = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            out.warnings.push(
                ValidationWarning::new(
                    "CODEC_COLLECTION_MALFORMED",
                    "Stored reports are not a JSON array; starting from an empty collection",
                )
                .with_details(e.to_string()),
            );
            return out;
        }
    };

    for (idx, value) in values.into_iter().enumerate() {
        let record = match serde_json::from_value::<ReportRecord>(value.clone()) {
            Ok(record) => record,
            Err(e) => {
                out.warnings.push(
                    ValidationWarning::new(
                        "CODEC_RECORD_SKIPPED",
                        "Report skipped: malformed record",
                    )
                    .with_details(format!("index={idx}; err={e}")),
                );
                out.residue.skipped_records.push((idx, value));
                continue;
            }
        };

        let mut report_residue = ReportResidue::default();
        let mut skipped_comments = Vec::new();
        let Some(report) =
            record.into_report(&mut out.warnings, &mut report_residue, &mut skipped_comments)
        else {
            out.residue.skipped_records.push((idx, value));
            continue;
        };

        if let Some(raw_comments) = value.get("comments").and_then(Value::as_array) {
            report_residue.skipped_comments = skipped_comments
                .into_iter()
                .filter_map(|i| raw_comments.get(i).map(|c| (i, c.clone())))
                .collect();
        }
        if !report_residue.is_empty() {
            out.residue
                .by_report
                .insert(report.id.clone(), report_residue);
        }
        out.reports.push(report);
    }

    out
}
