//! Report store and lifecycle engine.
//!
//! Every operation reads the collection fresh from the key-value store, so a read always
//! reflects the last committed write from this process. Mutations work on a copy and
//! write the whole collection back only after every check passed: either the call commits
//! fully or the stored state is untouched.
//!
//! There is no cross-process coordination. Two writers sharing a backing store race and
//! the last write wins; no merge or conflict detection is attempted.

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::auth::AdminCapability;
use crate::clock::{Clock, SystemClock};
use crate::codec::{decode_collection, encode_collection, DecodedCollection, REPORTS_KEY};
use crate::domain::{Comment, NewReport, Report, ReportFilter, ReportStatus, ValidationWarning};
use crate::error::AppError;
use crate::ids::{IdGenerator, UuidIds};
use crate::kv::KeyValueStore;
use crate::lifecycle;

pub struct ReportStore<K, C = SystemClock, I = UuidIds> {
    kv: K,
    clock: C,
    ids: I,
}

impl<K: KeyValueStore> ReportStore<K> {
    pub fn new(kv: K) -> Self {
        Self::with_collaborators(kv, SystemClock, UuidIds)
    }
}

impl<K, C, I> ReportStore<K, C, I>
where
    K: KeyValueStore,
    C: Clock,
    I: IdGenerator,
{
    pub fn with_collaborators(kv: K, clock: C, ids: I) -> Self {
        Self { kv, clock, ids }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn into_kv(self) -> K {
        self.kv
    }

    fn read_raw(&self) -> Result<Option<String>, AppError> {
        self.kv.get(REPORTS_KEY)
    }

    fn load(&self) -> Result<DecodedCollection, AppError> {
        let raw = self.read_raw()?;
        let decoded = decode_collection(raw.as_deref());
        for w in &decoded.warnings {
            warn!(code = %w.code, details = ?w.details, "{}", w.message);
        }
        Ok(decoded)
    }

    /// Writes `collection` back, including whatever could not be decoded on load.
    fn commit(&mut self, collection: &DecodedCollection) -> Result<(), AppError> {
        let encoded = encode_collection(&collection.reports, &collection.residue)?;
        self.kv.set(REPORTS_KEY, &encoded)
    }

    /// Warnings produced while decoding the currently stored collection.
    pub fn load_warnings(&self) -> Result<Vec<ValidationWarning>, AppError> {
        let raw = self.read_raw()?;
        Ok(decode_collection(raw.as_deref()).warnings)
    }

    fn update_report<T>(
        &mut self,
        report_id: &str,
        apply: impl FnOnce(&mut Report, OffsetDateTime, &I) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut collection = self.load()?;
        let now = self.clock.now();
        let report = collection
            .reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or_else(|| AppError::not_found(report_id))?;
        let out = apply(report, now, &self.ids)?;
        self.commit(&collection)?;
        Ok(out)
    }

    pub fn create_report(&mut self, fields: NewReport) -> Result<Report, AppError> {
        let missing: Vec<&str> = [
            ("title", &fields.title),
            ("description", &fields.description),
            ("category", &fields.category),
            ("location", &fields.location),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(AppError::validation("Required report fields are empty")
                .with_details(format!("missing={}", missing.join(","))));
        }

        let mut collection = self.load()?;
        let now = self.clock.now();
        let report = Report {
            id: self.ids.next_id(),
            title: fields.title.trim().to_string(),
            description: fields.description.trim().to_string(),
            category: fields.category.trim().to_string(),
            location: fields.location.trim().to_string(),
            image_url: fields
                .image_url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            status: ReportStatus::Submitted,
            created_at: now,
            submitted_at: Some(now),
            approved_at: None,
            resolved_at: None,
            user_reported_unresolved: false,
            admin_response: None,
            user_explanation: None,
            comments: Vec::new(),
        };
        collection.reports.push(report.clone());
        self.commit(&collection)?;

        info!(id = %report.id, category = %report.category, "report created");
        Ok(report)
    }

    pub fn get_report(&self, report_id: &str) -> Result<Report, AppError> {
        self.load()?
            .reports
            .into_iter()
            .find(|r| r.id == report_id)
            .ok_or_else(|| AppError::not_found(report_id))
    }

    /// Snapshot of matching reports in insertion order (oldest first).
    pub fn list_reports(&self, filter: ReportFilter) -> Result<Vec<Report>, AppError> {
        let reports: Vec<Report> = self
            .load()?
            .reports
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        debug!(?filter, count = reports.len(), "listed reports");
        Ok(reports)
    }

    pub fn advance_status(
        &mut self,
        admin: &AdminCapability,
        report_id: &str,
        target: ReportStatus,
    ) -> Result<(), AppError> {
        self.advance_status_with_response(admin, report_id, target, None)
    }

    /// Admin forward move, optionally recording a response for the citizen.
    pub fn advance_status_with_response(
        &mut self,
        _admin: &AdminCapability,
        report_id: &str,
        target: ReportStatus,
        admin_response: Option<&str>,
    ) -> Result<(), AppError> {
        self.update_report(report_id, |report, now, _| {
            lifecycle::advance(report, target, admin_response, now)
        })?;
        info!(id = report_id, status = %target, "report status advanced");
        Ok(())
    }

    pub fn dispute_resolution(
        &mut self,
        report_id: &str,
        explanation: Option<&str>,
    ) -> Result<(), AppError> {
        self.update_report(report_id, |report, _, _| {
            lifecycle::dispute(report, explanation)
        })?;
        info!(id = report_id, "resolution disputed; report back in queue");
        Ok(())
    }

    /// Citizen acknowledges the fix. Nothing is written.
    pub fn confirm_resolution(&self, report_id: &str) -> Result<(), AppError> {
        let report = self.get_report(report_id)?;
        lifecycle::ensure_resolved(&report, "confirm resolution of")?;
        info!(id = report_id, "resolution confirmed");
        Ok(())
    }

    pub fn add_comment(&mut self, report_id: &str, text: &str) -> Result<Comment, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("Comment text is empty")
                .with_details(format!("id={report_id}")));
        }

        let comment = self.update_report(report_id, |report, now, ids| {
            let comment = Comment {
                id: ids.next_id(),
                text: text.to_string(),
                created_at: now,
            };
            report.comments.push(comment.clone());
            Ok(comment)
        })?;
        debug!(id = report_id, comment = %comment.id, "comment added");
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    fn form() -> NewReport {
        NewReport {
            title: "Overflowing bin".to_string(),
            description: "Not emptied for a week".to_string(),
            category: "garbage".to_string(),
            location: "Market square".to_string(),
            image_url: Some("   ".to_string()),
        }
    }

    #[test]
    fn create_trims_and_drops_blank_image() {
        let mut store = ReportStore::new(MemoryKv::new());
        let r = store.create_report(form()).unwrap();
        assert_eq!(r.image_url, None);
        assert_eq!(r.created_at, r.submitted_at.unwrap());
        assert_eq!(store.get_report(&r.id).unwrap(), r);
    }

    #[test]
    fn create_names_every_missing_field() {
        let mut store = ReportStore::new(MemoryKv::new());
        let err = store
            .create_report(NewReport {
                title: " ".to_string(),
                location: String::new(),
                ..form()
            })
            .unwrap_err();
        assert_eq!(err.code, crate::error::VALIDATION_ERROR);
        assert_eq!(err.details.as_deref(), Some("missing=title,location"));
        assert_eq!(store.kv().get(REPORTS_KEY).unwrap(), None);
    }
}
