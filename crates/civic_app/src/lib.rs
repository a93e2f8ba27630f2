//! Host-facing command layer: one function per user action of the reporting app.
//!
//! Each command re-reads the workspace, so results always reflect the last committed
//! write. Admin commands take the host's admin flag and turn it into an
//! `AdminCapability` before touching the engine.

use std::path::PathBuf;

use civic_core::analytics::{build_dashboard, DashboardPayload};
use civic_core::auth::AdminCapability;
use civic_core::clock::ManualClock;
use civic_core::codec::{CommentRecord, ReportRecord};
use civic_core::demo::{seed_demo_dataset, DemoSeedSummary};
use civic_core::domain::{NewReport, Report, ReportFilter, ReportStatus, ValidationWarning};
use civic_core::error::AppError;
use civic_core::ids::UuidIds;
use civic_core::kv::SqliteKv;
use civic_core::metrics::{
    compute_report_metrics, report_duration_days, MilestonePair, ReportMetrics,
};
use civic_core::repo::ReportStore;
use civic_core::validate::validate_report;
use civic_core::workspace::{open_or_create_workspace_kv, open_workspace, WorkspaceMetadata};
use time::{Duration, OffsetDateTime};
use tracing::info;

pub mod config;
pub mod logging;

pub use config::AppConfig;

/// Card shown on the citizen dashboard.
#[derive(Debug, Clone, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub status: ReportStatus,
    pub image_url: Option<String>,
    pub created_at: String,
    pub user_reported_unresolved: bool,
}

#[derive(Debug, Clone, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetail {
    pub report: ReportRecord,
    pub metrics: ReportMetrics,
    /// Approval to resolution, the figure shown in the detail view.
    pub resolution_days: Option<i64>,
    pub warnings: Vec<ValidationWarning>,
}

pub struct App {
    config: AppConfig,
    store: ReportStore<SqliteKv>,
}

fn record(report: &Report) -> Result<ReportRecord, AppError> {
    ReportRecord::from_report(report)
}

fn records(reports: &[Report]) -> Result<Vec<ReportRecord>, AppError> {
    reports.iter().map(record).collect()
}

impl App {
    /// Installs logging and opens (or creates) the configured workspace.
    pub fn open(config: AppConfig) -> Result<Self, AppError> {
        logging::init_logging(config.log_level);
        let db_path = config.db_path();
        let kv = open_or_create_workspace_kv(&db_path)?;
        info!(path = %db_path.display(), "workspace opened");
        Ok(Self {
            config,
            store: ReportStore::new(kv),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.config.db_path()
    }

    pub fn workspace_info(&self) -> Result<WorkspaceMetadata, AppError> {
        open_workspace(&self.db_path())
    }

    pub fn submit_report(&mut self, form: NewReport) -> Result<ReportRecord, AppError> {
        record(&self.store.create_report(form)?)
    }

    pub fn my_reports(&self) -> Result<Vec<ReportCard>, AppError> {
        self.store
            .list_reports(ReportFilter::All)?
            .into_iter()
            .map(|r| -> Result<ReportCard, AppError> {
                let created_at = civic_core::codec::format_ts(r.created_at)?;
                Ok(ReportCard {
                    id: r.id,
                    title: r.title,
                    description: r.description,
                    category: r.category,
                    location: r.location,
                    status: r.status,
                    image_url: r.image_url,
                    created_at,
                    user_reported_unresolved: r.user_reported_unresolved,
                })
            })
            .collect()
    }

    /// Public feed with comments.
    pub fn all_reports(&self) -> Result<Vec<ReportRecord>, AppError> {
        records(&self.store.list_reports(ReportFilter::All)?)
    }

    pub fn report_detail(&self, report_id: &str) -> Result<ReportDetail, AppError> {
        let report = self.store.get_report(report_id)?;
        let policy = self.config.duration_policy;
        Ok(ReportDetail {
            metrics: compute_report_metrics(&report, policy),
            resolution_days: report_duration_days(
                &report,
                MilestonePair::ApprovalToResolution,
                policy,
            ),
            warnings: validate_report(&report),
            report: record(&report)?,
        })
    }

    pub fn add_comment(&mut self, report_id: &str, text: &str) -> Result<CommentRecord, AppError> {
        let comment = self.store.add_comment(report_id, text)?;
        Ok(CommentRecord {
            created_at: civic_core::codec::format_ts(comment.created_at)?,
            id: comment.id,
            text: comment.text,
        })
    }

    /// "Is the problem still there?" prompt on a resolved report.
    pub fn respond_to_resolution(
        &mut self,
        report_id: &str,
        still_exists: bool,
        explanation: Option<&str>,
    ) -> Result<ReportRecord, AppError> {
        if still_exists {
            self.store.dispute_resolution(report_id, explanation)?;
        } else {
            self.store.confirm_resolution(report_id)?;
        }
        record(&self.store.get_report(report_id)?)
    }

    /// Detail-view follow-up: saying the problem persists requires an explanation.
    pub fn submit_follow_up(
        &mut self,
        report_id: &str,
        still_exists: bool,
        text: &str,
    ) -> Result<ReportRecord, AppError> {
        if still_exists && text.trim().is_empty() {
            return Err(AppError::validation(
                "Please describe why the problem is not resolved",
            )
            .with_details(format!("id={report_id}")));
        }
        self.respond_to_resolution(report_id, still_exists, Some(text))
    }

    pub fn admin_reports(&self, is_admin: bool, filter: &str) -> Result<Vec<ReportRecord>, AppError> {
        AdminCapability::from_flag(is_admin)?;
        let filter = filter.parse::<ReportFilter>()?;
        records(&self.store.list_reports(filter)?)
    }

    pub fn admin_approve(
        &mut self,
        is_admin: bool,
        report_id: &str,
        response: Option<&str>,
    ) -> Result<ReportRecord, AppError> {
        self.admin_advance(is_admin, report_id, ReportStatus::InProgress, response)
    }

    pub fn admin_mark_solved(
        &mut self,
        is_admin: bool,
        report_id: &str,
        response: Option<&str>,
    ) -> Result<ReportRecord, AppError> {
        self.admin_advance(is_admin, report_id, ReportStatus::Resolved, response)
    }

    fn admin_advance(
        &mut self,
        is_admin: bool,
        report_id: &str,
        target: ReportStatus,
        response: Option<&str>,
    ) -> Result<ReportRecord, AppError> {
        let admin = AdminCapability::from_flag(is_admin)?;
        self.store
            .advance_status_with_response(&admin, report_id, target, response)?;
        record(&self.store.get_report(report_id)?)
    }

    pub fn dashboard(&self, is_admin: bool) -> Result<DashboardPayload, AppError> {
        AdminCapability::from_flag(is_admin)?;
        let reports = self.store.list_reports(ReportFilter::All)?;
        Ok(build_dashboard(&reports, self.config.duration_policy))
    }

    /// Seeds demo reports backdated by thirty days through a second handle on the workspace.
    pub fn seed_demo(&mut self, is_admin: bool) -> Result<DemoSeedSummary, AppError> {
        let admin = AdminCapability::from_flag(is_admin)?;
        let clock = ManualClock::new(OffsetDateTime::now_utc() - Duration::days(30));
        let kv = open_or_create_workspace_kv(&self.db_path())?;
        let mut demo_store = ReportStore::with_collaborators(kv, clock.clone(), UuidIds);
        let summary = seed_demo_dataset(&mut demo_store, &clock, &admin)?;
        info!(created = summary.created, "demo dataset seeded");
        Ok(summary)
    }
}
