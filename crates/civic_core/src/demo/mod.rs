use time::Duration;

use crate::auth::AdminCapability;
use crate::clock::ManualClock;
use crate::domain::{NewReport, ReportStatus};
use crate::error::AppError;
use crate::ids::IdGenerator;
use crate::kv::KeyValueStore;
use crate::repo::ReportStore;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct DemoSeedSummary {
    pub created: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub disputed: usize,
}

const DEMO_CATEGORIES: [&str; 6] = [
    "pothole",
    "streetlight",
    "garbage",
    "damaged-sign",
    "graffiti",
    "other",
];

/// Deterministic demo dataset: twelve reports, two per category, driven through the
/// lifecycle on a clock that advances a few hours per step.
///
/// The clock handle must be the one the store was built with.
pub fn seed_demo_dataset<K, I>(
    store: &mut ReportStore<K, ManualClock, I>,
    clock: &ManualClock,
    admin: &AdminCapability,
) -> Result<DemoSeedSummary, AppError>
where
    K: KeyValueStore,
    I: IdGenerator,
{
    let mut summary = DemoSeedSummary {
        created: 0,
        in_progress: 0,
        resolved: 0,
        disputed: 0,
    };

    for i in 0..12usize {
        let category = DEMO_CATEGORIES[i % DEMO_CATEGORIES.len()];
        let report = store.create_report(NewReport {
            title: format!("Demo {category} report {}", i + 1),
            description: format!("Sample {category} problem used for demos"),
            category: category.to_string(),
            location: format!("41.{:04}, 29.{:04}", 100 + i * 37, 200 + i * 53),
            image_url: None,
        })?;
        summary.created += 1;

        // Every third report stays in the queue.
        if i % 3 == 0 {
            continue;
        }
        clock.advance(Duration::hours(6 + i as i64));
        store.advance_status(admin, &report.id, ReportStatus::InProgress)?;
        if i % 3 == 1 {
            summary.in_progress += 1;
            continue;
        }

        clock.advance(Duration::days(i as i64 % 5));
        store.advance_status_with_response(
            admin,
            &report.id,
            ReportStatus::Resolved,
            Some("Crew dispatched and the issue was fixed."),
        )?;
        if i == 11 {
            store.dispute_resolution(&report.id, Some("Still there this morning."))?;
            summary.disputed += 1;
        } else {
            summary.resolved += 1;
        }
    }

    Ok(summary)
}
