use std::env;
use std::path::PathBuf;

use civic_core::error::AppError;
use civic_core::metrics::DurationPolicy;
use tracing::Level;

const DEFAULT_DB_FILE: &str = "civic_reports.sqlite";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding the workspace database. Defaults to the working directory.
    pub data_dir: PathBuf,
    pub db_file: String,
    /// Rounding used for every day-count shown to users.
    pub duration_policy: DurationPolicy,
    pub log_level: Level,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            db_file: DEFAULT_DB_FILE.to_string(),
            duration_policy: DurationPolicy::Floor,
            log_level: Level::INFO,
        }
    }
}

fn invalid(var: &str, value: &str, expected: &str) -> AppError {
    AppError::new("CONFIG_INVALID", format!("{var} must be one of: {expected}"))
        .with_details(format!("value={value}"))
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get("CIVIC_DATA_DIR") {
            config.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(file) = get("CIVIC_DB_FILE") {
            config.db_file = file.trim().to_string();
        }
        if let Some(policy) = get("CIVIC_DURATION_POLICY") {
            config.duration_policy = match policy.trim().to_ascii_lowercase().as_str() {
                "floor" => DurationPolicy::Floor,
                "ceil" => DurationPolicy::Ceil,
                _ => return Err(invalid("CIVIC_DURATION_POLICY", &policy, "floor, ceil")),
            };
        }
        if let Some(level) = get("CIVIC_LOG_LEVEL") {
            config.log_level = level.trim().parse::<Level>().map_err(|_| {
                invalid(
                    "CIVIC_LOG_LEVEL",
                    &level,
                    "trace, debug, info, warn, error",
                )
            })?;
        }

        Ok(config)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }
}
