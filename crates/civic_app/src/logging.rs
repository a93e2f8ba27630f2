use tracing::Level;

/// Installs the fmt subscriber. Returns `false` when a global subscriber already exists.
pub fn init_logging(level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok()
}
