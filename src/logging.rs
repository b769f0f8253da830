use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FLAKEWATCH_LOG";

static INIT_LOGGER: Once = Once::new();

/// Installs the stderr subscriber. Directives come from `FLAKEWATCH_LOG`
/// (for example `flakewatch=debug`), defaulting to `warn`.
pub fn init(no_color: bool) {
    INIT_LOGGER.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(!no_color)
            .with_target(false)
            .try_init();
    });
}
