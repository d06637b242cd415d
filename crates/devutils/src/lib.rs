use std::sync::Once;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Install the global logging subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`.
/// Only the first call installs a subscriber, later calls do nothing.
pub fn init_logging(default_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .finish();

        // Someone else already installed one, keep theirs
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
