//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::{DEFAULT_LOG_FILTER, LOG_ENV_VAR};

static INIT: Once = Once::new();

/// Initialize the apimine tracing/logging system.
///
/// Reads the `APIMINE_LOG` environment variable for per-subsystem log levels.
/// Format: `APIMINE_LOG=apimine_analysis::pipeline=debug,apimine_analysis::search=warn`
///
/// Falls back to `apimine=info` if `APIMINE_LOG` is not set or is invalid.
/// Calling it more than once is harmless.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
