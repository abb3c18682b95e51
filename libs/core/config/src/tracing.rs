use crate::Environment;
use tracing::debug;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset: sub-range decisions of the
/// checks are logged at debug level
const DEVELOPMENT_FILTER: &str = "info,domain_minfare=debug";
const PRODUCTION_FILTER: &str = "warn,domain_minfare=info";

/// Install color-eyre for CLI error reports.
///
/// Shows file:line where errors occur and hides environment variables.
/// Safe to call multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Initialize tracing with environment-aware format and span trace capture.
///
/// - **Production** (`APP_ENV=production`): flattened JSON events, one per
///   line, without module targets
/// - **Development** (default): pretty-printed events
///
/// Events go to stderr so that stdout stays free for command output.
///
/// Both include the `tracing-error` ErrorLayer so that color-eyre reports
/// carry the span trace of the failing check. `RUST_LOG` overrides the
/// default filter. Calling this again once a subscriber is set is a no-op.
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if is_production {
            PRODUCTION_FILTER
        } else {
            DEVELOPMENT_FILTER
        })
    });

    let result = if is_production {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    if result.is_err() {
        debug!("Tracing already initialized, skipping re-initialization");
    }
}
