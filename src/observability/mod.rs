//! Observability: logging setup and crash reports.
//!
//! [`init_tracing`] installs a `tracing` subscriber writing to stderr.
//! Records emitted through the `log` facade are forwarded to it, so both
//! macro families end up in the same stream.
//!
//! ```ignore
//! use vulntriage::observability::{init_tracing, install_panic_hook};
//!
//! fn main() {
//!     install_panic_hook();
//!     init_tracing(cli.verbosity);
//! }
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{get_current_context, set_phase, set_store, ContextGuard, Phase, TriageContext};
pub use panic_hook::install_panic_hook;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a filter directive that overrides `-v`
pub const LOG_ENV_VAR: &str = "VULNTRIAGE_LOG";

/// Filter directive for a `-v` count.
pub fn verbosity_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "vulntriage=info,warn",
        2 => "vulntriage=debug,info",
        _ => "trace",
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(verbosity)));

    // Fails only when a subscriber is already set
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
