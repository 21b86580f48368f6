//! Diagnostic logging setup.
//!
//! Logs go to stderr so they never mix with the relayed session output on
//! stdout. `KUBECTL_DEBUG_LOG` takes an `EnvFilter` directive and wins over
//! the verbosity flag.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_ENV: &str = "KUBECTL_DEBUG_LOG";

/// Filter used when `KUBECTL_DEBUG_LOG` is unset or unparsable.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "kubectl_debug=debug,kube=info,warn"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
