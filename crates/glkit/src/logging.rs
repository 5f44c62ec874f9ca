//! Log output for applications built on glkit.
//!
//! The library crates only emit `tracing` events. Call [`init`] once at
//! startup to print them; the filter is read from `RUST_LOG` and defaults to
//! `info`.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceCell<bool> = OnceCell::new();

/// Install a formatting subscriber. Later calls are no-ops.
///
/// Returns `false` when another global subscriber was already set by the
/// application.
pub fn init() -> bool {
    *INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    })
}
