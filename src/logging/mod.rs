//! Logging infrastructure for Warden
//!
//! Diagnostics go through `tracing`. Issuance requests are additionally
//! recorded in an optional JSONL audit file (see [`audit`]).

pub mod audit;

pub use audit::{AuditEvent, AuditLogger, EventType};

use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `warden=<level>,info`.
pub fn init(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("warden={},info", log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Log a categorised failure with its machine-readable code.
pub fn message(category: &str, code: &str, message: &str) {
    warn!(category, code, "{}", message);
}
