/*!
# personaforge-observability

Tracing setup shared by every binary/test harness in the workspace. No
component reads this crate's state as a global — `init()` is called once at
process start, and everything downstream uses `tracing`'s thread-local
dispatcher.
*/

use serde::{Deserialize, Serialize};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub tracing_level: String,
    pub json_output: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            tracing_level: "INFO".to_string(),
            json_output: false,
        }
    }
}

/// Initialize the global tracing subscriber. Safe to call more than once
/// per process from tests (errors from a second `try_init` are ignored).
pub fn init(config: &ObservabilityConfig) {
    let level = match config.tracing_level.to_ascii_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "WARN" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_output {
        registry.with(tracing_subscriber::fmt::layer().json().with_target(false)).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(false)).try_init()
    };

    if result.is_ok() {
        info!(level = %config.tracing_level, "tracing initialized");
    }
}

pub fn init_default() {
    init(&ObservabilityConfig::default());
}
