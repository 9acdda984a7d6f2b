use std::{env, io};

use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const SVC_LABEL_ENVVAR: &str = "T8N_SVC_LABEL";

/// Filter used when `RUST_LOG` isn't set.
const DEFAULT_FILTER: &str = "warn";

pub struct LoggerConfig {
    whoami: String,
    default_filter: String,
}

impl LoggerConfig {
    /// Creates a new empty instance with whoami set.
    pub fn new(whoami: String) -> Self {
        Self {
            whoami,
            default_filter: DEFAULT_FILTER.to_owned(),
        }
    }

    pub fn with_base_name(s: &str) -> Self {
        Self::new(get_whoami_string(s))
    }

    /// Sets the directives used when `RUST_LOG` is absent.
    pub fn set_default_filter(&mut self, filter: impl Into<String>) {
        self.default_filter = filter.into();
    }

    pub fn whoami(&self) -> &str {
        &self.whoami
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::with_base_name("(t8n)")
    }
}

/// Builds the env filter, preferring `RUST_LOG` over the configured default.
fn make_filter(config: &LoggerConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_filter))
}

/// Initializes the logging subsystem with the provided config.
///
/// Logs go to stderr, stdout is left to the tool's own output.
pub fn init(config: LoggerConfig) {
    let filt = make_filter(&config);

    let stderr_sub = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_filter(filt);

    tracing_subscriber::registry().with(stderr_sub).init();

    debug!(whoami = %config.whoami, "logging started");
}

/// Shuts down the logging subsystem.
pub fn finalize() {
    debug!("shutting down logging");
}

/// Gets the service label from the standard envvar, which should be included
/// in the whoami string.
pub fn get_service_label_from_env() -> Option<String> {
    env::var(SVC_LABEL_ENVVAR).ok()
}

/// Computes a standard whoami string.
pub fn get_whoami_string(base: &str) -> String {
    match get_service_label_from_env() {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}
