// Copyright (c) 2018-2022 The Botho Foundation

//! Subscriber initialization for binaries and tests.

use std::{
    env,
    io::{self, IsTerminal},
    string::String,
    sync::Once,
};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static INIT: Once = Once::new();

/// Where and how log events are written.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LogSettings {
    /// Filter directives, e.g. `info` or `rsm_topology=debug`.
    pub filter: Option<String>,
    /// Emit one JSON object per event instead of human readable lines.
    pub json: bool,
    /// Write to stderr instead of stdout.
    pub stderr: bool,
}

impl LogSettings {
    /// Read the settings from the environment.
    ///
    /// - `RUST_LOG` or `RSM_LOG`: filter directives (default `info`)
    /// - `RSM_LOG_JSON=1`: JSON output
    /// - `RSM_LOG_STDERR=1`: write to stderr
    pub fn from_env() -> Self {
        let filter = env::var("RUST_LOG").or_else(|_| env::var("RSM_LOG")).ok();
        Self {
            filter,
            json: env::var("RSM_LOG_JSON").unwrap_or_default() == "1",
            stderr: env::var("RSM_LOG_STDERR").unwrap_or_default() == "1",
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let directives = self.filter.as_deref().unwrap_or("info");
        EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber.
///
/// Only the first call in a process has an effect. A subscriber installed by
/// someone else is left in place.
pub fn init_logging(settings: &LogSettings) {
    INIT.call_once(|| {
        let filter = settings.env_filter();

        let result = if settings.json {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE);

            if settings.stderr {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.with_writer(io::stderr))
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.with_writer(io::stdout))
                    .try_init()
            }
        } else {
            let layer = fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(io::stderr().is_terminal());

            if settings.stderr {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.with_writer(io::stderr))
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.with_writer(io::stdout))
                    .try_init()
            }
        };

        // Another subscriber may already be set, which is fine.
        let _ = result;
    });
}

/// Install the global subscriber configured from the environment.
pub fn init_root_logging() {
    init_logging(&LogSettings::from_env());
}

/// Install a subscriber suitable for tests: always stderr, so that cargo's
/// output capture picks it up.
pub fn init_test_logging(test_name: &str) {
    let mut settings = LogSettings::from_env();
    settings.stderr = true;
    init_logging(&settings);
    tracing::debug!(test = test_name, "test logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_init_is_idempotent() {
        init_test_logging("first");
        init_test_logging("second");
        init_root_logging();
    }

    #[test]
    fn test_bad_filter_falls_back_to_info() {
        let settings = LogSettings {
            filter: Some("rsm=notalevel".into()),
            ..Default::default()
        };
        assert_eq!(settings.env_filter().to_string(), "info");
    }
}
