//! Tracing subscriber bootstrap.

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

use crate::config::{LogFormat, TelemetryConfig};

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directives could not be parsed.
    #[error("invalid log filter '{directives}': {source}")]
    InvalidFilter {
        /// Directives that failed to parse.
        directives: String,
        /// Parser error.
        source: ParseError,
    },
    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for unparsable directives and
/// [`TelemetryError::AlreadyInstalled`] when called twice.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|error| TelemetryError::AlreadyInstalled(error.to_string()))
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter).map_err(|source| TelemetryError::InvalidFilter {
        directives: config.filter.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn rejects_malformed_directives() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = TelemetryConfig {
            filter: "conservatory=notalevel".to_owned(),
            ..TelemetryConfig::default()
        };

        let result = build_filter(&config);

        assert!(matches!(result, Err(TelemetryError::InvalidFilter { .. })));
    }

    #[rstest]
    fn accepts_default_directives() {
        assert!(build_filter(&TelemetryConfig::default()).is_ok());
    }
}
