//! Runtime configuration for the command core.
//!
//! Every struct implements [`Default`] and deserialises with
//! `#[serde(default)]`, so hosts may load partial documents from any serde
//! format and rely on the defaults for the rest.

use serde::Deserialize;

use crate::command::validation::FileOptions;
use crate::repository::domain::MAX_PAGE_LIMIT;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Listing defaults and limits.
    pub pagination: PaginationConfig,
    /// Default upload constraints.
    pub uploads: FileOptions,
    /// Log output settings.
    pub telemetry: TelemetryConfig,
}

/// Pagination defaults and limits applied to listing queries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the query omits `limit`.
    pub default_limit: u32,
    /// Largest accepted `limit`, capped at [`MAX_PAGE_LIMIT`].
    pub max_limit: u32,
    /// Sort field used when the query omits `sort`.
    pub default_sort: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            default_sort: "createdAt".to_owned(),
        }
    }
}

impl PaginationConfig {
    /// Configuration with smaller pages, for constrained clients.
    #[must_use]
    pub fn compact() -> Self {
        Self {
            default_limit: 5,
            max_limit: 25,
            ..Self::default()
        }
    }

    /// Largest `limit` a listing may request.
    ///
    /// Clamped between 1 and [`MAX_PAGE_LIMIT`] so validated queries never exceed
    /// what the repository accepts.
    #[must_use]
    pub fn effective_max_limit(&self) -> u32 {
        let ceiling = u32::try_from(MAX_PAGE_LIMIT).unwrap_or(u32::MAX);
        self.max_limit.clamp(1, ceiling)
    }

    /// Page size used when the query omits `limit`, never above
    /// [`Self::effective_max_limit`].
    #[must_use]
    pub fn effective_default_limit(&self) -> u32 {
        self.default_limit.clamp(1, self.effective_max_limit())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Output format.
    pub format: LogFormat,
    /// Filter directives used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            filter: "info".to_owned(),
        }
    }
}
