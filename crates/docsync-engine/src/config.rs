//! Engine configuration.

/// Tunable bounds for engine operations.
///
/// A long cascade must fail fast rather than iterate unbounded, so the
/// target count is capped; history reads default to a finite page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum documents one cascade may touch
    pub max_cascade_targets: usize,
    /// Default `history` page size when the caller passes no limit
    pub history_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cascade_targets: 50,
            history_limit: 50,
        }
    }
}

impl EngineConfig {
    /// Build from environment, falling back to defaults.
    ///
    /// Recognizes `DOCSYNC_MAX_CASCADE_TARGETS` and `DOCSYNC_HISTORY_LIMIT`;
    /// unparseable values fall back silently.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_cascade_targets: env_parse("DOCSYNC_MAX_CASCADE_TARGETS")
                .unwrap_or(defaults.max_cascade_targets),
            history_limit: env_parse("DOCSYNC_HISTORY_LIMIT").unwrap_or(defaults.history_limit),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
