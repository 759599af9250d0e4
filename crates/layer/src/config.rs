//! Layer configuration.

use eventlock_checker::CheckerConfig;

/// Environment variable that enables the event deadlock checker.
pub const ENABLE_EVENTS_DEADLOCK_VAR: &str = "ZEL_ENABLE_EVENTSDEADLOCK_CHECKER";

/// Environment variable overriding the reported path length.
pub const MAX_PATH_LEN_VAR: &str = "ZEL_EVENTSDEADLOCK_MAX_PATH_LEN";

/// Which checkers the layer runs, and how they are configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerConfig {
    /// Whether the event deadlock checker is active.
    ///
    /// When disabled the checker is never constructed.
    pub events_deadlock: bool,

    /// Configuration handed to the deadlock checker.
    pub checker: CheckerConfig,
}

impl LayerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let events_deadlock = lookup(ENABLE_EVENTS_DEADLOCK_VAR)
            .map(|value| is_truthy(&value))
            .unwrap_or(false);

        let mut checker = CheckerConfig::default();
        if let Some(max_path_len) = lookup(MAX_PATH_LEN_VAR).and_then(|v| v.trim().parse().ok()) {
            checker.max_path_len = max_path_len;
        }

        Self {
            events_deadlock,
            checker,
        }
    }

    /// Enable or disable the event deadlock checker.
    pub fn with_events_deadlock(mut self, enabled: bool) -> Self {
        self.events_deadlock = enabled;
        self
    }

    /// Set the checker configuration.
    pub fn with_checker(mut self, checker: CheckerConfig) -> Self {
        self.checker = checker;
        self
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
