#![forbid(unsafe_code)]

//! Observer configuration.
//!
//! Defaults reproduce the classic behavior: array sinks run before the
//! mutation and inserted elements are left as they are. Both knobs can be
//! set in code or from the environment:
//!
//! | Variable                         | Values                  |
//! |----------------------------------|-------------------------|
//! | `FTUI_OBSERVE_NOTIFY`            | `before` (default), `after` |
//! | `FTUI_OBSERVE_CONVERT_INSERTED`  | `1`/`true`/`yes`/`on`   |
//!
//! Unrecognized values fall back to the default.

/// When an intercepted array mutator notifies, relative to the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyTiming {
    /// Notify, then mutate. A sink reading the array sees the old contents.
    #[default]
    BeforeMutation,
    /// Mutate, then notify.
    AfterMutation,
}

impl NotifyTiming {
    /// Parse `before` / `after` (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "before" => Some(Self::BeforeMutation),
            "after" => Some(Self::AfterMutation),
            _ => None,
        }
    }
}

/// Configuration for an [`Observer`](crate::Observer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserverConfig {
    /// Timing of array mutator notifications.
    pub sequence_notify: NotifyTiming,
    /// Convert structures inserted by `push`/`unshift`/`splice` before they
    /// land in the array.
    pub convert_inserted: bool,
}

impl ObserverConfig {
    /// Set the array notification timing.
    #[must_use]
    pub fn with_sequence_notify(mut self, timing: NotifyTiming) -> Self {
        self.sequence_notify = timing;
        self
    }

    /// Set whether inserted elements are converted.
    #[must_use]
    pub fn with_convert_inserted(mut self, enabled: bool) -> Self {
        self.convert_inserted = enabled;
        self
    }

    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read configuration using a custom environment lookup.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(timing) = get_env("FTUI_OBSERVE_NOTIFY").and_then(|v| NotifyTiming::parse(&v))
        {
            config.sequence_notify = timing;
        }
        if let Some(value) = get_env("FTUI_OBSERVE_CONVERT_INSERTED") {
            config.convert_inserted = env_flag(&value);
        }
        config
    }
}

#[inline]
fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
