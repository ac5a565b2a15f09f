#![forbid(unsafe_code)]

//! Runtime configuration for protocol enforcement and delivery tracing.
//!
//! A single process-wide [`ReactiveConfig`] is resolved at most once: either
//! explicitly through [`ReactiveConfig::install`], or lazily from the
//! environment the first time [`ReactiveConfig::current`] is read. Conduits
//! capture the active policy when they are created.
//!
//! # Environment
//!
//! | Variable                 | Values                  | Default      |
//! |--------------------------|-------------------------|--------------|
//! | `FTUI_REACTIVE_PROTOCOL` | `strict` / `permissive` | `permissive` |
//! | `FTUI_REACTIVE_TRACE`    | `1` `true` `yes` `on`   | off          |

use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{ConfigError, ProtocolViolation};

const PROTOCOL_ENV: &str = "FTUI_REACTIVE_PROTOCOL";
const TRACE_ENV: &str = "FTUI_REACTIVE_TRACE";

static CONFIG: OnceLock<ReactiveConfig> = OnceLock::new();

/// What to do when a caller breaks the subscription contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolPolicy {
    /// Log at debug level and ignore the offending call.
    #[default]
    Permissive,
    /// Log a warning and fail a `debug_assert!` (debug builds).
    Strict,
}

impl ProtocolPolicy {
    /// Report `violation` according to this policy.
    ///
    /// The call site always carries on as if the offending call were a no-op.
    pub fn report(self, violation: &ProtocolViolation) {
        match self {
            Self::Permissive => {
                tracing::debug!(%violation, "ignoring reactive protocol violation");
            }
            Self::Strict => {
                tracing::warn!(%violation, "reactive protocol violation");
                debug_assert!(false, "reactive protocol violation: {violation}");
            }
        }
    }
}

impl FromStr for ProtocolPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            _ => Err(ConfigError::InvalidPolicy(s.to_string())),
        }
    }
}

/// Process-wide settings for the reactive substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReactiveConfig {
    /// Handling of protocol violations.
    pub policy: ProtocolPolicy,
    /// Emit a `trace!` event for every value delivered through a conduit.
    pub trace_deliveries: bool,
}

#[inline]
fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl ReactiveConfig {
    /// Set the protocol policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ProtocolPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set whether per-delivery trace events are emitted.
    #[must_use]
    pub fn with_trace_deliveries(mut self, enabled: bool) -> Self {
        self.trace_deliveries = enabled;
        self
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build a config using a custom environment lookup.
    pub fn from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = get_env(PROTOCOL_ENV) {
            config.policy = value.parse()?;
        }
        if let Some(value) = get_env(TRACE_ENV) {
            config.trace_deliveries = env_flag(&value);
        }
        Ok(config)
    }

    /// Install `self` as the process-wide config.
    ///
    /// Fails with [`ConfigError::AlreadyInstalled`] if a config was installed
    /// earlier or already resolved by [`ReactiveConfig::current`].
    pub fn install(self) -> Result<(), ConfigError> {
        CONFIG.set(self).map_err(|_| ConfigError::AlreadyInstalled)
    }

    /// The process-wide config, resolving it from the environment on first use.
    ///
    /// An unparseable environment falls back to the default config.
    pub fn current() -> Self {
        *CONFIG.get_or_init(|| {
            Self::from_env().unwrap_or_else(|err| {
                tracing::warn!(%err, "ignoring reactive environment config");
                Self::default()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Identifier;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_env_is_default() {
        let config = ReactiveConfig::from_env_with(lookup(&[])).unwrap();
        assert_eq!(config, ReactiveConfig::default());
        assert_eq!(config.policy, ProtocolPolicy::Permissive);
        assert!(!config.trace_deliveries);
    }

    #[test]
    fn env_values_are_trimmed_and_case_insensitive() {
        let config = ReactiveConfig::from_env_with(lookup(&[
            (PROTOCOL_ENV, "  Strict "),
            (TRACE_ENV, "YES"),
        ]))
        .unwrap();
        assert_eq!(config.policy, ProtocolPolicy::Strict);
        assert!(config.trace_deliveries);
    }

    #[test]
    fn bad_policy_is_an_error() {
        let err = ReactiveConfig::from_env_with(lookup(&[(PROTOCOL_ENV, "lenient")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPolicy("lenient".into()));
    }

    #[test]
    fn builder_methods() {
        let config = ReactiveConfig::default()
            .with_policy(ProtocolPolicy::Strict)
            .with_trace_deliveries(true);
        assert_eq!(config.policy, ProtocolPolicy::Strict);
        assert!(config.trace_deliveries);
    }

    #[test]
    fn second_install_is_rejected() {
        let _ = ReactiveConfig::default().install();
        assert_eq!(
            ReactiveConfig::default().install(),
            Err(ConfigError::AlreadyInstalled)
        );
        // Resolved value stays stable once set.
        assert_eq!(ReactiveConfig::current(), ReactiveConfig::current());
    }

    #[test]
    fn permissive_report_does_not_panic() {
        ProtocolPolicy::Permissive.report(&ProtocolViolation::RequestAfterTermination {
            subscription: Identifier::new(),
        });
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "reactive protocol violation")]
    fn strict_report_asserts_in_debug() {
        ProtocolPolicy::Strict.report(&ProtocolViolation::ZeroDemandRequest {
            subscription: Identifier::new(),
        });
    }
}
