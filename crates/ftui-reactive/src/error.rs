#![forbid(unsafe_code)]

//! Error types for the reactive substrate.
//!
//! Nothing here crosses a subscription boundary as a panic or a `Result`.
//! Domain failures travel as [`Completion::Failure`](crate::Completion) values;
//! [`ProtocolViolation`] is reported through
//! [`ProtocolPolicy::report`](crate::ProtocolPolicy::report) and then the
//! offending call is ignored.

use std::fmt;

use crate::Identifier;

/// A publisher or subscriber broke the request/deliver/terminate contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// `request` arrived after the subscription had terminated.
    RequestAfterTermination { subscription: Identifier },
    /// A subscriber that already holds a subscription was handed another.
    DuplicateSubscription { subscriber: &'static str },
    /// `request(Finite(0))` carries no demand.
    ZeroDemandRequest { subscription: Identifier },
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestAfterTermination { subscription } => {
                write!(f, "request on terminated subscription {subscription}")
            }
            Self::DuplicateSubscription { subscriber } => {
                write!(f, "{subscriber} received a second subscription")
            }
            Self::ZeroDemandRequest { subscription } => {
                write!(f, "zero demand requested on {subscription}")
            }
        }
    }
}

impl std::error::Error for ProtocolViolation {}

/// Errors from loading or installing [`ReactiveConfig`](crate::ReactiveConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An unrecognised protocol policy name.
    InvalidPolicy(String),
    /// A process-wide config was already installed.
    AlreadyInstalled,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPolicy(value) => {
                write!(f, "invalid protocol policy '{value}' (expected strict|permissive)")
            }
            Self::AlreadyInstalled => f.write_str("reactive config already installed"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_display_names_the_subscription() {
        let id = Identifier::new();
        let msg = ProtocolViolation::RequestAfterTermination { subscription: id }.to_string();
        assert!(msg.contains(&id.to_string()));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidPolicy("loose".into());
        assert_eq!(
            err.to_string(),
            "invalid protocol policy 'loose' (expected strict|permissive)"
        );
    }
}
