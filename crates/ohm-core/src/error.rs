//! Error types for the Ohm power-flow simulation.
//!
//! Organized by the stage that produces them: configuration checks,
//! conductor construction and power injection, and persisted-state
//! loading. Rejected current exchanges are not errors; they are
//! reported as ordinary outcomes by the conductor.

use std::error::Error;
use std::fmt;

use crate::id::PortId;

/// Errors detected while validating a conductor configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A tunable is NaN or infinite.
    NonFinite {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A tunable lies outside its allowed range.
    OutOfRange {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// Human-readable description of the allowed range.
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { name, value } => write!(f, "{name} must be finite, got {value}"),
            Self::OutOfRange {
                name,
                value,
                expected,
            } => write!(f, "{name} must be {expected}, got {value}"),
        }
    }
}

impl Error for ConfigError {}

/// Errors from conductor construction and power-based injection.
#[derive(Clone, Debug, PartialEq)]
pub enum ConductorError {
    /// A conductor needs at least one port.
    NoPorts,
    /// The configuration failed validation.
    Config(ConfigError),
    /// Power-based injection was attempted on a zero-capacitance node.
    ///
    /// The power-to-current conversion divides by capacitance, so such
    /// nodes only accept current-based injection. Hitting this is a
    /// programming error at the call site.
    ZeroCapacitance,
    /// The requested power is negative, NaN or infinite.
    InvalidPower {
        /// The rejected power value.
        power: f64,
    },
}

impl fmt::Display for ConductorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPorts => write!(f, "conductor declared with no ports"),
            Self::Config(e) => write!(f, "invalid conductor config: {e}"),
            Self::ZeroCapacitance => {
                write!(f, "power injection requires non-zero capacitance")
            }
            Self::InvalidPower { power } => {
                write!(f, "power must be finite and non-negative, got {power}")
            }
        }
    }
}

impl Error for ConductorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ConductorError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Errors from loading persisted conductor or extension state.
///
/// A failed load leaves the target untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum StateError {
    /// The saved pending-flow slot count differs from the node's.
    ///
    /// The slot count is fixed at construction and is part of the
    /// node's identity.
    PortCountMismatch {
        /// Slot count of the node being loaded into.
        expected: usize,
        /// Slot count found in the saved state.
        found: usize,
    },
    /// A saved scalar is NaN or infinite.
    NonFinite {
        /// Name of the offending field.
        field: &'static str,
        /// Port of the offending pending-flow slot, if applicable.
        port: Option<PortId>,
    },
    /// A saved value lies outside its valid range.
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: u64,
        /// The largest accepted value.
        max: u64,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortCountMismatch { expected, found } => write!(
                f,
                "saved state has {found} pending-flow slots, node has {expected}"
            ),
            Self::NonFinite { field, port } => {
                write!(f, "saved {field} is not finite")?;
                if let Some(port) = port {
                    write!(f, " at port {port}")?;
                }
                Ok(())
            }
            Self::OutOfRange { field, value, max } => {
                write!(f, "saved {field} = {value} exceeds {max}")
            }
        }
    }
}

impl Error for StateError {}
