//! Conductor tunables and the fixed relaxation constants.

use ohm_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Fraction of the accumulated voltage delta (times capacitance)
/// folded into the resting voltage at each settle.
pub const VOLTAGE_DAMPING: f64 = 0.5;

/// Converts a voltage step into the current that produces it at the
/// next settle. The inverse of [`VOLTAGE_DAMPING`].
pub const POWER_CURRENT_RATE: f64 = 1.0 / VOLTAGE_DAMPING;

/// Weight of requested power inside the energy radicand
/// `v² ± POWER_ENERGY_SCALE · P · C`.
pub const POWER_ENERGY_SCALE: f64 = 0.1;

/// Electrical tunables of one conductor.
///
/// These are convergence knobs for the relaxation, not physical units.
/// Raising `inductance_scale` toward 1 makes a link respond faster but
/// invites oscillation; `parallel_flow_scale` adds an instantaneous,
/// memoryless share of the exchange that damps it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConductorConfig {
    /// Series resistance of this node. Default: 0.01.
    pub resistance: f64,
    /// Voltage gain per unit of accumulated current. Default: 0.0.
    ///
    /// A zero-capacitance node keeps its resting voltage forever and
    /// rejects power-based injection.
    pub capacitance: f64,
    /// Lag-filter gain of the per-port pending flow, in `(0, 1]`.
    /// Default: 0.05.
    pub inductance_scale: f64,
    /// Instantaneous flow per volt of differential. Default: 0.45.
    pub parallel_flow_scale: f64,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            resistance: 0.01,
            capacitance: 0.0,
            inductance_scale: 0.05,
            parallel_flow_scale: 0.45,
        }
    }
}

impl ConductorConfig {
    /// Set the series resistance.
    pub fn with_resistance(mut self, resistance: f64) -> Self {
        self.resistance = resistance;
        self
    }

    /// Set the capacitance.
    pub fn with_capacitance(mut self, capacitance: f64) -> Self {
        self.capacitance = capacitance;
        self
    }

    /// Set the pending-flow lag gain.
    pub fn with_inductance_scale(mut self, inductance_scale: f64) -> Self {
        self.inductance_scale = inductance_scale;
        self
    }

    /// Set the instantaneous flow gain.
    pub fn with_parallel_flow_scale(mut self, parallel_flow_scale: f64) -> Self {
        self.parallel_flow_scale = parallel_flow_scale;
        self
    }

    /// Whether power-based injection is possible on this node.
    pub fn accepts_power(&self) -> bool {
        self.capacitance > 0.0
    }

    /// Check every tunable for finiteness and range.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in field declaration order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("resistance", self.resistance)?;
        non_negative("capacitance", self.capacitance)?;
        finite("inductance_scale", self.inductance_scale)?;
        if self.inductance_scale <= 0.0 || self.inductance_scale > 1.0 {
            return Err(ConfigError::OutOfRange {
                name: "inductance_scale",
                value: self.inductance_scale,
                expected: "in (0, 1]",
            });
        }
        non_negative("parallel_flow_scale", self.parallel_flow_scale)?;
        Ok(())
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            expected: ">= 0",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ConductorConfig::default().validate().is_ok());
        assert!(!ConductorConfig::default().accepts_power());
    }

    #[test]
    fn power_rate_inverts_damping() {
        assert_eq!(POWER_CURRENT_RATE * VOLTAGE_DAMPING, 1.0);
    }

    #[test]
    fn rejects_negative_resistance() {
        let err = ConductorConfig::default()
            .with_resistance(-1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                name: "resistance",
                ..
            }
        ));
    }

    #[test]
    fn rejects_nan_capacitance() {
        let err = ConductorConfig::default()
            .with_capacitance(f64::NAN)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonFinite {
                name: "capacitance",
                ..
            }
        ));
    }

    #[test]
    fn inductance_scale_bounds() {
        let base = ConductorConfig::default();
        assert!(base.with_inductance_scale(1.0).validate().is_ok());
        assert!(base.with_inductance_scale(0.0).validate().is_err());
        assert!(base.with_inductance_scale(1.5).validate().is_err());
        assert!(base.with_inductance_scale(f64::INFINITY).validate().is_err());
    }
}
