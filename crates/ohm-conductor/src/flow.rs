//! [`FlowState`]: charge level and recent activity derived per tick.

use ohm_core::{StateError, TickId};

use crate::conductor::Conductor;
use crate::node::Extension;
use crate::state::FlowSnapshot;

/// Upper bound of the charge level.
pub const MAX_CHARGE: u16 = 1000;

/// Charge units per volt of settled voltage.
pub const CHARGE_PER_VOLT: f64 = 10.0;

/// Charge at or above which a tick counts as active.
pub const WORK_THRESHOLD: u16 = 50;

/// Derived display state of a conductor.
///
/// `charge` is a linear, capped projection of the settled voltage.
/// `activity` is a 32-tick shift register: bit 0 is the latest tick,
/// set when that tick's charge reached [`WORK_THRESHOLD`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlowState {
    charge: u16,
    activity: u32,
}

impl FlowState {
    /// Charge level in `[0, MAX_CHARGE]`.
    pub fn charge(&self) -> u16 {
        self.charge
    }

    /// Raw activity bitmask.
    pub fn activity(&self) -> u32 {
        self.activity
    }

    /// Whether the latest tick was active.
    pub fn is_active(&self) -> bool {
        self.activity & 1 != 0
    }

    /// Charge rescaled to `[0, max]`.
    pub fn charge_scaled(&self, max: u32) -> u32 {
        (u64::from(self.charge) * u64::from(max) / u64::from(MAX_CHARGE)) as u32
    }

    /// Share of active ticks in the window, rescaled to `[0, max]`.
    pub fn flow_scaled(&self, max: u32) -> u32 {
        (u64::from(self.activity.count_ones()) * u64::from(max) / 32) as u32
    }

    fn charge_for(voltage: f64) -> u16 {
        // NaN saturates to 0 in the cast.
        (voltage * CHARGE_PER_VOLT)
            .floor()
            .clamp(0.0, f64::from(MAX_CHARGE)) as u16
    }
}

impl Extension for FlowState {
    type State = FlowSnapshot;

    fn after_update(&mut self, conductor: &mut Conductor, _tick: TickId) {
        self.charge = Self::charge_for(conductor.settled_voltage());
        self.activity = (self.activity << 1) | u32::from(self.charge >= WORK_THRESHOLD);
    }

    fn save(&self) -> FlowSnapshot {
        FlowSnapshot {
            charge: self.charge,
            activity: self.activity,
        }
    }

    fn check_state(state: &FlowSnapshot) -> Result<(), StateError> {
        if state.charge > MAX_CHARGE {
            return Err(StateError::OutOfRange {
                field: "charge",
                value: u64::from(state.charge),
                max: u64::from(MAX_CHARGE),
            });
        }
        Ok(())
    }

    fn restore(&mut self, state: &FlowSnapshot) {
        self.charge = state.charge;
        self.activity = state.activity;
    }
}
