//! Persisted state records.
//!
//! The records fix *which* fields persist; encoding is left to serde.
//! The incoming-surge record is transient and never saved.

use ohm_core::{PortId, StateError, TickStamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conductor::Conductor;

/// Saved scalar state of a [`Conductor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConductorState {
    /// One value per pending-flow slot, indexed by port id.
    pub pending_flow: Vec<f64>,
    /// Settled voltage.
    pub voltage: f64,
    /// Settled current.
    pub current: f64,
    /// Directional accumulator.
    pub voltage_accum: f64,
    /// Magnitude accumulator.
    pub current_accum: f64,
    /// Stamp of the last settle.
    pub last_settled: TickStamp,
}

/// Saved state of a [`FlowState`](crate::FlowState).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSnapshot {
    /// Charge level in `[0, 1000]`.
    pub charge: u16,
    /// Activity shift register, bit 0 most recent.
    pub activity: u32,
}

/// Saved state of a [`PoweredNode`](crate::PoweredNode): the base
/// conductor followed by its extension pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeState<S> {
    /// Base conductor state.
    pub conductor: ConductorState,
    /// Extension state, in pipeline order.
    pub extension: S,
}

impl Conductor {
    /// Capture the persisted fields.
    pub fn save(&self) -> ConductorState {
        ConductorState {
            pending_flow: self.pending_flow.to_vec(),
            voltage: self.voltage,
            current: self.current,
            voltage_accum: self.voltage_accum,
            current_accum: self.current_accum,
            last_settled: self.last_settled,
        }
    }

    /// Check that `state` could be loaded into this node.
    ///
    /// # Errors
    ///
    /// [`StateError::PortCountMismatch`] when the slot count differs,
    /// [`StateError::NonFinite`] for NaN or infinite scalars.
    pub fn check_state(&self, state: &ConductorState) -> Result<(), StateError> {
        if state.pending_flow.len() != self.pending_flow.len() {
            return Err(StateError::PortCountMismatch {
                expected: self.pending_flow.len(),
                found: state.pending_flow.len(),
            });
        }
        for (i, flow) in state.pending_flow.iter().enumerate() {
            if !flow.is_finite() {
                return Err(StateError::NonFinite {
                    field: "pending_flow",
                    port: Some(PortId(i as u16)),
                });
            }
        }
        for (field, value) in [
            ("voltage", state.voltage),
            ("current", state.current),
            ("voltage_accum", state.voltage_accum),
            ("current_accum", state.current_accum),
        ] {
            if !value.is_finite() {
                return Err(StateError::NonFinite { field, port: None });
            }
        }
        Ok(())
    }

    /// Overwrite the persisted fields from `state`.
    ///
    /// # Errors
    ///
    /// See [`check_state`](Conductor::check_state). The node is left
    /// untouched on error.
    pub fn load(&mut self, state: &ConductorState) -> Result<(), StateError> {
        self.check_state(state)
            .inspect_err(|e| debug!(conductor = %self.id, error = %e, "Rejected saved state"))?;
        self.restore(state);
        Ok(())
    }

    pub(crate) fn restore(&mut self, state: &ConductorState) {
        self.pending_flow.copy_from_slice(&state.pending_flow);
        self.voltage = state.voltage;
        self.current = state.current;
        self.voltage_accum = state.voltage_accum;
        self.current_accum = state.current_accum;
        self.last_settled = state.last_settled;
        self.incoming.clear();
    }
}
