//! The [`Connectable`] capability a device exposes to its conductor.

use ohm_core::{PortId, TickId};

use crate::conductor::Conductor;

/// A device's view of its connectivity, handed to
/// [`Conductor::update`] for one pass.
///
/// The conductor holds only its owner's [`DeviceId`](ohm_core::DeviceId);
/// the host resolves everything else through this trait, so no
/// reference from conductor to device is ever stored.
///
/// # Contract
///
/// - `conductor_out` must be stable for a given connectivity state:
///   the same port resolves to the same neighbor until the wiring
///   changes.
/// - A disconnected port yields `None`, never a panic.
/// - The conductor being updated is borrowed separately, so
///   implementations must not hand it back out of either lookup.
pub trait Connectable {
    /// The host tick this pass runs at.
    fn tick(&self) -> TickId;

    /// The device's own conductor serving `port`, if any.
    fn conductor(&mut self, port: PortId) -> Option<&mut Conductor>;

    /// The neighbor conductor reached through `port`, if connected.
    fn conductor_out(&mut self, port: PortId) -> Option<&mut Conductor>;
}
