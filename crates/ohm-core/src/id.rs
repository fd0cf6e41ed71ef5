//! Strongly-typed identifiers and the host tick.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a device that owns one or more conductors.
///
/// Conductors hold this handle instead of a reference to their owner,
/// so device and conductor never form an ownership cycle. Two
/// conductors with the same `DeviceId` never exchange current.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DeviceId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies one conductor: its owning device plus a slot index
/// within that device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConductorId {
    /// The owning device.
    pub device: DeviceId,
    /// Index of the conductor among the device's conductors.
    pub slot: u16,
}

impl ConductorId {
    /// Create an id for `slot` on `device`.
    pub const fn new(device: DeviceId, slot: u16) -> Self {
        Self { device, slot }
    }
}

impl fmt::Display for ConductorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.slot)
    }
}

impl From<DeviceId> for ConductorId {
    /// The first (and usually only) conductor of a device.
    fn from(device: DeviceId) -> Self {
        Self { device, slot: 0 }
    }
}

/// A local port through which a conductor may reach a neighbor.
///
/// Port ids index the per-port pending-flow storage directly, so
/// keep them small and dense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(pub u16);

impl PortId {
    /// The port id as a storage index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for PortId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Monotonically increasing tick counter supplied by the host.
///
/// Conductors only ever consume the low 16 bits, see [`TickId::stamp`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TickId(pub u64);

impl TickId {
    /// The 16-bit settle window of this tick.
    ///
    /// Ticks 65536 apart share a stamp. Callers must tolerate this
    /// wraparound: a stamp is only meaningful as "same tick or not".
    pub const fn stamp(self) -> TickStamp {
        TickStamp(self.0 as u16)
    }

    /// The following tick.
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A tick reduced to its low 16 bits.
///
/// Stamps are compared for equality only; ordering across the
/// wraparound is not meaningful.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickStamp(pub u16);

impl fmt::Display for TickStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TickId> for TickStamp {
    fn from(tick: TickId) -> Self {
        tick.stamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn stamp_wraps_at_65536() {
        assert_eq!(TickId(0).stamp(), TickId(65536).stamp());
        assert_eq!(TickId(65535).stamp(), TickStamp(u16::MAX));
        assert_eq!(TickId(65537).stamp(), TickStamp(1));
    }

    #[test]
    fn conductor_id_from_device_is_slot_zero() {
        let id = ConductorId::from(DeviceId(7));
        assert_eq!(id, ConductorId::new(DeviceId(7), 0));
        assert_eq!(id.to_string(), "7:0");
    }

    #[test]
    fn next_tick_wraps_u64() {
        assert_eq!(TickId(u64::MAX).next(), TickId(0));
    }

    proptest! {
        #[test]
        fn stamp_ignores_high_bits(tick in any::<u64>(), k in 0u64..1024) {
            let shifted = TickId(tick.wrapping_add(k << 16));
            prop_assert_eq!(TickId(tick).stamp(), shifted.stamp());
        }
    }
}
