//! [`Circuit`]: an in-memory host owning devices and their conductors.

use std::mem;

use indexmap::IndexMap;
use ohm_conductor::config::VOLTAGE_DAMPING;
use ohm_conductor::{Conductor, ConductorConfig, Connectable, UpdateReport};
use ohm_core::{ConductorError, ConductorId, DeviceId, PortId, TickId};
use rand::seq::SliceRandom;
use rand::Rng;

/// One device: its conductors by slot, plus outgoing wires keyed by
/// `(slot, port)`.
#[derive(Default)]
struct Device {
    slots: Vec<Option<Conductor>>,
    wires: IndexMap<(u16, PortId), ConductorId>,
}

/// A host that drives conductor updates tick by tick.
///
/// While a conductor updates it is taken out of its slot, so the
/// [`DeviceLink`] handed to it can lend out any other conductor
/// mutably. A wire that loops back to the updating conductor resolves
/// to `None`.
#[derive(Default)]
pub struct Circuit {
    devices: IndexMap<DeviceId, Device>,
    tick: TickId,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last tick that ran (`TickId(0)` before the first step).
    pub fn tick(&self) -> TickId {
        self.tick
    }

    /// Resume counting from `tick`, e.g. after loading saved state.
    pub fn set_tick(&mut self, tick: TickId) {
        self.tick = tick;
    }

    /// Add a conductor to `device` in the next free slot.
    pub fn add_conductor(
        &mut self,
        device: DeviceId,
        ports: impl IntoIterator<Item = PortId>,
        config: ConductorConfig,
    ) -> Result<ConductorId, ConductorError> {
        let entry = self.devices.entry(device).or_default();
        let id = ConductorId::new(device, entry.slots.len() as u16);
        entry.slots.push(Some(Conductor::new(id, ports, config)?));
        Ok(id)
    }

    /// Wire `a`'s port `pa` to `b` and `b`'s port `pb` back to `a`.
    pub fn link(&mut self, a: ConductorId, pa: PortId, b: ConductorId, pb: PortId) {
        self.link_one_way(a, pa, b);
        self.link_one_way(b, pb, a);
    }

    /// Wire `from`'s `port` to `to` without a return path.
    pub fn link_one_way(&mut self, from: ConductorId, port: PortId, to: ConductorId) {
        self.devices
            .entry(from.device)
            .or_default()
            .wires
            .insert((from.slot, port), to);
    }

    /// Remove the wire leaving `from` through `port`, returning its target.
    pub fn unlink(&mut self, from: ConductorId, port: PortId) -> Option<ConductorId> {
        self.devices
            .get_mut(&from.device)?
            .wires
            .shift_remove(&(from.slot, port))
    }

    pub fn conductor(&self, id: ConductorId) -> Option<&Conductor> {
        self.devices
            .get(&id.device)?
            .slots
            .get(usize::from(id.slot))?
            .as_ref()
    }

    pub fn conductor_mut(&mut self, id: ConductorId) -> Option<&mut Conductor> {
        self.devices
            .get_mut(&id.device)?
            .slots
            .get_mut(usize::from(id.slot))?
            .as_mut()
    }

    /// Every conductor id in insertion order.
    pub fn ids(&self) -> Vec<ConductorId> {
        self.devices
            .iter()
            .flat_map(|(&device, d)| {
                (0..d.slots.len()).map(move |slot| ConductorId::new(device, slot as u16))
            })
            .collect()
    }

    /// Advance the tick counter without updating anything.
    pub fn advance(&mut self) -> TickId {
        self.tick = self.tick.next();
        self.tick
    }

    /// Run one conductor's pass at the current tick.
    pub fn update_one(&mut self, id: ConductorId) -> Option<UpdateReport> {
        let slot = self
            .devices
            .get_mut(&id.device)?
            .slots
            .get_mut(usize::from(id.slot))?;
        let mut conductor = mem::take(slot)?;
        let report = {
            let mut link = DeviceLink {
                tick: self.tick,
                from: id,
                devices: &mut self.devices,
            };
            conductor.update(&mut link)
        };
        // `DeviceLink` only lends conductors out; devices and slots
        // cannot disappear while the update runs.
        let slot = self
            .devices
            .get_mut(&id.device)
            .and_then(|d| d.slots.get_mut(usize::from(id.slot)));
        debug_assert!(slot.is_some(), "slot of {id} vanished during its update");
        if let Some(slot) = slot {
            *slot = Some(conductor);
        }
        Some(report)
    }

    /// Advance one tick and update every conductor in insertion order.
    pub fn step(&mut self) -> TickId {
        let order = self.ids();
        self.step_in_order(&order)
    }

    /// Advance one tick and update conductors in the given order.
    pub fn step_in_order(&mut self, order: &[ConductorId]) -> TickId {
        let tick = self.advance();
        for &id in order {
            self.update_one(id);
        }
        tick
    }

    /// Advance one tick and update every conductor in a random order.
    pub fn step_shuffled<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickId {
        let mut order = self.ids();
        order.shuffle(rng);
        self.step_in_order(&order)
    }

    /// Run `ticks` stable-order steps.
    pub fn run(&mut self, ticks: u64) -> TickId {
        for _ in 0..ticks {
            self.step();
        }
        self.tick
    }

    /// Settled voltage plus the voltage still pending in the
    /// accumulators, summed over all conductors.
    ///
    /// Conserved by surges between conductors of equal capacitance.
    pub fn total_charge(&self) -> f64 {
        self.devices
            .values()
            .flat_map(|d| d.slots.iter().flatten())
            .map(|c| {
                c.settled_voltage() + c.voltage_accum() * c.config().capacitance * VOLTAGE_DAMPING
            })
            .sum()
    }
}

/// The [`Connectable`] view of one device while one of its conductors
/// is out of its slot.
pub struct DeviceLink<'a> {
    tick: TickId,
    from: ConductorId,
    devices: &'a mut IndexMap<DeviceId, Device>,
}

impl Connectable for DeviceLink<'_> {
    fn tick(&self) -> TickId {
        self.tick
    }

    fn conductor(&mut self, port: PortId) -> Option<&mut Conductor> {
        self.devices
            .get_mut(&self.from.device)?
            .slots
            .iter_mut()
            .flatten()
            .find(|c| c.has_port(port))
    }

    fn conductor_out(&mut self, port: PortId) -> Option<&mut Conductor> {
        let to = *self
            .devices
            .get(&self.from.device)?
            .wires
            .get(&(self.from.slot, port))?;
        self.devices
            .get_mut(&to.device)?
            .slots
            .get_mut(usize::from(to.slot))?
            .as_mut()
    }
}
