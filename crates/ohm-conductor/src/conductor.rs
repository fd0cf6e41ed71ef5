//! The [`Conductor`] node: settled state, accumulators and injection.
//!
//! All state changes funnel through [`Conductor::apply_current`], which
//! only touches the accumulators. The accumulators are folded into the
//! settled voltage and current at most once per tick stamp by
//! [`Conductor::settle`], so reads between settles never tear.

use ohm_core::{ConductorError, ConductorId, PortId, TickId, TickStamp};
use smallvec::{smallvec, SmallVec};
use tracing::{debug, warn};

use crate::config::{ConductorConfig, POWER_CURRENT_RATE, POWER_ENERGY_SCALE, VOLTAGE_DAMPING};
use crate::surge::IncomingSurges;

/// Inline capacity for ports; covers the six faces of a block.
pub(crate) type PortList = SmallVec<[PortId; 6]>;

/// Per-port pending flow, indexed by [`PortId::index`].
pub(crate) type FlowSlots = SmallVec<[f64; 6]>;

/// One electrical node owned by a device.
///
/// The port set is fixed at construction. Ports are kept sorted
/// ascending and de-duplicated; that order is the one
/// [`update`](Conductor::update) rotates through.
#[derive(Clone, Debug)]
pub struct Conductor {
    pub(crate) id: ConductorId,
    pub(crate) config: ConductorConfig,
    pub(crate) ports: PortList,
    pub(crate) pending_flow: FlowSlots,
    pub(crate) voltage: f64,
    pub(crate) current: f64,
    pub(crate) voltage_accum: f64,
    pub(crate) current_accum: f64,
    pub(crate) last_settled: TickStamp,
    pub(crate) incoming: IncomingSurges,
}

impl Conductor {
    /// Create a conductor at rest (zero voltage, zero current).
    ///
    /// # Errors
    ///
    /// [`ConductorError::NoPorts`] if `ports` is empty, or
    /// [`ConductorError::Config`] if `config` fails validation.
    pub fn new(
        id: ConductorId,
        ports: impl IntoIterator<Item = PortId>,
        config: ConductorConfig,
    ) -> Result<Self, ConductorError> {
        config
            .validate()
            .inspect_err(|e| warn!(conductor = %id, error = %e, "Rejected conductor config"))?;

        let mut ports: PortList = ports.into_iter().collect();
        ports.sort_unstable();
        ports.dedup();
        let slots = match ports.last() {
            Some(max) => max.index() + 1,
            None => return Err(ConductorError::NoPorts),
        };

        Ok(Self {
            id,
            config,
            ports,
            pending_flow: smallvec![0.0; slots],
            voltage: 0.0,
            current: 0.0,
            voltage_accum: 0.0,
            current_accum: 0.0,
            last_settled: TickStamp::default(),
            incoming: IncomingSurges::default(),
        })
    }

    /// Identity of this conductor.
    pub fn id(&self) -> ConductorId {
        self.id
    }

    /// Electrical tunables.
    pub fn config(&self) -> &ConductorConfig {
        &self.config
    }

    /// Declared ports, ascending.
    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    /// Whether `port` was declared at construction.
    pub fn has_port(&self, port: PortId) -> bool {
        self.ports.binary_search(&port).is_ok()
    }

    /// Number of pending-flow slots (highest port id + 1).
    pub fn slot_count(&self) -> usize {
        self.pending_flow.len()
    }

    /// Pending flow of a declared port, or `None` for undeclared ports.
    pub fn pending_flow(&self, port: PortId) -> Option<f64> {
        if self.has_port(port) {
            self.pending_flow.get(port.index()).copied()
        } else {
            None
        }
    }

    /// Voltage as of the last settle, without settling.
    pub fn settled_voltage(&self) -> f64 {
        self.voltage
    }

    /// Current as of the last settle, without settling.
    pub fn settled_current(&self) -> f64 {
        self.current
    }

    /// Stamp of the last settle.
    pub fn last_settled(&self) -> TickStamp {
        self.last_settled
    }

    /// Net directional current accumulated since the last settle.
    pub fn voltage_accum(&self) -> f64 {
        self.voltage_accum
    }

    /// Current magnitude accumulated since the last settle.
    pub fn current_accum(&self) -> f64 {
        self.current_accum
    }

    /// Overwrite the resting voltage. Used by hosts to seed sources.
    pub fn set_voltage(&mut self, voltage: f64) {
        self.voltage = voltage;
    }

    /// Fold the accumulators into the settled state, once per stamp.
    ///
    /// The first call for a new stamp sets current to half the
    /// accumulated magnitude and integrates the accumulated directional
    /// current into voltage, scaled by capacitance and
    /// [`VOLTAGE_DAMPING`]. Later calls with the same stamp are no-ops.
    /// Returns the settled voltage.
    pub fn settle(&mut self, tick: TickId) -> f64 {
        let stamp = tick.stamp();
        if stamp != self.last_settled {
            self.last_settled = stamp;
            self.current = self.current_accum * 0.5;
            self.current_accum = 0.0;
            self.voltage += self.voltage_accum * self.config.capacitance * VOLTAGE_DAMPING;
            self.voltage_accum = 0.0;
        }
        self.voltage
    }

    /// Settled voltage for `tick`.
    pub fn voltage(&mut self, tick: TickId) -> f64 {
        self.settle(tick)
    }

    /// Settled current for `tick`.
    pub fn amperage(&mut self, tick: TickId) -> f64 {
        self.settle(tick);
        self.current
    }

    /// Settled voltage times the cached current field.
    pub fn wattage(&mut self, tick: TickId) -> f64 {
        let voltage = self.settle(tick);
        voltage * self.current
    }

    /// Inject a directional current.
    ///
    /// Settles first so the contribution lands in the accumulators of
    /// the current stamp; it becomes visible at the next settle.
    pub fn apply_current(&mut self, tick: TickId, current: f64) {
        self.settle(tick);
        self.voltage_accum += current;
        self.current_accum += current.abs();
    }

    /// Deliver `power` into the node as an equivalent current.
    ///
    /// The current is chosen so that the next settle lands on
    /// `sqrt(v² + 0.1·P·C)`. Returns the injected current.
    ///
    /// # Errors
    ///
    /// [`ConductorError::ZeroCapacitance`] on zero-capacitance nodes,
    /// [`ConductorError::InvalidPower`] for negative or non-finite power.
    /// Nothing is injected on error.
    pub fn apply_power(&mut self, tick: TickId, power: f64) -> Result<f64, ConductorError> {
        let capacitance = self.power_capacitance(power)?;
        let voltage = self.settle(tick);
        let target = (voltage * voltage + POWER_ENERGY_SCALE * power * capacitance).sqrt();
        let current = (target - voltage) * POWER_CURRENT_RATE / capacitance;
        self.apply_current(tick, current);
        Ok(current)
    }

    /// Draw `power` out of the node as an equivalent (negative) current.
    ///
    /// When the node holds less energy than requested the radicand
    /// `v² − 0.1·P·C` goes negative; the draw is then refused and the
    /// returned current is exactly zero.
    ///
    /// # Errors
    ///
    /// Same as [`apply_power`](Conductor::apply_power).
    pub fn draw_power(&mut self, tick: TickId, power: f64) -> Result<f64, ConductorError> {
        let capacitance = self.power_capacitance(power)?;
        let voltage = self.settle(tick);
        let radicand = voltage * voltage - POWER_ENERGY_SCALE * power * capacitance;
        if radicand < 0.0 {
            debug!(
                conductor = %self.id,
                voltage,
                power,
                "Refused power draw beyond stored energy"
            );
            return Ok(0.0);
        }
        let current = (radicand.sqrt() - voltage) * POWER_CURRENT_RATE / capacitance;
        self.apply_current(tick, current);
        Ok(current)
    }

    fn power_capacitance(&self, power: f64) -> Result<f64, ConductorError> {
        if !power.is_finite() || power < 0.0 {
            return Err(ConductorError::InvalidPower { power });
        }
        if !self.config.accepts_power() {
            return Err(ConductorError::ZeroCapacitance);
        }
        Ok(self.config.capacitance)
    }
}
