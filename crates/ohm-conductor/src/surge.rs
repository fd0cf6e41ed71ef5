//! Pairwise current exchange and the per-tick relaxation pass.
//!
//! [`Conductor::surge`] performs one bounded step between a node and
//! one neighbor. [`Conductor::update`] walks every port once per tick,
//! starting at a port that rotates with the tick so no port is always
//! serviced last.
//!
//! A pair of mutually connected nodes exchanges at most once per tick:
//! whichever side surges first records itself in the other side's
//! [`IncomingSurges`], and the other side's own pass short-circuits.

use ohm_core::{ConductorId, PortId, TickId, TickStamp};
use smallvec::SmallVec;
use tracing::trace;

use crate::conductor::Conductor;
use crate::link::Connectable;

/// Result of one [`Conductor::surge`] attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurgeOutcome {
    /// Current flowed from this node into the neighbor (negative
    /// values flow the other way).
    Exchanged {
        /// Current pushed into the neighbor.
        current: f64,
    },
    /// The neighbor already surged into this node this tick; nothing
    /// was applied again.
    AlreadyExchanged,
    /// No neighbor is reachable through the port.
    Disconnected,
    /// The neighbor belongs to the same device.
    SameDevice,
    /// The port was not declared on this node.
    UnknownPort,
}

impl SurgeOutcome {
    /// Whether the pair is settled for this tick (exchanged now or
    /// earlier from the other side).
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Exchanged { .. } | Self::AlreadyExchanged)
    }
}

/// Tally of one [`Conductor::update`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Tick the pass ran at.
    pub tick: TickId,
    /// Ports that exchanged current.
    pub exchanged: u16,
    /// Ports skipped because the neighbor already surged in.
    pub already_exchanged: u16,
    /// Ports rejected; their pending flow was reset to zero.
    pub rejected: u16,
}

/// Neighbors that pushed current into a node during one tick.
///
/// Tagged with the stamp it was filled in, so entries from an earlier
/// tick are discarded even if the owner skipped its own pass.
#[derive(Clone, Debug, Default)]
pub(crate) struct IncomingSurges {
    stamp: TickStamp,
    from: SmallVec<[ConductorId; 4]>,
}

impl IncomingSurges {
    pub(crate) fn record(&mut self, stamp: TickStamp, from: ConductorId) {
        if stamp != self.stamp {
            self.from.clear();
            self.stamp = stamp;
        }
        if !self.from.contains(&from) {
            self.from.push(from);
        }
    }

    pub(crate) fn contains(&self, stamp: TickStamp, from: ConductorId) -> bool {
        self.stamp == stamp && self.from.contains(&from)
    }

    pub(crate) fn clear(&mut self) {
        self.from.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.from.len()
    }
}

impl Conductor {
    /// Exchange current with `neighbor` through `port`.
    ///
    /// The current sent is the port's pending flow `I` as it stood
    /// before this step, plus an instantaneous `V · parallel_flow_scale`,
    /// where `V` is the settled voltage differential. It is drawn from
    /// this node and pushed into the neighbor. The pending flow then
    /// moves a fraction `inductance_scale` of the way toward the
    /// resistive target `V − I·r` (`r` the combined resistance), which
    /// only takes effect from the next exchange.
    ///
    /// Rejections leave both sides untouched.
    pub fn surge(
        &mut self,
        neighbor: Option<&mut Conductor>,
        port: PortId,
        tick: TickId,
    ) -> SurgeOutcome {
        if !self.has_port(port) {
            return SurgeOutcome::UnknownPort;
        }
        let Some(neighbor) = neighbor else {
            return SurgeOutcome::Disconnected;
        };
        if neighbor.id.device == self.id.device {
            return SurgeOutcome::SameDevice;
        }
        if self.incoming.contains(tick.stamp(), neighbor.id) {
            return SurgeOutcome::AlreadyExchanged;
        }

        let resistance = self.config.resistance + neighbor.config.resistance;
        let differential = self.settle(tick) - neighbor.settle(tick);

        let slot = port.index();
        let flow = self.pending_flow[slot];
        self.pending_flow[slot] =
            flow + self.config.inductance_scale * (differential - flow * resistance);

        let current = flow + differential * self.config.parallel_flow_scale;
        self.apply_current(tick, -current);
        neighbor.receive_surge(self.id, tick, current);
        SurgeOutcome::Exchanged { current }
    }

    /// Accept `current` pushed in by `from` and remember that the pair
    /// has exchanged this tick.
    pub fn receive_surge(&mut self, from: ConductorId, tick: TickId, current: f64) {
        self.apply_current(tick, current);
        self.incoming.record(tick.stamp(), from);
    }

    /// Run this node's relaxation pass for the link's tick.
    ///
    /// Settles, then surges through every port exactly once starting at
    /// `stamp % port_count` in ascending port order. Ports whose
    /// exchange is rejected have their pending flow reset to zero.
    /// The incoming-surge record is cleared at the end of the pass.
    pub fn update<L: Connectable + ?Sized>(&mut self, link: &mut L) -> UpdateReport {
        let tick = link.tick();
        self.settle(tick);

        let mut report = UpdateReport {
            tick,
            ..UpdateReport::default()
        };
        let count = self.ports.len();
        let offset = usize::from(tick.stamp().0) % count;
        for i in 0..count {
            let port = self.ports[(i + offset) % count];
            match self.surge(link.conductor_out(port), port, tick) {
                SurgeOutcome::Exchanged { .. } => report.exchanged += 1,
                SurgeOutcome::AlreadyExchanged => {
                    trace!(conductor = %self.id, port = %port, "Pair already exchanged this tick");
                    report.already_exchanged += 1;
                }
                outcome => {
                    trace!(
                        conductor = %self.id,
                        port = %port,
                        outcome = ?outcome,
                        "Port rejected, pending flow reset"
                    );
                    self.pending_flow[port.index()] = 0.0;
                    report.rejected += 1;
                }
            }
        }

        self.incoming.clear();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConductorConfig;
    use ohm_core::DeviceId;

    fn node(device: u64, slot: u16, ports: &[u16], voltage: f64) -> Conductor {
        let mut c = Conductor::new(
            ConductorId::new(DeviceId(device), slot),
            ports.iter().copied().map(PortId),
            ConductorConfig::default().with_capacitance(1.0),
        )
        .unwrap();
        c.set_voltage(voltage);
        c
    }

    /// Wiring for a single pass: port -> neighbor.
    struct Wires<'a> {
        tick: TickId,
        out: Vec<(PortId, Option<&'a mut Conductor>)>,
    }

    impl Connectable for Wires<'_> {
        fn tick(&self) -> TickId {
            self.tick
        }

        fn conductor(&mut self, _port: PortId) -> Option<&mut Conductor> {
            None
        }

        fn conductor_out(&mut self, port: PortId) -> Option<&mut Conductor> {
            self.out
                .iter_mut()
                .find(|(p, _)| *p == port)
                .and_then(|(_, c)| c.as_deref_mut())
        }
    }

    #[test]
    fn surge_moves_current_downhill() {
        let mut a = node(1, 0, &[0], 10.0);
        let mut b = node(2, 0, &[0], 0.0);
        let tick = TickId(1);
        let outcome = a.surge(Some(&mut b), PortId(0), tick);
        let SurgeOutcome::Exchanged { current } = outcome else {
            panic!("expected exchange, got {outcome:?}");
        };
        assert!(current > 0.0);
        assert_eq!(a.voltage_accum(), -current);
        assert_eq!(b.voltage_accum(), current);
        assert!(b.incoming.contains(tick.stamp(), a.id()));
        assert!(a.settle(TickId(2)) < 10.0);
        assert!(b.settle(TickId(2)) > 0.0);
    }

    #[test]
    fn surge_sends_pending_flow_from_before_the_step() {
        let mut a = node(1, 0, &[0], 10.0);
        let mut b = node(2, 0, &[0], 0.0);

        // Fresh port: no pending flow yet, only the parallel share moves.
        let first = a.surge(Some(&mut b), PortId(0), TickId(1));
        assert_eq!(first, SurgeOutcome::Exchanged { current: 4.5 });
        assert_eq!(a.pending_flow(PortId(0)), Some(0.5));

        // Next tick: V = 7.75 - 2.25 = 5.5, sent = 0.5 + 5.5·0.45.
        let second = a.surge(Some(&mut b), PortId(0), TickId(2));
        let SurgeOutcome::Exchanged { current } = second else {
            panic!("expected exchange, got {second:?}");
        };
        assert!((current - (0.5 + 5.5 * 0.45)).abs() < 1e-12);
        let lagged = 0.5 + 0.05 * (5.5 - 0.5 * 0.02);
        assert!((a.pending_flow(PortId(0)).unwrap() - lagged).abs() < 1e-12);
    }

    #[test]
    fn surge_without_neighbor_is_disconnected() {
        let mut a = node(1, 0, &[0], 10.0);
        assert_eq!(
            a.surge(None, PortId(0), TickId(1)),
            SurgeOutcome::Disconnected
        );
        assert_eq!(a.voltage_accum(), 0.0);
    }

    #[test]
    fn surge_into_same_device_rejected_without_mutation() {
        let mut a = node(1, 0, &[0], 10.0);
        let mut b = node(1, 1, &[0], 0.0);
        let outcome = a.surge(Some(&mut b), PortId(0), TickId(1));
        assert_eq!(outcome, SurgeOutcome::SameDevice);
        assert!(!outcome.is_accepted());
        assert_eq!(a.voltage_accum(), 0.0);
        assert_eq!(b.voltage_accum(), 0.0);
        assert_eq!(a.pending_flow(PortId(0)), Some(0.0));
        assert_eq!(b.incoming.len(), 0);
    }

    #[test]
    fn surge_on_undeclared_port() {
        let mut a = node(1, 0, &[0, 2], 10.0);
        let mut b = node(2, 0, &[0], 0.0);
        assert_eq!(
            a.surge(Some(&mut b), PortId(1), TickId(1)),
            SurgeOutcome::UnknownPort
        );
    }

    #[test]
    fn reverse_surge_in_same_tick_is_not_reapplied() {
        let mut a = node(1, 0, &[0], 10.0);
        let mut b = node(2, 0, &[0], 0.0);
        let tick = TickId(1);
        a.surge(Some(&mut b), PortId(0), tick);
        let (a_acc, b_acc) = (a.voltage_accum(), b.voltage_accum());

        let outcome = b.surge(Some(&mut a), PortId(0), tick);
        assert_eq!(outcome, SurgeOutcome::AlreadyExchanged);
        assert!(outcome.is_accepted());
        assert_eq!(a.voltage_accum(), a_acc);
        assert_eq!(b.voltage_accum(), b_acc);
    }

    #[test]
    fn stale_incoming_record_expires_next_tick() {
        let mut a = node(1, 0, &[0], 10.0);
        let mut b = node(2, 0, &[0], 0.0);
        a.surge(Some(&mut b), PortId(0), TickId(1));
        // b never ran its own pass in tick 1; the record must not leak.
        let outcome = b.surge(Some(&mut a), PortId(0), TickId(2));
        assert!(matches!(outcome, SurgeOutcome::Exchanged { .. }));
    }

    #[test]
    fn update_resets_disconnected_port() {
        let mut a = node(1, 0, &[0, 1], 10.0);
        let mut b = node(2, 0, &[0], 0.0);
        a.pending_flow[1] = 3.5;

        let report = {
            let mut wires = Wires {
                tick: TickId(1),
                out: vec![(PortId(0), Some(&mut b)), (PortId(1), None)],
            };
            a.update(&mut wires)
        };
        assert_eq!(report.exchanged, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(a.pending_flow(PortId(1)), Some(0.0));
        assert_ne!(a.pending_flow(PortId(0)), Some(0.0));
    }

    #[test]
    fn update_clears_incoming_record() {
        let mut a = node(1, 0, &[0], 10.0);
        let mut b = node(2, 0, &[0], 0.0);
        let tick = TickId(3);
        {
            let mut wires = Wires {
                tick,
                out: vec![(PortId(0), Some(&mut b))],
            };
            a.update(&mut wires);
        }
        let b_acc = b.voltage_accum();
        let report = {
            let mut wires = Wires {
                tick,
                out: vec![(PortId(0), Some(&mut a))],
            };
            b.update(&mut wires)
        };
        assert_eq!(report.already_exchanged, 1);
        assert_eq!(report.exchanged, 0);
        assert_eq!(b.voltage_accum(), b_acc);
        assert_eq!(b.incoming.len(), 0);
        // Short-circuited ports keep their pending flow.
        assert_eq!(b.pending_flow(PortId(0)), Some(0.0));
    }

    #[test]
    fn update_rotates_starting_port_with_tick() {
        struct Probe {
            tick: TickId,
            asked: Vec<PortId>,
        }

        impl Connectable for Probe {
            fn tick(&self) -> TickId {
                self.tick
            }

            fn conductor(&mut self, _port: PortId) -> Option<&mut Conductor> {
                None
            }

            fn conductor_out(&mut self, port: PortId) -> Option<&mut Conductor> {
                self.asked.push(port);
                None
            }
        }

        let mut a = node(1, 0, &[4, 0, 2], 1.0);
        let mut order = |tick: u64| {
            let mut probe = Probe {
                tick: TickId(tick),
                asked: Vec::new(),
            };
            let report = a.update(&mut probe);
            assert_eq!(report.rejected, 3);
            probe.asked
        };
        let p = |n: u16| PortId(n);
        assert_eq!(order(3), vec![p(0), p(2), p(4)]);
        assert_eq!(order(4), vec![p(2), p(4), p(0)]);
        assert_eq!(order(5), vec![p(4), p(0), p(2)]);
        // 65539 shares stamp 3.
        assert_eq!(order(65539), vec![p(0), p(2), p(4)]);
    }
}
