//! Canned topologies for tests and benchmarks.

use ohm_conductor::ConductorConfig;
use ohm_core::{ConductorId, DeviceId, PortId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::Circuit;

/// Deterministic RNG for shuffled visitation orders.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Default config with unit capacitance, so current moves voltage.
pub fn unit_config() -> ConductorConfig {
    ConductorConfig::default().with_capacitance(1.0)
}

/// Two single-port conductors on separate devices wired to each other
/// through port 0, seeded at `va` and `vb`.
pub fn pair(va: f64, vb: f64) -> (Circuit, ConductorId, ConductorId) {
    let mut circuit = Circuit::new();
    let a = add(&mut circuit, 0, &[0], va);
    let b = add(&mut circuit, 1, &[0], vb);
    circuit.link(a, PortId(0), b, PortId(0));
    (circuit, a, b)
}

/// `n` conductors in a line, one device each. Port 0 faces the
/// previous node and port 1 the next. The first node is seeded at
/// `head`, the rest at zero.
pub fn chain(n: usize, head: f64) -> (Circuit, Vec<ConductorId>) {
    let mut circuit = Circuit::new();
    let ids: Vec<_> = (0..n)
        .map(|i| add(&mut circuit, i as u64, &[0, 1], if i == 0 { head } else { 0.0 }))
        .collect();
    for w in ids.windows(2) {
        circuit.link(w[0], PortId(1), w[1], PortId(0));
    }
    (circuit, ids)
}

/// `n` conductors in a ring, wired like [`chain`] plus a closing link.
pub fn ring(n: usize, head: f64) -> (Circuit, Vec<ConductorId>) {
    let (mut circuit, ids) = chain(n, head);
    if let (Some(&first), Some(&last)) = (ids.first(), ids.last()) {
        if n > 1 {
            circuit.link(last, PortId(1), first, PortId(0));
        }
    }
    (circuit, ids)
}

fn add(circuit: &mut Circuit, device: u64, ports: &[u16], voltage: f64) -> ConductorId {
    let id = circuit
        .add_conductor(DeviceId(device), ports.iter().copied().map(PortId), unit_config())
        .expect("fixture config is valid");
    if let Some(c) = circuit.conductor_mut(id) {
        c.set_voltage(voltage);
    }
    id
}
