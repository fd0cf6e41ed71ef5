//! Benchmark profiles for the Ohm power-flow simulation.
//!
//! - [`ring_profile`]: `n` single-device conductors in a closed loop
//! - [`ladder_profile`]: two parallel rails joined by rungs, three
//!   ports per node
//!
//! Starting voltages are drawn from a seeded RNG so runs are
//! reproducible.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use ohm_conductor::ConductorConfig;
use ohm_core::{ConductorId, DeviceId, PortId};
use ohm_test_utils::Circuit;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Port facing the previous node on a rail.
pub const PREV: PortId = PortId(0);
/// Port facing the next node on a rail.
pub const NEXT: PortId = PortId(1);
/// Port crossing to the other rail.
pub const RUNG: PortId = PortId(2);

/// Build a ring of `n` conductors with voltages in `[0, 100)`.
pub fn ring_profile(n: usize, seed: u64) -> (Circuit, Vec<ConductorId>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut circuit = Circuit::new();
    let ids: Vec<_> = (0..n as u64)
        .map(|d| add(&mut circuit, d, &[PREV, NEXT], rng.random_range(0.0..100.0)))
        .collect();
    for i in 0..n {
        let next = ids[(i + 1) % n];
        if next != ids[i] {
            circuit.link(ids[i], NEXT, next, PREV);
        }
    }
    (circuit, ids)
}

/// Build a ladder of `2 × rungs` conductors with voltages in `[0, 100)`.
///
/// Node `i` of the left rail is device `2i`, its right-rail partner is
/// device `2i + 1`.
pub fn ladder_profile(rungs: usize, seed: u64) -> (Circuit, Vec<ConductorId>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut circuit = Circuit::new();
    let mut left = Vec::with_capacity(rungs);
    let mut right = Vec::with_capacity(rungs);
    for i in 0..rungs as u64 {
        let l = add(&mut circuit, 2 * i, &[PREV, NEXT, RUNG], rng.random_range(0.0..100.0));
        let r = add(&mut circuit, 2 * i + 1, &[PREV, NEXT, RUNG], rng.random_range(0.0..100.0));
        circuit.link(l, RUNG, r, RUNG);
        left.push(l);
        right.push(r);
    }
    for rail in [&left, &right] {
        for w in rail.windows(2) {
            circuit.link(w[0], NEXT, w[1], PREV);
        }
    }
    let ids = circuit.ids();
    (circuit, ids)
}

fn add(circuit: &mut Circuit, device: u64, ports: &[PortId], voltage: f64) -> ConductorId {
    let config = ConductorConfig::default().with_capacitance(1.0);
    let id = circuit
        .add_conductor(DeviceId(device), ports.iter().copied(), config)
        .expect("profile config is valid");
    if let Some(c) = circuit.conductor_mut(id) {
        c.set_voltage(voltage);
    }
    id
}
