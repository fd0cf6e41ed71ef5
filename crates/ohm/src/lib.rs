//! Ohm: decentralized per-tick power flow for block-based worlds.
//!
//! This is the facade crate that re-exports the public API of the Ohm
//! sub-crates. Each device owns one or more conductors and calls
//! [`Conductor::update`](conductor::Conductor::update) once per tick,
//! handing it a [`Connectable`](conductor::Connectable) view of its
//! wiring. Repeated ticks relax the network toward equal voltage.
//!
//! # Quick start
//!
//! ```rust
//! use ohm::prelude::*;
//!
//! /// Two devices wired back to back through port 0.
//! struct Wire<'a> {
//!     tick: TickId,
//!     other: &'a mut Conductor,
//! }
//!
//! impl Connectable for Wire<'_> {
//!     fn tick(&self) -> TickId { self.tick }
//!     fn conductor(&mut self, _port: PortId) -> Option<&mut Conductor> { None }
//!     fn conductor_out(&mut self, port: PortId) -> Option<&mut Conductor> {
//!         (port == PortId(0)).then_some(&mut *self.other)
//!     }
//! }
//!
//! let config = ConductorConfig::default().with_capacitance(1.0);
//! let mut a = Conductor::new(DeviceId(1).into(), [PortId(0)], config).unwrap();
//! let mut b = Conductor::new(DeviceId(2).into(), [PortId(0)], config).unwrap();
//! a.set_voltage(10.0);
//!
//! for t in 1..=200 {
//!     let tick = TickId(t);
//!     a.update(&mut Wire { tick, other: &mut b });
//!     b.update(&mut Wire { tick, other: &mut a });
//! }
//! assert!((a.settled_voltage() - 5.0).abs() < 1e-6);
//! assert!((b.settled_voltage() - 5.0).abs() < 1e-6);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ohm-core` | Ids, tick and stamp, error enums |
//! | [`conductor`] | `ohm-conductor` | Conductor, surge, extensions, persisted state |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Ids, the host tick and error types (`ohm-core`).
pub use ohm_core as types;

/// Conductor nodes and the relaxation pass (`ohm-conductor`).
pub use ohm_conductor as conductor;

/// Common imports for hosts.
///
/// ```rust
/// use ohm::prelude::*;
/// ```
pub mod prelude {
    pub use ohm_conductor::{
        Conductor, ConductorConfig, ConductorState, Connectable, Extension, FlowSnapshot,
        FlowState, NodeState, PoweredNode, SurgeOutcome, UpdateReport,
    };
    pub use ohm_core::{
        ConductorError, ConductorId, ConfigError, DeviceId, PortId, StateError, TickId,
        TickStamp,
    };
}
