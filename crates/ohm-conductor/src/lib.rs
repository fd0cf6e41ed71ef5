//! Conductor nodes and per-tick current relaxation for Ohm simulations.
//!
//! A [`Conductor`] is one electrical node owned by a device. Once per
//! host tick the device calls [`Conductor::update`], which settles the
//! node's voltage and exchanges current with every neighbor reachable
//! through the device's [`Connectable`] capability. There is no global
//! solver: each pair of nodes relaxes toward a common voltage through a
//! first-order lag, and repeated ticks converge the graph.
//!
//! Derived per-tick state such as [`FlowState`] attaches through the
//! [`Extension`] pipeline of a [`PoweredNode`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod conductor;
pub mod config;
pub mod flow;
pub mod link;
pub mod node;
pub mod state;
pub mod surge;

pub use conductor::Conductor;
pub use config::ConductorConfig;
pub use flow::FlowState;
pub use link::Connectable;
pub use node::{Extension, PoweredNode};
pub use state::{ConductorState, FlowSnapshot, NodeState};
pub use surge::{SurgeOutcome, UpdateReport};

pub use ohm_core::{
    ConductorError, ConductorId, ConfigError, DeviceId, PortId, StateError, TickId, TickStamp,
};
