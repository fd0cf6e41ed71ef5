//! Core types for the Ohm power-flow simulation.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers shared by conductors and their hosts, the tick
//! counter and its 16-bit settle window, and the error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;

pub use error::{ConductorError, ConfigError, StateError};
pub use id::{ConductorId, DeviceId, PortId, TickId, TickStamp};
