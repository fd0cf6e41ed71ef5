//! Test host and wiring helpers for Ohm development.
//!
//! [`Circuit`] owns devices and their conductors, wires ports together
//! and drives update passes in a stable or seeded-shuffled order.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod circuit;
pub mod fixtures;

pub use circuit::{Circuit, DeviceLink};
