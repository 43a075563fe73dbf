pub mod bodygraph;
pub mod design;
pub mod engine;
pub mod gates;
pub mod snapshot;
pub mod spheres;

pub use crate::domain::ports::{EphemerisProvider, Geocoder, Storage, TimezoneLookup};
pub use crate::utils::error::Result;
pub use engine::ProfileEngine;
pub use gates::{GateTable, STANDARD_GATE_TABLE};
