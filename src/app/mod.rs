// Application layer: wiring configuration to the engine and writing results.

pub mod export;
pub mod factory;
pub mod summary;

#[cfg(test)]
pub(crate) mod testing;

pub use export::ProfileExporter;
pub use factory::{build_engine, build_ephemeris, DynEphemeris};
pub use summary::render_summary;
