// Adapters layer: concrete implementations of the domain ports (ephemeris,
// location lookups, storage).

pub mod analytic;
pub mod horizons;
pub mod location;
pub mod storage;

pub use analytic::AnalyticEphemeris;
pub use horizons::HorizonsEphemeris;
pub use location::{HttpTimezoneLookup, NominatimGeocoder};
pub use storage::LocalStorage;
