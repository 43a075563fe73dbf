use crate::adapters::{AnalyticEphemeris, HorizonsEphemeris, HttpTimezoneLookup, NominatimGeocoder};
use crate::config::toml_config::{EphemerisBackend, EphemerisConfig, TomlConfig};
use crate::core::engine::ProfileEngine;
use crate::domain::ports::EphemerisProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;

pub type DynEphemeris = Box<dyn EphemerisProvider>;

pub fn build_ephemeris(config: &EphemerisConfig) -> DynEphemeris {
    match config.backend {
        EphemerisBackend::Analytic => Box::new(AnalyticEphemeris::new()),
        EphemerisBackend::Horizons => Box::new(HorizonsEphemeris::new(
            config.endpoint.clone(),
            config.timeout_seconds,
        )),
    }
}

/// 依配置組裝引擎 (星曆、地理編碼、時區查詢、太陽弧搜尋參數)
pub fn build_engine(config: &TomlConfig) -> Result<ProfileEngine<DynEphemeris>> {
    config.validate()?;
    tracing::debug!("Building engine with {} ephemeris", config.ephemeris.backend);

    let location = &config.location;
    let geocoder = NominatimGeocoder::new(
        location.geocoder_endpoint.clone(),
        location.user_agent.clone(),
        location.timeout_seconds,
    );
    let tz_lookup =
        HttpTimezoneLookup::new(location.timezone_endpoint.clone(), location.timeout_seconds);

    ProfileEngine::new(build_ephemeris(&config.ephemeris))
        .with_location(geocoder, tz_lookup)
        .with_solar_arc(config.profile.solar_arc)
}
