use crate::adapters::location::{resolve_birth_instant, HttpTimezoneLookup, NominatimGeocoder};
use crate::core::bodygraph::classify_bodygraph;
use crate::core::design::{resolve_design_instant, SolarArcConfig};
use crate::core::gates::{GateTable, STANDARD_GATE_TABLE};
use crate::core::snapshot::take_snapshot;
use crate::core::spheres::build_spheres_from;
use crate::domain::model::{
    BirthRequest, BodySnapshots, GeocodeInfo, Overlay, Profile, ProfileMeta, UtcInstants,
};
use crate::domain::ports::{EphemerisProvider, Geocoder, TimezoneLookup};
use crate::utils::error::Result;
use crate::utils::validation::Validate;

/// Birth request in, complete profile out.
pub struct ProfileEngine<E: EphemerisProvider> {
    ephemeris: E,
    geocoder: Box<dyn Geocoder>,
    tz_lookup: Box<dyn TimezoneLookup>,
    table: GateTable<'static>,
    solar_arc: SolarArcConfig,
}

impl<E: EphemerisProvider> ProfileEngine<E> {
    pub fn new(ephemeris: E) -> Self {
        Self {
            ephemeris,
            geocoder: Box::new(NominatimGeocoder::default()),
            tz_lookup: Box::new(HttpTimezoneLookup::default()),
            table: STANDARD_GATE_TABLE,
            solar_arc: SolarArcConfig::default(),
        }
    }

    pub fn with_location<G, T>(mut self, geocoder: G, tz_lookup: T) -> Self
    where
        G: Geocoder + 'static,
        T: TimezoneLookup + 'static,
    {
        self.geocoder = Box::new(geocoder);
        self.tz_lookup = Box::new(tz_lookup);
        self
    }

    pub fn with_solar_arc(mut self, solar_arc: SolarArcConfig) -> Result<Self> {
        solar_arc.validate()?;
        self.solar_arc = solar_arc;
        Ok(self)
    }

    /// Swap the gate table; rejected unless it tiles the circle.
    pub fn with_gate_table(mut self, table: GateTable<'static>) -> Result<Self> {
        table.validate()?;
        self.table = table;
        Ok(self)
    }

    pub fn ephemeris(&self) -> &E {
        &self.ephemeris
    }

    pub async fn compute(&self, request: BirthRequest) -> Result<Profile> {
        let request = request.normalized();
        request.validate()?;
        tracing::info!("🚀 Computing profile for '{}'", request.name);

        let local = request.local_datetime()?;
        let resolved = resolve_birth_instant(
            local,
            &request.location(),
            self.geocoder.as_ref(),
            self.tz_lookup.as_ref(),
        )
        .await?;
        tracing::info!(
            "📍 Birth instant {} ({} local, {})",
            resolved.utc.to_rfc3339(),
            local,
            resolved.timezone
        );

        let design = resolve_design_instant(
            &self.ephemeris,
            resolved.utc,
            request.design_mode,
            &self.solar_arc,
        )
        .await?;
        tracing::info!(
            "🕰️ Design instant {} (mode: {})",
            design.to_rfc3339(),
            request.design_mode
        );

        let natal = take_snapshot(&self.ephemeris, &self.table, resolved.utc).await?;
        let design_snapshot = take_snapshot(&self.ephemeris, &self.table, design).await?;
        tracing::info!(
            "🪐 Classified {} bodies per snapshot via {}",
            natal.iter().count(),
            self.ephemeris.name()
        );

        let bodies = BodySnapshots {
            natal,
            design: design_snapshot,
        };
        let gene_keys = build_spheres_from(&bodies);
        let human_design = request
            .include_bodygraph
            .then(|| classify_bodygraph(&bodies.natal, &bodies.design));

        if let Some(lifes_work) = gene_keys.sphere(Overlay::Activation, "LifesWork") {
            tracing::info!("✅ Profile ready: Life's Work {}", lifes_work.code());
        }
        if let Some(report) = &human_design {
            tracing::info!(
                "✅ Bodygraph: {} / {} authority, {} channels",
                report.hd_type,
                report.authority,
                report.channels.len()
            );
        }

        Ok(Profile {
            meta: ProfileMeta {
                geocode: GeocodeInfo {
                    lat: resolved.coordinates.map(|c| c.latitude),
                    lon: resolved.coordinates.map(|c| c.longitude),
                    timezone: resolved.timezone,
                },
                utc: UtcInstants {
                    birth: resolved.utc,
                    design,
                },
                ephemeris: self.ephemeris.name().to_string(),
                input: request,
            },
            bodies,
            gene_keys,
            human_design,
        })
    }
}
