use crate::core::gates::GateTable;
use crate::domain::model::{Body, BodyPosition, Snapshot, QUERIED_BODIES, TRACKED_BODIES};
use crate::domain::ports::EphemerisProvider;
use crate::utils::error::{GeneGraphError, Result};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Earth is never queried; it always sits opposite the sun.
pub fn earth_longitude(sun: f64) -> f64 {
    (sun + 180.0).rem_euclid(360.0)
}

/// Classify one longitude into a stored position (rounded to 6 decimals).
pub fn position_for(table: &GateTable<'_>, longitude: f64) -> Result<BodyPosition> {
    let activation = table.classify(longitude)?;
    Ok(BodyPosition {
        longitude: round6(activation.longitude),
        sign: activation.sign,
        degree_in_sign: round6(activation.degree_in_sign),
        gate: activation.gate,
        line: activation.line,
    })
}

/// Query every body at `instant` and classify all of them.
///
/// The ten provider lookups run concurrently; the first failure aborts the
/// whole snapshot.
pub async fn take_snapshot<P: EphemerisProvider + ?Sized>(
    provider: &P,
    table: &GateTable<'_>,
    instant: DateTime<Utc>,
) -> Result<Snapshot> {
    let lookups = QUERIED_BODIES
        .iter()
        .map(|&body| async move { provider.longitude(instant, body).await });
    let longitudes = try_join_all(lookups).await?;

    let sun = longitudes[Body::Sun.index()];
    let mut positions = Vec::with_capacity(TRACKED_BODIES.len());
    for body in TRACKED_BODIES {
        let longitude = if body.is_synthetic() {
            earth_longitude(sun)
        } else {
            longitudes[body.index()]
        };
        positions.push(position_for(table, longitude)?);
    }

    let positions: [BodyPosition; 11] = positions.try_into().map_err(|_| {
        GeneGraphError::ClassificationInvariantViolation {
            message: "snapshot did not produce one position per tracked body".to_string(),
        }
    })?;

    tracing::debug!(
        %instant,
        provider = provider.name(),
        sun_gate = positions[Body::Sun.index()].gate,
        "snapshot classified"
    );
    Ok(Snapshot::from_tracked(positions))
}
