//! JPL Horizons observer-table client (geocentric, quantity 31, CSV).

use crate::adapters::analytic::julian_day_utc;
use crate::domain::model::Body;
use crate::domain::ports::EphemerisProvider;
use crate::utils::error::{GeneGraphError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;

pub const DEFAULT_HORIZONS_ENDPOINT: &str = "https://ssd.jpl.nasa.gov/api/horizons.api";
pub const DEFAULT_HORIZONS_TIMEOUT_SECONDS: u64 = 30;

const START_OF_EPHEMERIS: &str = "$$SOE";
const END_OF_EPHEMERIS: &str = "$$EOE";

/// Horizons target id. Outer planets use their system barycenters.
pub fn horizons_command(body: Body) -> Option<&'static str> {
    match body {
        Body::Sun => Some("10"),
        Body::Moon => Some("301"),
        Body::Mercury => Some("199"),
        Body::Venus => Some("299"),
        Body::Mars => Some("499"),
        Body::Jupiter => Some("5"),
        Body::Saturn => Some("6"),
        Body::Uranus => Some("7"),
        Body::Neptune => Some("8"),
        Body::Pluto => Some("9"),
        Body::Earth => None,
    }
}

/// Pull the ecliptic longitude out of the first row between `$$SOE` and `$$EOE`.
///
/// Rows look like `1992-Oct-13 00:00, , , 199.9090123, -0.0001234,`; the
/// longitude is the second-to-last non-empty field.
pub fn parse_observer_longitude(text: &str) -> Result<f64> {
    let start = text.find(START_OF_EPHEMERIS).ok_or_else(|| {
        GeneGraphError::ephemeris("Horizons response has no $$SOE marker")
    })?;
    let body = &text[start + START_OF_EPHEMERIS.len()..];
    let end = body
        .find(END_OF_EPHEMERIS)
        .ok_or_else(|| GeneGraphError::ephemeris("Horizons response has no $$EOE marker"))?;

    let row = body[..end]
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| GeneGraphError::ephemeris("Horizons returned an empty ephemeris"))?;

    let fields: Vec<&str> = row
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .collect();
    if fields.len() < 2 {
        return Err(GeneGraphError::ephemeris(format!(
            "unexpected Horizons row '{}'",
            row
        )));
    }

    let raw = fields[fields.len() - 2];
    let longitude: f64 = raw.parse().map_err(|_| {
        GeneGraphError::ephemeris(format!("invalid longitude '{}' in Horizons row", raw))
    })?;
    Ok(longitude.rem_euclid(360.0))
}

#[derive(Debug, Clone)]
pub struct HorizonsEphemeris {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
}

impl HorizonsEphemeris {
    pub fn new(endpoint: impl Into<String>, timeout_seconds: u64) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout_seconds,
        }
    }

    async fn query(&self, instant: DateTime<Utc>, command: &str) -> Result<f64> {
        let jd = format!("{:.8}", julian_day_utc(instant));
        let params = [
            ("format", "text"),
            ("COMMAND", command),
            ("OBJ_DATA", "NO"),
            ("MAKE_EPHEM", "YES"),
            ("EPHEM_TYPE", "OBSERVER"),
            ("CENTER", "500@399"),
            ("TLIST", jd.as_str()),
            ("TLIST_TYPE", "JD"),
            ("QUANTITIES", "31"),
            ("CSV_FORMAT", "YES"),
        ];

        tracing::debug!("🔭 Horizons request: COMMAND={} TLIST={}", command, jd);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .timeout(std::time::Duration::from_secs(self.timeout_seconds))
            .send()
            .await
            .map_err(|e| GeneGraphError::ephemeris(format!("Horizons request failed: {}", e)))?;

        tracing::debug!("Horizons response status: {}", response.status());
        if !response.status().is_success() {
            return Err(GeneGraphError::ephemeris(format!(
                "Horizons returned HTTP {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| GeneGraphError::ephemeris(format!("unreadable Horizons response: {}", e)))?;
        parse_observer_longitude(&text)
    }
}

impl Default for HorizonsEphemeris {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZONS_ENDPOINT, DEFAULT_HORIZONS_TIMEOUT_SECONDS)
    }
}

#[async_trait]
impl EphemerisProvider for HorizonsEphemeris {
    async fn longitude(&self, instant: DateTime<Utc>, body: Body) -> Result<f64> {
        match horizons_command(body) {
            Some(command) => self.query(instant, command).await,
            None => {
                let sun = self.query(instant, "10").await?;
                Ok((sun + 180.0).rem_euclid(360.0))
            }
        }
    }

    fn name(&self) -> &str {
        "horizons"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;
    use chrono::TimeZone;
    use httpmock::prelude::*;

    const SAMPLE: &str = "\
*******************************************************************************
 Date__(UT)__HR:MN, , , ObsEcLon, ObsEcLat,
*******************************************************************************
$$SOE
 1992-Oct-13 00:00, , , 199.9089921, -0.0001755,
$$EOE
*******************************************************************************
";

    #[test]
    fn test_parse_observer_longitude() {
        let lon = parse_observer_longitude(SAMPLE).unwrap();
        assert!((lon - 199.908_992_1).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rejects_missing_markers() {
        let err = parse_observer_longitude("No ephemeris for target").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EphemerisError);

        let err = parse_observer_longitude("$$SOE\n$$EOE\n").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_parse_rejects_garbage_longitude() {
        let err = parse_observer_longitude("$$SOE\n 2000-Jan-01 00:00, , , n.a., 1.0,\n$$EOE").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EphemerisError);
    }

    #[test]
    fn test_outer_planets_use_barycenters() {
        assert_eq!(horizons_command(Body::Jupiter), Some("5"));
        assert_eq!(horizons_command(Body::Pluto), Some("9"));
        assert_eq!(horizons_command(Body::Earth), None);
    }

    #[tokio::test]
    async fn test_horizons_query_parameters() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/horizons.api")
                    .query_param("COMMAND", "499")
                    .query_param("CENTER", "500@399")
                    .query_param("QUANTITIES", "31")
                    .query_param("CSV_FORMAT", "YES")
                    .query_param("TLIST", "2451545.00000000");
                then.status(200).body(SAMPLE);
            })
            .await;

        let horizons = HorizonsEphemeris::new(server.url("/api/horizons.api"), 5);
        let noon = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        let lon = horizons.longitude(noon, Body::Mars).await.unwrap();

        mock.assert_async().await;
        assert!((lon - 199.908_992_1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_horizons_earth_is_derived_from_sun() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).query_param("COMMAND", "10");
                then.status(200).body(SAMPLE);
            })
            .await;

        let horizons = HorizonsEphemeris::new(server.base_url(), 5);
        let instant = Utc.with_ymd_and_hms(1992, 10, 13, 0, 0, 0).unwrap();
        let earth = horizons.longitude(instant, Body::Earth).await.unwrap();

        mock.assert_async().await;
        assert!((earth - 19.908_992_1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_horizons_http_failure_is_ephemeris_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(500).body("internal error");
            })
            .await;

        let horizons = HorizonsEphemeris::new(server.base_url(), 5);
        let instant = Utc.with_ymd_and_hms(1992, 10, 13, 0, 0, 0).unwrap();
        let err = horizons.longitude(instant, Body::Sun).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EphemerisError);
    }
}
