//! Birth place → coordinates → IANA zone → UTC instant.

use crate::domain::model::{BirthLocation, Coordinates};
use crate::domain::ports::{Geocoder, TimezoneLookup};
use crate::utils::error::{GeneGraphError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_GEOCODER_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_TIMEZONE_ENDPOINT: &str = "https://timeapi.io/api/TimeZone/coordinate";
pub const DEFAULT_USER_AGENT: &str = "GeneGraph/1.0";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 25;

/// Nominatim-compatible search endpoint (`q`, `format=json`, `limit=1`).
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
    user_agent: String,
    timeout_seconds: u64,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>, user_agent: impl Into<String>, timeout_seconds: u64) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
            timeout_seconds,
        }
    }
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new(DEFAULT_GEOCODER_ENDPOINT, DEFAULT_USER_AGENT, DEFAULT_TIMEOUT_SECONDS)
    }
}

// Nominatim 回傳字串型態的座標，其他相容服務可能回傳數字
fn coordinate_value(place: &serde_json::Value, key: &str) -> Result<f64> {
    match place.get(key) {
        Some(serde_json::Value::String(raw)) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| GeneGraphError::location(format!("geocoder returned invalid {} '{}'", key, raw))),
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| GeneGraphError::location(format!("geocoder returned invalid {}", key))),
        _ => Err(GeneGraphError::location(format!("geocoder result has no '{}'", key))),
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> Result<Coordinates> {
        tracing::debug!("🌍 Geocoding '{}' via {}", place, self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(std::time::Duration::from_secs(self.timeout_seconds))
            .send()
            .await
            .map_err(|e| GeneGraphError::location(format!("geocoding request failed: {}", e)))?;

        tracing::debug!("Geocoder response status: {}", response.status());
        if !response.status().is_success() {
            return Err(GeneGraphError::location(format!(
                "geocoder returned HTTP {}",
                response.status()
            )));
        }

        let places: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| GeneGraphError::location(format!("unreadable geocoder response: {}", e)))?;
        let first = places
            .first()
            .ok_or_else(|| GeneGraphError::location("Place not found"))?;

        let coordinates = Coordinates::new(coordinate_value(first, "lat")?, coordinate_value(first, "lon")?);
        tracing::debug!(
            "🌍 '{}' resolved to ({}, {})",
            place,
            coordinates.latitude,
            coordinates.longitude
        );
        Ok(coordinates)
    }
}

#[derive(Debug, Deserialize)]
struct TimezoneResponse {
    #[serde(rename = "timeZone")]
    time_zone: Option<String>,
}

/// HTTP lookup returning `{"timeZone": "<IANA name>"}` for `latitude`/`longitude`.
#[derive(Debug, Clone)]
pub struct HttpTimezoneLookup {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
}

impl HttpTimezoneLookup {
    pub fn new(endpoint: impl Into<String>, timeout_seconds: u64) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout_seconds,
        }
    }
}

impl Default for HttpTimezoneLookup {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE_ENDPOINT, DEFAULT_TIMEOUT_SECONDS)
    }
}

#[async_trait]
impl TimezoneLookup for HttpTimezoneLookup {
    async fn timezone_at(&self, coordinates: Coordinates) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
            ])
            .timeout(std::time::Duration::from_secs(self.timeout_seconds))
            .send()
            .await
            .map_err(|e| GeneGraphError::location(format!("timezone request failed: {}", e)))?;

        tracing::debug!("Timezone lookup response status: {}", response.status());
        if !response.status().is_success() {
            return Err(GeneGraphError::location(format!(
                "timezone service returned HTTP {}",
                response.status()
            )));
        }

        let body: TimezoneResponse = response
            .json()
            .await
            .map_err(|e| GeneGraphError::location(format!("unreadable timezone response: {}", e)))?;

        body.time_zone
            .map(|tz| tz.trim().to_string())
            .filter(|tz| !tz.is_empty())
            .ok_or_else(|| GeneGraphError::location("Timezone not found"))
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| GeneGraphError::location(format!("unknown timezone '{}'", name)))
}

fn prefer_dst(earliest: DateTime<Tz>, latest: DateTime<Tz>) -> DateTime<Tz> {
    if !earliest.offset().dst_offset().is_zero() {
        earliest
    } else if !latest.offset().dst_offset().is_zero() {
        latest
    } else {
        earliest
    }
}

/// Interpret a wall-clock time in `tz_name` and convert it to UTC.
///
/// Ambiguous times (clocks going back) resolve to the DST reading.
/// Nonexistent times (clocks going forward) move one hour later first.
pub fn localize(local: NaiveDateTime, tz_name: &str) -> Result<DateTime<Utc>> {
    let tz = parse_timezone(tz_name)?;

    let localized = match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, latest) => {
            tracing::debug!("⏰ {} is ambiguous in {}, using DST reading", local, tz_name);
            prefer_dst(earliest, latest)
        }
        LocalResult::None => {
            tracing::debug!("⏰ {} does not exist in {}, shifting one hour", local, tz_name);
            let shifted = local + Duration::hours(1);
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) => dt,
                LocalResult::Ambiguous(earliest, latest) => prefer_dst(earliest, latest),
                LocalResult::None => {
                    return Err(GeneGraphError::location(format!(
                        "local time {} cannot be represented in {}",
                        local, tz_name
                    )))
                }
            }
        }
    };

    Ok(localized.with_timezone(&Utc))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInstant {
    pub utc: DateTime<Utc>,
    pub timezone: String,
    pub coordinates: Option<Coordinates>,
}

/// Resolve the birth instant, calling out only for what the request lacks.
pub async fn resolve_birth_instant(
    local: NaiveDateTime,
    location: &BirthLocation,
    geocoder: &dyn Geocoder,
    tz_lookup: &dyn TimezoneLookup,
) -> Result<ResolvedInstant> {
    if let (Some(coordinates), Some(timezone)) = (location.coordinates, location.timezone.as_deref()) {
        tracing::debug!("📍 Using supplied coordinates and timezone, skipping lookups");
        return Ok(ResolvedInstant {
            utc: localize(local, timezone)?,
            timezone: timezone.to_string(),
            coordinates: Some(coordinates),
        });
    }

    let coordinates = match location.coordinates {
        Some(coordinates) => coordinates,
        None => {
            if location.place.trim().is_empty() {
                return Err(GeneGraphError::location(
                    "no birth place given and no coordinates supplied",
                ));
            }
            geocoder.geocode(&location.place).await?
        }
    };

    let timezone = match &location.timezone {
        Some(timezone) => timezone.clone(),
        None => tz_lookup.timezone_at(coordinates).await?,
    };

    Ok(ResolvedInstant {
        utc: localize(local, &timezone)?,
        timezone,
        coordinates: Some(coordinates),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    struct CountingGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for CountingGeocoder {
        async fn geocode(&self, _place: &str) -> Result<Coordinates> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Coordinates::new(25.033, 121.565))
        }
    }

    struct CountingTimezone {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TimezoneLookup for CountingTimezone {
        async fn timezone_at(&self, _coordinates: Coordinates) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("Asia/Taipei".to_string())
        }
    }

    fn counters() -> (CountingGeocoder, CountingTimezone) {
        (
            CountingGeocoder {
                calls: AtomicUsize::new(0),
            },
            CountingTimezone {
                calls: AtomicUsize::new(0),
            },
        )
    }

    #[test]
    fn test_localize_regular_time() {
        let instant = localize(local(1991, 7, 17, 21, 40), "Europe/Berlin").unwrap();
        assert_eq!(instant, utc(1991, 7, 17, 19, 40));
    }

    #[test]
    fn test_localize_ambiguous_time_prefers_dst() {
        // 2021-11-07 01:30 出現兩次，DST (EDT, UTC-4) 讀法較早
        let instant = localize(local(2021, 11, 7, 1, 30), "America/New_York").unwrap();
        assert_eq!(instant, utc(2021, 11, 7, 5, 30));
    }

    #[test]
    fn test_localize_nonexistent_time_shifts_forward() {
        // 2021-03-14 02:30 不存在，改用 03:30 EDT
        let instant = localize(local(2021, 3, 14, 2, 30), "America/New_York").unwrap();
        assert_eq!(instant, utc(2021, 3, 14, 7, 30));
    }

    #[test]
    fn test_localize_unknown_zone() {
        let err = localize(local(2000, 1, 1, 0, 0), "Mars/Olympus").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocationError);
    }

    #[tokio::test]
    async fn test_full_location_bypasses_lookups() {
        let (geocoder, tz) = counters();
        let location = BirthLocation {
            place: String::new(),
            coordinates: Some(Coordinates::new(52.52, 13.405)),
            timezone: Some("Europe/Berlin".to_string()),
        };

        let resolved = resolve_birth_instant(local(1991, 7, 17, 21, 40), &location, &geocoder, &tz)
            .await
            .unwrap();

        assert_eq!(resolved.utc, utc(1991, 7, 17, 19, 40));
        assert_eq!(resolved.timezone, "Europe/Berlin");
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(tz.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_place_only_uses_both_lookups() {
        let (geocoder, tz) = counters();
        let location = BirthLocation {
            place: "Taipei".to_string(),
            coordinates: None,
            timezone: None,
        };

        let resolved = resolve_birth_instant(local(1990, 1, 1, 8, 0), &location, &geocoder, &tz)
            .await
            .unwrap();

        assert_eq!(resolved.utc, utc(1990, 1, 1, 0, 0));
        assert_eq!(resolved.coordinates, Some(Coordinates::new(25.033, 121.565)));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(tz.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_supplied_timezone_skips_only_tz_lookup() {
        let (geocoder, tz) = counters();
        let location = BirthLocation {
            place: "Taipei".to_string(),
            coordinates: None,
            timezone: Some("Asia/Taipei".to_string()),
        };

        resolve_birth_instant(local(1990, 1, 1, 8, 0), &location, &geocoder, &tz)
            .await
            .unwrap();

        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(tz.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nominatim_geocoder_parses_string_coordinates() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search")
                    .query_param("q", "Taipei, Taiwan")
                    .query_param("format", "json")
                    .query_param("limit", "1")
                    .header("user-agent", "GeneGraph-test");
                then.status(200)
                    .json_body(json!([{"lat": "25.0375", "lon": "121.5637", "display_name": "Taipei"}]));
            })
            .await;

        let geocoder = NominatimGeocoder::new(server.url("/search"), "GeneGraph-test", 5);
        let coordinates = geocoder.geocode("Taipei, Taiwan").await.unwrap();

        mock.assert_async().await;
        assert_eq!(coordinates, Coordinates::new(25.0375, 121.5637));
    }

    #[tokio::test]
    async fn test_nominatim_empty_result_is_place_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200).json_body(json!([]));
            })
            .await;

        let geocoder = NominatimGeocoder::new(server.url("/search"), "GeneGraph-test", 5);
        let err = geocoder.geocode("Atlantis").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::LocationError);
        assert!(err.to_string().contains("Place not found"));
    }

    #[tokio::test]
    async fn test_nominatim_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(503);
            })
            .await;

        let geocoder = NominatimGeocoder::new(server.url("/search"), "GeneGraph-test", 5);
        let err = geocoder.geocode("Taipei").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocationError);
    }

    #[tokio::test]
    async fn test_http_timezone_lookup() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/coordinate")
                    .query_param("latitude", "52.52")
                    .query_param("longitude", "13.405");
                then.status(200)
                    .json_body(json!({"timeZone": "Europe/Berlin", "currentUtcOffset": {"seconds": 3600}}));
            })
            .await;

        let lookup = HttpTimezoneLookup::new(server.url("/coordinate"), 5);
        let tz = lookup.timezone_at(Coordinates::new(52.52, 13.405)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(tz, "Europe/Berlin");
    }

    #[tokio::test]
    async fn test_http_timezone_lookup_without_zone() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/coordinate");
                then.status(200).json_body(json!({"timeZone": null}));
            })
            .await;

        let lookup = HttpTimezoneLookup::new(server.url("/coordinate"), 5);
        let err = lookup.timezone_at(Coordinates::new(0.0, -160.0)).await.unwrap_err();
        assert!(err.to_string().contains("Timezone not found"));
    }
}
