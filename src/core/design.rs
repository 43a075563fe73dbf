//! Design instant: the earlier reference moment derived from the natal one.
//!
//! Either a flat 88-day offset, or the instant at which the sun stood 88° of
//! ecliptic longitude behind its natal position (bisection over a ±150 day
//! window, same bracket-and-halve approach as a conjunction search).

use crate::domain::model::{Body, DesignMode};
use crate::domain::ports::EphemerisProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DESIGN_OFFSET_DAYS: i64 = 88;
/// Target sun displacement, degrees (negative = earlier).
pub const DESIGN_SOLAR_ARC_DEG: f64 = -88.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolarArcConfig {
    /// Half-width of the search window around the natal instant.
    pub window_days: i64,
    pub iterations: usize,
    /// Stop early once |error| drops below this many degrees.
    pub tolerance_deg: Option<f64>,
}

impl Default for SolarArcConfig {
    fn default() -> Self {
        Self {
            window_days: 150,
            iterations: 50,
            tolerance_deg: None,
        }
    }
}

impl Validate for SolarArcConfig {
    fn validate(&self) -> Result<()> {
        // 視窗必須涵蓋 88° 的退行，但不能讓太陽走超過半圈
        validate_range("profile.solar_arc.window_days", self.window_days, 92, 175)?;
        validate_positive_number("profile.solar_arc.iterations", self.iterations, 1)?;
        validate_range("profile.solar_arc.iterations", self.iterations, 1, 200)?;
        if let Some(tolerance) = self.tolerance_deg {
            validate_range("profile.solar_arc.tolerance_deg", tolerance, 1e-12, 1.0)?;
        }
        Ok(())
    }
}

/// Shortest signed arc from `from` to `to`, in [-180, 180).
pub fn signed_arc(from_deg: f64, to_deg: f64) -> f64 {
    (to_deg - from_deg + 540.0).rem_euclid(360.0) - 180.0
}

pub fn design_from_offset(natal: DateTime<Utc>) -> DateTime<Utc> {
    natal - Duration::days(DESIGN_OFFSET_DAYS)
}

/// Bisect for the instant where the sun has regressed 88° from natal.
pub async fn design_from_solar_arc<P: EphemerisProvider + ?Sized>(
    provider: &P,
    natal: DateTime<Utc>,
    config: &SolarArcConfig,
) -> Result<DateTime<Utc>> {
    config.validate()?;

    let sun0 = provider.longitude(natal, Body::Sun).await?;
    let window = Duration::days(config.window_days);
    let mut lo = natal - window;
    let mut hi = natal + window;

    for iteration in 0..config.iterations {
        let mid = lo + (hi - lo) / 2;
        let sun = provider.longitude(mid, Body::Sun).await?;
        let error = signed_arc(sun0, sun) - DESIGN_SOLAR_ARC_DEG;

        if let Some(tolerance) = config.tolerance_deg {
            if error.abs() < tolerance {
                tracing::debug!(iteration, error, "solar arc converged early");
                return Ok(mid);
            }
        }

        // error 隨時間遞增：為正代表 mid 太晚
        if error > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    Ok(lo)
}

pub async fn resolve_design_instant<P: EphemerisProvider + ?Sized>(
    provider: &P,
    natal: DateTime<Utc>,
    mode: DesignMode,
    config: &SolarArcConfig,
) -> Result<DateTime<Utc>> {
    let design = match mode {
        DesignMode::FixedOffset => design_from_offset(natal),
        DesignMode::SolarArc => design_from_solar_arc(provider, natal, config).await?,
    };
    tracing::debug!(%natal, %design, mode = mode.name(), "design instant resolved");
    Ok(design)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::{ErrorKind, GeneGraphError};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sun moving at a constant rate; every other body fails.
    struct LinearSun {
        base_deg: f64,
        deg_per_day: f64,
        calls: AtomicUsize,
    }

    impl LinearSun {
        fn new(base_deg: f64, deg_per_day: f64) -> Self {
            Self {
                base_deg,
                deg_per_day,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EphemerisProvider for LinearSun {
        async fn longitude(&self, instant: DateTime<Utc>, body: Body) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if body != Body::Sun {
                return Err(GeneGraphError::ephemeris(format!("unsupported body {}", body)));
            }
            let days = instant.timestamp() as f64 / 86_400.0
                + instant.timestamp_subsec_nanos() as f64 / 86_400e9;
            Ok((self.base_deg + self.deg_per_day * days).rem_euclid(360.0))
        }

        fn name(&self) -> &str {
            "linear-sun"
        }
    }

    struct Failing;

    #[async_trait]
    impl EphemerisProvider for Failing {
        async fn longitude(&self, _instant: DateTime<Utc>, _body: Body) -> Result<f64> {
            Err(GeneGraphError::ephemeris("provider offline"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn natal() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1991, 7, 17, 19, 40, 0).unwrap()
    }

    #[test]
    fn test_signed_arc_wraps() {
        assert_eq!(signed_arc(10.0, 20.0), 10.0);
        assert_eq!(signed_arc(350.0, 10.0), 20.0);
        assert_eq!(signed_arc(10.0, 350.0), -20.0);
        assert_eq!(signed_arc(0.0, 180.0), -180.0);
    }

    #[test]
    fn test_fixed_offset_is_exactly_88_days() {
        let design = design_from_offset(natal());
        assert_eq!(design, Utc.with_ymd_and_hms(1991, 4, 20, 19, 40, 0).unwrap());
        assert_eq!((natal() - design).num_seconds(), 88 * 86_400);
    }

    #[tokio::test]
    async fn test_fixed_offset_never_queries_provider() {
        let design = resolve_design_instant(
            &Failing,
            natal(),
            DesignMode::FixedOffset,
            &SolarArcConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(design, design_from_offset(natal()));
    }

    #[tokio::test]
    async fn test_solar_arc_hits_minus_88_degrees() {
        let provider = LinearSun::new(117.0, 0.985_647);
        let design = resolve_design_instant(
            &provider,
            natal(),
            DesignMode::SolarArc,
            &SolarArcConfig::default(),
        )
        .await
        .unwrap();

        let sun0 = provider.longitude(natal(), Body::Sun).await.unwrap();
        let sun = provider.longitude(design, Body::Sun).await.unwrap();
        assert!((signed_arc(sun0, sun) + 88.0).abs() < 1e-4);

        let expected_days = 88.0 / 0.985_647;
        let actual_days = (natal() - design).num_seconds() as f64 / 86_400.0;
        assert!((actual_days - expected_days).abs() < 1.0 / 86_400.0 * 2.0);
    }

    #[tokio::test]
    async fn test_solar_arc_handles_aries_wraparound() {
        // 出生時太陽在 Aries 初期，回推 88° 會跨過 0°
        let base = 10.0 - 0.985_647 * (natal().timestamp() as f64 / 86_400.0);
        let provider = LinearSun::new(base, 0.985_647);
        let design = design_from_solar_arc(&provider, natal(), &SolarArcConfig::default())
            .await
            .unwrap();

        let sun = provider.longitude(design, Body::Sun).await.unwrap();
        assert!((sun - 282.0).abs() < 1e-4, "sun at {}", sun);
    }

    #[tokio::test]
    async fn test_solar_arc_uses_fixed_iteration_count() {
        let provider = LinearSun::new(0.0, 1.0);
        design_from_solar_arc(&provider, natal(), &SolarArcConfig::default())
            .await
            .unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1 + 50);
    }

    #[tokio::test]
    async fn test_solar_arc_tolerance_stops_early() {
        let provider = LinearSun::new(0.0, 1.0);
        let config = SolarArcConfig {
            tolerance_deg: Some(1e-3),
            ..SolarArcConfig::default()
        };
        let design = design_from_solar_arc(&provider, natal(), &config).await.unwrap();

        assert!(provider.calls.load(Ordering::SeqCst) < 1 + 50);
        let days = (natal() - design).num_seconds() as f64 / 86_400.0;
        assert!((days - 88.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_solar_arc_propagates_provider_failure() {
        let err = design_from_solar_arc(&Failing, natal(), &SolarArcConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EphemerisError);
    }

    #[tokio::test]
    async fn test_solar_arc_rejects_invalid_window() {
        let provider = LinearSun::new(0.0, 1.0);
        let config = SolarArcConfig {
            window_days: 30,
            ..SolarArcConfig::default()
        };
        let err = design_from_solar_arc(&provider, natal(), &config)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
