//! Offline apparent geocentric longitudes, good to a few hundredths of a
//! degree between 1800 and 2050.
//!
//! Sun: Meeus, *Astronomical Algorithms* 2nd ed., ch. 25 (low accuracy).
//! Moon: Meeus ch. 47, largest terms of Table 47.A.
//! Planets: JPL "Keplerian Elements for Approximate Positions of the Major
//! Planets" (Standish), Table 1, with one light-time pass, annual
//! aberration, precession to the equinox of date and nutation.

use crate::domain::model::Body;
use crate::domain::ports::EphemerisProvider;
use crate::utils::error::{GeneGraphError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};

const J2000_JD: f64 = 2_451_545.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_PER_CENTURY: f64 = 36_525.0;
/// TT − UTC, fixed at the current leap-second count.
const TT_MINUS_UTC_SECONDS: f64 = 69.184;
const LIGHT_TIME_DAYS_PER_AU: f64 = 0.005_775_518_3;
const ABERRATION_CONSTANT_DEG: f64 = 20.495_52 / 3600.0;
const KEPLER_TOLERANCE: f64 = 1e-12;
const KEPLER_MAX_ITERATIONS: usize = 30;

pub const MIN_YEAR: i32 = 1800;
pub const MAX_YEAR: i32 = 2050;

fn normalize_deg(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

fn normalize_pm180(deg: f64) -> f64 {
    let r = normalize_deg(deg);
    if r >= 180.0 {
        r - 360.0
    } else {
        r
    }
}

pub fn julian_day_utc(instant: DateTime<Utc>) -> f64 {
    instant.timestamp() as f64 / SECONDS_PER_DAY
        + f64::from(instant.timestamp_subsec_nanos()) / (SECONDS_PER_DAY * 1e9)
        + UNIX_EPOCH_JD
}

/// Julian centuries of TT since J2000.0.
pub fn julian_centuries_tt(instant: DateTime<Utc>) -> f64 {
    (julian_day_utc(instant) + TT_MINUS_UTC_SECONDS / SECONDS_PER_DAY - J2000_JD) / DAYS_PER_CENTURY
}

/// Nutation in longitude Δψ, degrees (Meeus ch. 22, 0.5" accuracy).
pub fn nutation_in_longitude_deg(t: f64) -> f64 {
    let node = (125.044_52 - 1934.136_261 * t).to_radians();
    let l_sun = (280.4665 + 36_000.7698 * t).to_radians();
    let l_moon = (218.3165 + 481_267.8813 * t).to_radians();
    (-17.20 * node.sin() - 1.32 * (2.0 * l_sun).sin() - 0.23 * (2.0 * l_moon).sin()
        + 0.21 * (2.0 * node).sin())
        / 3600.0
}

/// Geometric solar longitude, mean equinox of date.
pub fn sun_true_longitude_deg(t: f64) -> f64 {
    let t2 = t * t;
    let l0 = 280.466_46 + 36_000.769_83 * t + 0.000_303_2 * t2;
    let m = (357.529_11 + 35_999.050_29 * t - 0.000_153_7 * t2).to_radians();
    let c = (1.914_602 - 0.004_817 * t - 0.000_014 * t2) * m.sin()
        + (0.019_993 - 0.000_101 * t) * (2.0 * m).sin()
        + 0.000_289 * (3.0 * m).sin();
    normalize_deg(l0 + c)
}

pub fn sun_apparent_longitude_deg(t: f64) -> f64 {
    let node = (125.04 - 1934.136 * t).to_radians();
    normalize_deg(sun_true_longitude_deg(t) - 0.005_69 - 0.004_78 * node.sin())
}

/// Meeus Table 47.A, longitude column: `[D, M, M', F, Σl coefficient (1e-6 deg)]`.
#[rustfmt::skip]
static MOON_LONGITUDE_TERMS: [[f64; 5]; 34] = [
    // D     M     M'    F     coefficient
    [ 0.0,  0.0,  1.0,  0.0,  6_288_774.0],
    [ 2.0,  0.0, -1.0,  0.0,  1_274_027.0],
    [ 2.0,  0.0,  0.0,  0.0,    658_314.0],
    [ 0.0,  0.0,  2.0,  0.0,    213_618.0],
    [ 0.0,  1.0,  0.0,  0.0,   -185_116.0],
    [ 0.0,  0.0,  0.0,  2.0,   -114_332.0],
    [ 2.0,  0.0, -2.0,  0.0,     58_793.0],
    [ 2.0, -1.0, -1.0,  0.0,     57_066.0],
    [ 2.0,  0.0,  1.0,  0.0,     53_322.0],
    [ 2.0, -1.0,  0.0,  0.0,     45_758.0],
    [ 0.0,  1.0, -1.0,  0.0,    -40_923.0],
    [ 1.0,  0.0,  0.0,  0.0,    -34_720.0],
    [ 0.0,  1.0,  1.0,  0.0,    -30_383.0],
    [ 2.0,  0.0,  0.0, -2.0,     15_327.0],
    [ 0.0,  0.0,  1.0,  2.0,    -12_528.0],
    [ 0.0,  0.0,  1.0, -2.0,     10_980.0],
    [ 4.0,  0.0, -1.0,  0.0,     10_675.0],
    [ 0.0,  0.0,  3.0,  0.0,     10_034.0],
    [ 4.0,  0.0, -2.0,  0.0,      8_548.0],
    [ 2.0,  1.0, -1.0,  0.0,     -7_888.0],
    [ 2.0,  1.0,  0.0,  0.0,     -6_766.0],
    [ 1.0,  0.0, -1.0,  0.0,     -5_163.0],
    [ 1.0,  1.0,  0.0,  0.0,      4_987.0],
    [ 2.0, -1.0,  1.0,  0.0,      4_036.0],
    [ 2.0,  0.0,  2.0,  0.0,      3_994.0],
    [ 4.0,  0.0,  0.0,  0.0,      3_861.0],
    [ 2.0,  0.0, -3.0,  0.0,      3_665.0],
    [ 0.0,  1.0, -2.0,  0.0,     -2_689.0],
    [ 2.0,  0.0, -1.0,  2.0,     -2_602.0],
    [ 2.0, -1.0, -2.0,  0.0,      2_390.0],
    [ 1.0,  0.0,  1.0,  0.0,     -2_348.0],
    [ 2.0, -2.0,  0.0,  0.0,      2_236.0],
    [ 0.0,  1.0,  2.0,  0.0,     -2_120.0],
    [ 0.0,  2.0,  0.0,  0.0,     -2_069.0],
];

pub fn moon_apparent_longitude_deg(t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let mean_longitude = 218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t2
        + t3 / 538_841.0
        - t4 / 65_194_000.0;
    let elongation = 297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t2 + t3 / 545_868.0
        - t4 / 113_065_000.0;
    let sun_anomaly = 357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t2 + t3 / 24_490_000.0;
    let moon_anomaly = 134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t2 + t3 / 69_699.0
        - t4 / 14_712_000.0;
    let latitude_arg = 93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t2 - t3 / 3_526_000.0
        + t4 / 863_310_000.0;
    let e = 1.0 - 0.002_516 * t - 0.000_007_4 * t2;

    let args = [
        elongation.to_radians(),
        sun_anomaly.to_radians(),
        moon_anomaly.to_radians(),
        latitude_arg.to_radians(),
    ];

    let mut sum = 0.0_f64;
    for term in &MOON_LONGITUDE_TERMS {
        let angle = term[0] * args[0] + term[1] * args[1] + term[2] * args[2] + term[3] * args[3];
        // 含太陽近點角的項需乘上地球軌道離心率修正
        let eccentricity = match term[1].abs() as i32 {
            1 => e,
            2 => e * e,
            _ => 1.0,
        };
        sum += term[4] * eccentricity * angle.sin();
    }

    let a1 = (119.75 + 131.849 * t).to_radians();
    let a2 = (53.09 + 479_264.290 * t).to_radians();
    sum += 3958.0 * a1.sin()
        + 1962.0 * (mean_longitude - latitude_arg).to_radians().sin()
        + 318.0 * a2.sin();

    normalize_deg(mean_longitude + sum / 1e6 + nutation_in_longitude_deg(t))
}

/// Standish Table 1 (1800–2050), J2000 ecliptic and equinox.
/// Columns: a, ȧ (AU), e, ė, I, İ, L, L̇, ϖ, ϖ̇, Ω, Ω̇ (deg, per century).
#[rustfmt::skip]
static ORBITAL_ELEMENTS: [[f64; 12]; 9] = [
    // Mercury
    [ 0.387_099_27,  0.000_000_37, 0.205_635_93,  0.000_019_06,  7.004_979_02, -0.005_947_49,
      252.250_323_50, 149_472.674_111_75,  77.457_796_28,  0.160_476_89,  48.330_765_93, -0.125_340_81],
    // Venus
    [ 0.723_335_66,  0.000_003_90, 0.006_776_72, -0.000_041_07,  3.394_676_05, -0.000_788_90,
      181.979_099_50,  58_517.815_387_29, 131.602_467_18,  0.002_683_29,  76.679_842_55, -0.277_694_18],
    // Earth-Moon barycenter
    [ 1.000_002_61,  0.000_005_62, 0.016_711_23, -0.000_043_92, -0.000_015_31, -0.012_946_68,
      100.464_571_66,  35_999.372_449_81, 102.937_681_93,  0.323_273_64,   0.0,           0.0],
    // Mars
    [ 1.523_710_34,  0.000_018_47, 0.093_394_10,  0.000_078_82,  1.849_691_42, -0.008_131_31,
       -4.553_432_05,  19_140.302_684_99, -23.943_629_59,  0.444_410_88,  49.559_538_91, -0.292_573_43],
    // Jupiter
    [ 5.202_887_00, -0.000_116_07, 0.048_386_24, -0.000_132_53,  1.304_396_95, -0.001_837_14,
       34.396_440_51,   3_034.746_127_75,  14.728_479_83,  0.212_526_68, 100.473_909_09,  0.204_691_06],
    // Saturn
    [ 9.536_675_94, -0.001_250_60, 0.053_861_79, -0.000_509_91,  2.485_991_87,  0.001_936_09,
       49.954_244_23,   1_222.493_622_01,  92.598_878_31, -0.418_972_16, 113.662_424_48, -0.288_677_94],
    // Uranus
    [19.189_164_64, -0.001_961_76, 0.047_257_44, -0.000_043_97,  0.772_637_83, -0.002_429_39,
      313.238_104_51,     428.482_027_85, 170.954_276_30,  0.408_052_81,  74.016_925_03,  0.042_405_89],
    // Neptune
    [30.069_922_76,  0.000_262_91, 0.008_590_48,  0.000_051_05,  1.770_043_47,  0.000_353_72,
      -55.120_029_69,     218.459_453_25,  44.964_762_27, -0.322_414_64, 131.784_225_74, -0.005_086_64],
    // Pluto
    [39.482_116_75, -0.000_315_96, 0.248_827_30,  0.000_051_70, 17.140_012_06,  0.000_048_18,
      238.929_038_33,     145.207_805_15, 224.068_916_29, -0.040_629_42, 110.303_936_84, -0.011_834_82],
];

const EARTH_MOON_BARYCENTER: usize = 2;

fn orbital_elements(body: Body) -> Option<&'static [f64; 12]> {
    let row = match body {
        Body::Mercury => 0,
        Body::Venus => 1,
        Body::Mars => 3,
        Body::Jupiter => 4,
        Body::Saturn => 5,
        Body::Uranus => 6,
        Body::Neptune => 7,
        Body::Pluto => 8,
        Body::Sun | Body::Moon | Body::Earth => return None,
    };
    ORBITAL_ELEMENTS.get(row)
}

fn solve_kepler(mean_anomaly: f64, e: f64) -> f64 {
    let mut ecc = mean_anomaly + e * mean_anomaly.sin();
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let delta = (ecc - e * ecc.sin() - mean_anomaly) / (1.0 - e * ecc.cos());
        ecc -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    ecc
}

/// Heliocentric rectangular coordinates (AU), J2000 ecliptic.
fn heliocentric_position(elements: &[f64; 12], t: f64) -> [f64; 3] {
    let at = |i: usize| elements[i] + elements[i + 1] * t;
    let a = at(0);
    let e = at(2);
    let inclination = at(4).to_radians();
    let mean_longitude = at(6);
    let perihelion = at(8);
    let node = at(10);

    let argument_of_perihelion = (perihelion - node).to_radians();
    let mean_anomaly = normalize_pm180(mean_longitude - perihelion).to_radians();
    let ecc = solve_kepler(mean_anomaly, e);

    let xp = a * (ecc.cos() - e);
    let yp = a * (1.0 - e * e).sqrt() * ecc.sin();

    let (sw, cw) = argument_of_perihelion.sin_cos();
    let (sn, cn) = node.to_radians().sin_cos();
    let (si, ci) = inclination.sin_cos();

    [
        (cw * cn - sw * sn * ci) * xp + (-sw * cn - cw * sn * ci) * yp,
        (cw * sn + sw * cn * ci) * xp + (-sw * sn + cw * cn * ci) * yp,
        (sw * si) * xp + (cw * si) * yp,
    ]
}

fn difference(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn annual_aberration_deg(t: f64, longitude_deg: f64, latitude_rad: f64) -> f64 {
    let sun = sun_true_longitude_deg(t);
    let e = 0.016_708_634 - 0.000_042_037 * t;
    let perihelion = 102.937_35 + 1.719_46 * t + 0.000_46 * t * t;
    (-ABERRATION_CONSTANT_DEG * (sun - longitude_deg).to_radians().cos()
        + e * ABERRATION_CONSTANT_DEG * (perihelion - longitude_deg).to_radians().cos())
        / latitude_rad.cos()
}

/// Apparent geocentric longitude of Mercury..Pluto, equinox of date.
pub fn planet_apparent_longitude_deg(body: Body, t: f64) -> Result<f64> {
    let elements = orbital_elements(body)
        .ok_or_else(|| GeneGraphError::ephemeris(format!("{} has no orbital elements", body)))?;
    let earth = heliocentric_position(&ORBITAL_ELEMENTS[EARTH_MOON_BARYCENTER], t);

    let first_pass = difference(heliocentric_position(elements, t), earth);
    let light_time_days = LIGHT_TIME_DAYS_PER_AU * norm(first_pass);
    let geocentric = difference(
        heliocentric_position(elements, t - light_time_days / DAYS_PER_CENTURY),
        earth,
    );

    let longitude = geocentric[1].atan2(geocentric[0]).to_degrees();
    let latitude = geocentric[2].atan2(geocentric[0].hypot(geocentric[1]));
    let precession = 1.396_971 * t + 0.000_308_6 * t * t;
    let of_date = longitude + precession;

    Ok(normalize_deg(
        of_date + annual_aberration_deg(t, of_date, latitude) + nutation_in_longitude_deg(t),
    ))
}

/// Closed-form ephemeris; no I/O, no configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticEphemeris;

impl AnalyticEphemeris {
    pub fn new() -> Self {
        Self
    }

    pub fn longitude_at(&self, instant: DateTime<Utc>, body: Body) -> Result<f64> {
        let year = instant.year();
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(GeneGraphError::ephemeris(format!(
                "{} is outside the supported range {}-{}",
                instant, MIN_YEAR, MAX_YEAR
            )));
        }

        let t = julian_centuries_tt(instant);
        match body {
            Body::Sun => Ok(sun_apparent_longitude_deg(t)),
            Body::Earth => Ok(normalize_deg(sun_apparent_longitude_deg(t) + 180.0)),
            Body::Moon => Ok(moon_apparent_longitude_deg(t)),
            planet => planet_apparent_longitude_deg(planet, t),
        }
    }
}

#[async_trait]
impl EphemerisProvider for AnalyticEphemeris {
    async fn longitude(&self, instant: DateTime<Utc>, body: Body) -> Result<f64> {
        self.longitude_at(instant, body)
    }

    fn name(&self) -> &str {
        "analytic"
    }
}
