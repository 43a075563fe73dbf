use crate::utils::error::{GeneGraphError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_required_field, Validate};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// 黃道星座
// ---------------------------------------------------------------------------

/// The 12 tropical signs, Aries at 0°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

pub const ALL_SIGNS: [Sign; 12] = [
    Sign::Aries,
    Sign::Taurus,
    Sign::Gemini,
    Sign::Cancer,
    Sign::Leo,
    Sign::Virgo,
    Sign::Libra,
    Sign::Scorpio,
    Sign::Sagittarius,
    Sign::Capricorn,
    Sign::Aquarius,
    Sign::Pisces,
];

impl Sign {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Aries => "Aries",
            Self::Taurus => "Taurus",
            Self::Gemini => "Gemini",
            Self::Cancer => "Cancer",
            Self::Leo => "Leo",
            Self::Virgo => "Virgo",
            Self::Libra => "Libra",
            Self::Scorpio => "Scorpio",
            Self::Sagittarius => "Sagittarius",
            Self::Capricorn => "Capricorn",
            Self::Aquarius => "Aquarius",
            Self::Pisces => "Pisces",
        }
    }

    /// 0-based index (Aries=0 .. Pisces=11).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Sign at `index` modulo 12.
    pub const fn from_index(index: usize) -> Sign {
        ALL_SIGNS[index % 12]
    }

    pub const fn previous(self) -> Sign {
        Sign::from_index(self.index() + 11)
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// 天體
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    /// Synthetic body, always opposite the sun.
    Earth,
}

/// Every body carried by a snapshot, in output order.
pub const TRACKED_BODIES: [Body; 11] = [
    Body::Sun,
    Body::Moon,
    Body::Mercury,
    Body::Venus,
    Body::Mars,
    Body::Jupiter,
    Body::Saturn,
    Body::Uranus,
    Body::Neptune,
    Body::Pluto,
    Body::Earth,
];

/// Bodies whose longitude comes from an ephemeris provider.
pub const QUERIED_BODIES: [Body; 10] = [
    Body::Sun,
    Body::Moon,
    Body::Mercury,
    Body::Venus,
    Body::Mars,
    Body::Jupiter,
    Body::Saturn,
    Body::Uranus,
    Body::Neptune,
    Body::Pluto,
];

impl Body {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sun => "sun",
            Self::Moon => "moon",
            Self::Mercury => "mercury",
            Self::Venus => "venus",
            Self::Mars => "mars",
            Self::Jupiter => "jupiter",
            Self::Saturn => "saturn",
            Self::Uranus => "uranus",
            Self::Neptune => "neptune",
            Self::Pluto => "pluto",
            Self::Earth => "earth",
        }
    }

    /// Position in [`TRACKED_BODIES`].
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_synthetic(self) -> bool {
        matches!(self, Self::Earth)
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which of the two reference instants a value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Natal,
    Design,
}

impl Side {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Natal => "natal",
            Self::Design => "design",
        }
    }
}

// ---------------------------------------------------------------------------
// 設計時間模式
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DesignMode {
    /// natal - 88 days
    #[default]
    #[serde(rename = "days")]
    FixedOffset,
    /// instant where the sun sits 88° behind its natal longitude
    #[serde(rename = "solarArc")]
    SolarArc,
}

impl DesignMode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::FixedOffset => "days",
            Self::SolarArc => "solarArc",
        }
    }
}

impl fmt::Display for DesignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DesignMode {
    type Err = GeneGraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "days" | "fixed-offset" | "fixedOffset" => Ok(Self::FixedOffset),
            "solarArc" | "solar-arc" | "solar_arc" => Ok(Self::SolarArc),
            other => Err(GeneGraphError::invalid_input(
                "designMode",
                format!("unknown design mode '{}' (expected 'days' or 'solarArc')", other),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// 位置快照
// ---------------------------------------------------------------------------

/// One body's classified position at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyPosition {
    pub longitude: f64,
    pub sign: Sign,
    pub degree_in_sign: f64,
    pub gate: u8,
    pub line: u8,
}

/// Positions of all [`TRACKED_BODIES`] at one instant.
///
/// Always complete: a snapshot cannot be built with a body missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Body, BodyPosition>",
    into = "BTreeMap<Body, BodyPosition>"
)]
pub struct Snapshot {
    positions: [BodyPosition; 11],
}

impl Snapshot {
    /// `positions` must be ordered like [`TRACKED_BODIES`].
    pub fn from_tracked(positions: [BodyPosition; 11]) -> Self {
        Self { positions }
    }

    pub fn position(&self, body: Body) -> &BodyPosition {
        &self.positions[body.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Body, &BodyPosition)> + '_ {
        TRACKED_BODIES.iter().copied().zip(self.positions.iter())
    }
}

impl TryFrom<BTreeMap<Body, BodyPosition>> for Snapshot {
    type Error = String;

    fn try_from(map: BTreeMap<Body, BodyPosition>) -> std::result::Result<Self, Self::Error> {
        let positions = TRACKED_BODIES
            .iter()
            .map(|body| {
                map.get(body)
                    .copied()
                    .ok_or_else(|| format!("snapshot is missing body '{}'", body))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let positions: [BodyPosition; 11] = positions
            .try_into()
            .map_err(|_| "snapshot must contain exactly 11 bodies".to_string())?;
        Ok(Self { positions })
    }
}

impl From<Snapshot> for BTreeMap<Body, BodyPosition> {
    fn from(snapshot: Snapshot) -> Self {
        TRACKED_BODIES
            .iter()
            .copied()
            .zip(snapshot.positions)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshots {
    pub natal: Snapshot,
    pub design: Snapshot,
}

impl BodySnapshots {
    pub fn side(&self, side: Side) -> &Snapshot {
        match side {
            Side::Natal => &self.natal,
            Side::Design => &self.design,
        }
    }
}

// ---------------------------------------------------------------------------
// Gene Keys 球體
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overlay {
    Activation,
    Venus,
    Pearl,
}

pub const ALL_OVERLAYS: [Overlay; 3] = [Overlay::Activation, Overlay::Venus, Overlay::Pearl];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SphereRecord {
    pub sphere: String,
    pub planet: Body,
    pub mode: Side,
    pub gate: u8,
    pub line: u8,
    pub sign: Sign,
    pub longitude: f64,
}

impl SphereRecord {
    /// Short display code, e.g. `GK 25.2`.
    pub fn code(&self) -> String {
        format!("GK {}.{}", self.gate, self.line)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneKeysProfile {
    pub activation: Vec<SphereRecord>,
    pub venus: Vec<SphereRecord>,
    pub pearl: Vec<SphereRecord>,
}

impl GeneKeysProfile {
    pub fn overlay(&self, overlay: Overlay) -> &[SphereRecord] {
        match overlay {
            Overlay::Activation => &self.activation,
            Overlay::Venus => &self.venus,
            Overlay::Pearl => &self.pearl,
        }
    }

    pub(crate) fn overlay_mut(&mut self, overlay: Overlay) -> &mut Vec<SphereRecord> {
        match overlay {
            Overlay::Activation => &mut self.activation,
            Overlay::Venus => &mut self.venus,
            Overlay::Pearl => &mut self.pearl,
        }
    }

    pub fn sphere(&self, overlay: Overlay, label: &str) -> Option<&SphereRecord> {
        self.overlay(overlay).iter().find(|r| r.sphere == label)
    }
}

// ---------------------------------------------------------------------------
// Human Design 中心 / 通道
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Center {
    Head,
    Ajna,
    Throat,
    G,
    Heart,
    Spleen,
    #[serde(rename = "Solar Plexus")]
    SolarPlexus,
    Sacral,
    Root,
}

pub const ALL_CENTERS: [Center; 9] = [
    Center::Head,
    Center::Ajna,
    Center::Throat,
    Center::G,
    Center::Heart,
    Center::Spleen,
    Center::SolarPlexus,
    Center::Sacral,
    Center::Root,
];

/// Centers that can power the throat.
pub const MOTOR_CENTERS: [Center; 4] = [
    Center::Heart,
    Center::SolarPlexus,
    Center::Sacral,
    Center::Root,
];

impl Center {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Head => "Head",
            Self::Ajna => "Ajna",
            Self::Throat => "Throat",
            Self::G => "G",
            Self::Heart => "Heart",
            Self::Spleen => "Spleen",
            Self::SolarPlexus => "Solar Plexus",
            Self::Sacral => "Sacral",
            Self::Root => "Root",
        }
    }

    pub fn is_motor(self) -> bool {
        MOTOR_CENTERS.contains(&self)
    }
}

impl fmt::Display for Center {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HdType {
    Reflector,
    #[serde(rename = "Manifesting Generator")]
    ManifestingGenerator,
    Generator,
    Manifestor,
    Projector,
}

impl HdType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reflector => "Reflector",
            Self::ManifestingGenerator => "Manifesting Generator",
            Self::Generator => "Generator",
            Self::Manifestor => "Manifestor",
            Self::Projector => "Projector",
        }
    }

    pub const fn strategy(self) -> &'static str {
        match self {
            Self::Reflector => "Wait a lunar cycle (~28 days)",
            Self::ManifestingGenerator => "Wait to respond, then inform",
            Self::Generator => "Wait to respond",
            Self::Manifestor => "Inform before acting",
            Self::Projector => "Wait for the invitation",
        }
    }
}

impl fmt::Display for HdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Authority {
    Emotional,
    Sacral,
    Splenic,
    Ego,
    #[serde(rename = "Self-Projected")]
    SelfProjected,
    Environmental,
}

impl Authority {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Emotional => "Emotional",
            Self::Sacral => "Sacral",
            Self::Splenic => "Splenic",
            Self::Ego => "Ego",
            Self::SelfProjected => "Self-Projected",
            Self::Environmental => "Environmental",
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One flattened `(side, planet)` activation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDetail {
    pub side: Side,
    pub planet: Body,
    pub gate: u8,
    pub line: u8,
    pub sign: Sign,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodygraphReport {
    pub gates: Vec<GateDetail>,
    pub channels: Vec<String>,
    pub defined_centers: Vec<Center>,
    #[serde(rename = "type")]
    pub hd_type: HdType,
    pub strategy: String,
    pub authority: Authority,
}

// ---------------------------------------------------------------------------
// 出生資料
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Where to look up the birth time zone.
#[derive(Debug, Clone, PartialEq)]
pub struct BirthLocation {
    pub place: String,
    pub coordinates: Option<Coordinates>,
    pub timezone: Option<String>,
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

fn default_name() -> String {
    "Profile".to_string()
}

fn default_birth_time() -> String {
    "00:00".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthRequest {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default = "default_birth_time")]
    pub birth_time: String,
    #[serde(default)]
    pub birth_place: String,
    #[serde(default, rename = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, rename = "lon")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub design_mode: DesignMode,
    #[serde(default = "default_true", alias = "includeHD")]
    pub include_bodygraph: bool,
}

impl Default for BirthRequest {
    fn default() -> Self {
        Self {
            name: default_name(),
            birth_date: None,
            birth_time: default_birth_time(),
            birth_place: String::new(),
            latitude: None,
            longitude: None,
            timezone: None,
            design_mode: DesignMode::default(),
            include_bodygraph: true,
        }
    }
}

impl BirthRequest {
    /// 修剪空白並補上預設值
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            self.name = default_name();
        }
        self.birth_time = self.birth_time.trim().to_string();
        if self.birth_time.is_empty() {
            self.birth_time = default_birth_time();
        }
        self.birth_place = self.birth_place.trim().to_string();
        self.timezone = self
            .timezone
            .map(|tz| tz.trim().to_string())
            .filter(|tz| !tz.is_empty());
        self
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }

    pub fn location(&self) -> BirthLocation {
        BirthLocation {
            place: self.birth_place.clone(),
            coordinates: self.coordinates(),
            timezone: self.timezone.clone(),
        }
    }

    /// Parse birth date and time into a local wall-clock value.
    pub fn local_datetime(&self) -> Result<NaiveDateTime> {
        let raw_date = validate_required_field("birthDate", &self.birth_date)?.trim();
        let date = DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw_date, fmt).ok())
            .ok_or_else(|| {
                GeneGraphError::invalid_input(
                    "birthDate",
                    format!("unrecognised date '{}' (expected YYYY-MM-DD)", raw_date),
                )
            })?;

        let raw_time = self.birth_time.trim();
        let time = TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(raw_time, fmt).ok())
            .ok_or_else(|| {
                GeneGraphError::invalid_input(
                    "birthTime",
                    format!("unrecognised time '{}' (expected HH:MM)", raw_time),
                )
            })?;

        Ok(date.and_time(time))
    }
}

impl Validate for BirthRequest {
    fn validate(&self) -> Result<()> {
        self.local_datetime()?;

        let has_direct_location = self.coordinates().is_some() && self.timezone.is_some();
        if !has_direct_location {
            validate_non_empty_string("birthPlace", &self.birth_place).map_err(|_| {
                GeneGraphError::invalid_input(
                    "birthPlace",
                    "birth place is required unless lat, lon and timezone are all given",
                )
            })?;
        }

        if self.latitude.is_some() != self.longitude.is_some() {
            return Err(GeneGraphError::invalid_input(
                "lat/lon",
                "latitude and longitude must be given together",
            ));
        }
        if let Some(coords) = self.coordinates() {
            validate_range("lat", coords.latitude, -90.0, 90.0)
                .map_err(|e| GeneGraphError::invalid_input("lat", e.to_string()))?;
            validate_range("lon", coords.longitude, -180.0, 180.0)
                .map_err(|e| GeneGraphError::invalid_input("lon", e.to_string()))?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 完整結果
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeInfo {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtcInstants {
    pub birth: DateTime<Utc>,
    pub design: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMeta {
    pub input: BirthRequest,
    pub geocode: GeocodeInfo,
    pub utc: UtcInstants,
    pub ephemeris: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub meta: ProfileMeta,
    pub bodies: BodySnapshots,
    pub gene_keys: GeneKeysProfile,
    pub human_design: Option<BodygraphReport>,
}
