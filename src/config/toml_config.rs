use crate::adapters::horizons::{DEFAULT_HORIZONS_ENDPOINT, DEFAULT_HORIZONS_TIMEOUT_SECONDS};
use crate::adapters::location::{
    DEFAULT_GEOCODER_ENDPOINT, DEFAULT_TIMEOUT_SECONDS, DEFAULT_TIMEZONE_ENDPOINT, DEFAULT_USER_AGENT,
};
use crate::core::design::SolarArcConfig;
use crate::domain::model::DesignMode;
use crate::utils::error::{GeneGraphError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_output_formats, validate_path, validate_positive_number,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const OUTPUT_FORMATS: [&str; 2] = ["json", "csv"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub ephemeris: EphemerisConfig,
    pub location: LocationConfig,
    pub profile: ProfileConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EphemerisBackend {
    #[default]
    Analytic,
    Horizons,
}

impl EphemerisBackend {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Analytic => "analytic",
            Self::Horizons => "horizons",
        }
    }
}

impl fmt::Display for EphemerisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EphemerisBackend {
    type Err = GeneGraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analytic" => Ok(Self::Analytic),
            "horizons" => Ok(Self::Horizons),
            other => Err(GeneGraphError::InvalidConfigValueError {
                field: "ephemeris.backend".to_string(),
                value: other.to_string(),
                reason: "expected 'analytic' or 'horizons'".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EphemerisConfig {
    pub backend: EphemerisBackend,
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for EphemerisConfig {
    fn default() -> Self {
        Self {
            backend: EphemerisBackend::default(),
            endpoint: DEFAULT_HORIZONS_ENDPOINT.to_string(),
            timeout_seconds: DEFAULT_HORIZONS_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub geocoder_endpoint: String,
    pub timezone_endpoint: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            geocoder_endpoint: DEFAULT_GEOCODER_ENDPOINT.to_string(),
            timezone_endpoint: DEFAULT_TIMEZONE_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub design_mode: DesignMode,
    pub include_bodygraph: bool,
    pub solar_arc: SolarArcConfig,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            design_mode: DesignMode::default(),
            include_bodygraph: true,
            solar_arc: SolarArcConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
    pub json_filename: String,
    pub csv_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            formats: vec!["json".to_string()],
            json_filename: "profile.json".to_string(),
            csv_filename: "gates.csv".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn wants(&self, format: &str) -> bool {
        self.formats.iter().any(|f| f == format)
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| GeneGraphError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEOCODER_URL})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| GeneGraphError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if self.ephemeris.backend == EphemerisBackend::Horizons {
            validate_url("ephemeris.endpoint", &self.ephemeris.endpoint)?;
        }
        validate_positive_number("ephemeris.timeout_seconds", self.ephemeris.timeout_seconds as usize, 1)?;

        validate_url("location.geocoder_endpoint", &self.location.geocoder_endpoint)?;
        validate_url("location.timezone_endpoint", &self.location.timezone_endpoint)?;
        validate_non_empty_string("location.user_agent", &self.location.user_agent)?;
        validate_positive_number("location.timeout_seconds", self.location.timeout_seconds as usize, 1)?;

        self.profile.solar_arc.validate()?;

        validate_path("output.path", &self.output.path)?;
        validate_output_formats("output.formats", &self.output.formats, &OUTPUT_FORMATS)?;
        validate_path("output.json_filename", &self.output.json_filename)?;
        validate_path("output.csv_filename", &self.output.csv_filename)?;

        Ok(())
    }
}
