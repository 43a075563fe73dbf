use crate::config::toml_config::{EphemerisBackend, TomlConfig};
use crate::domain::model::{BirthRequest, DesignMode};
use crate::utils::error::{GeneGraphError, Result};
use crate::utils::validation::Validate;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "genegraph")]
#[command(about = "Compute Gene Keys and Human Design profiles from birth data")]
pub struct CliConfig {
    #[arg(long, help = "Name shown in the profile (default: Profile)")]
    pub name: Option<String>,

    #[arg(long, help = "Birth date, e.g. 1991-07-17")]
    pub birth_date: Option<String>,

    #[arg(long, help = "Local birth time, e.g. 21:40 (default: 00:00)")]
    pub birth_time: Option<String>,

    #[arg(long, help = "Birth place to geocode")]
    pub birth_place: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    #[arg(long, help = "IANA timezone, e.g. Europe/Berlin")]
    pub timezone: Option<String>,

    #[arg(long, help = "days | solarArc")]
    pub design_mode: Option<DesignMode>,

    #[arg(long, help = "Skip the bodygraph section")]
    pub no_bodygraph: bool,

    #[arg(long, help = "Read the birth request from a JSON file")]
    pub input: Option<String>,

    #[arg(long, short = 'c', help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long, value_delimiter = ',', help = "Output formats: json,csv")]
    pub formats: Vec<String>,

    #[arg(long, help = "analytic | horizons")]
    pub ephemeris: Option<EphemerisBackend>,

    #[arg(long, help = "Print the profile JSON to stdout instead of the summary")]
    pub stdout: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, short = 'v', help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// TOML 檔 (或預設值) 再套用命令列覆寫
    pub fn load_config(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path);
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };

        if let Some(path) = &self.output_path {
            config.output.path = path.clone();
        }
        if !self.formats.is_empty() {
            config.output.formats = self.formats.clone();
        }
        if let Some(backend) = self.ephemeris {
            config.ephemeris.backend = backend;
        }
        if let Some(mode) = self.design_mode {
            config.profile.design_mode = mode;
        }
        if self.no_bodygraph {
            config.profile.include_bodygraph = false;
        }

        config.validate()?;
        Ok(config)
    }

    /// Builds the request: JSON input file (or profile defaults), then flags on top.
    pub fn birth_request(&self, config: &TomlConfig) -> Result<BirthRequest> {
        let mut request = match &self.input {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                let invalid = |e: serde_json::Error| {
                    GeneGraphError::invalid_input("input", format!("{}: {}", path, e))
                };
                let value: serde_json::Value = serde_json::from_str(&content).map_err(invalid)?;
                let has = |key: &str| value.get(key).is_some();
                // 檔案沒寫的欄位沿用 [profile] 設定
                let design_given = has("designMode");
                let bodygraph_given = has("includeBodygraph") || has("includeHD");

                let mut request: BirthRequest = serde_json::from_value(value).map_err(invalid)?;
                if !design_given {
                    request.design_mode = config.profile.design_mode;
                }
                if !bodygraph_given {
                    request.include_bodygraph = config.profile.include_bodygraph;
                }
                request
            }
            None => BirthRequest {
                design_mode: config.profile.design_mode,
                include_bodygraph: config.profile.include_bodygraph,
                ..BirthRequest::default()
            },
        };

        if let Some(name) = &self.name {
            request.name = name.clone();
        }
        if self.birth_date.is_some() {
            request.birth_date = self.birth_date.clone();
        }
        if let Some(time) = &self.birth_time {
            request.birth_time = time.clone();
        }
        if let Some(place) = &self.birth_place {
            request.birth_place = place.clone();
        }
        if self.lat.is_some() {
            request.latitude = self.lat;
        }
        if self.lon.is_some() {
            request.longitude = self.lon;
        }
        if self.timezone.is_some() {
            request.timezone = self.timezone.clone();
        }
        if let Some(mode) = self.design_mode {
            request.design_mode = mode;
        }
        if self.no_bodygraph {
            request.include_bodygraph = false;
        }

        Ok(request.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(std::iter::once("genegraph").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_birth_flags() {
        let cli = parse(&[
            "--name",
            "Ada",
            "--birth-date",
            "1991-07-17",
            "--birth-time",
            "21:40",
            "--lat",
            "-33.87",
            "--lon",
            "151.21",
            "--timezone",
            "Australia/Sydney",
            "--design-mode",
            "solarArc",
        ]);
        let config = cli.load_config().unwrap();
        let request = cli.birth_request(&config).unwrap();

        assert_eq!(request.name, "Ada");
        assert_eq!(request.latitude, Some(-33.87));
        assert_eq!(request.timezone.as_deref(), Some("Australia/Sydney"));
        assert_eq!(request.design_mode, DesignMode::SolarArc);
        assert!(request.include_bodygraph);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_flags_override_toml() {
        let mut toml_file = NamedTempFile::new().unwrap();
        toml_file
            .write_all(
                b"[ephemeris]\nbackend = \"horizons\"\n\n[profile]\ndesign_mode = \"solarArc\"\n\n[output]\npath = \"./toml-out\"\n",
            )
            .unwrap();
        let path = toml_file.path().to_string_lossy().to_string();

        let cli = parse(&[
            "--config",
            &path,
            "--ephemeris",
            "analytic",
            "--output-path",
            "./cli-out",
            "--formats",
            "json,csv",
            "--no-bodygraph",
        ]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.ephemeris.backend, EphemerisBackend::Analytic);
        assert_eq!(config.output.path, "./cli-out");
        assert!(config.output.wants("csv"));
        assert!(!config.profile.include_bodygraph);

        // 未指定 --design-mode 時沿用 TOML
        let request = cli.birth_request(&config).unwrap();
        assert_eq!(request.design_mode, DesignMode::SolarArc);
        assert!(!request.include_bodygraph);
    }

    #[test]
    fn test_input_file_with_flag_overrides() {
        let mut input = NamedTempFile::new().unwrap();
        input
            .write_all(
                br#"{"name":"From File","birthDate":"2000-01-01","birthPlace":"Paris","includeHD":false}"#,
            )
            .unwrap();
        let path = input.path().to_string_lossy().to_string();

        let cli = parse(&["--input", &path, "--birth-time", "06:30"]);
        let request = cli.birth_request(&TomlConfig::default()).unwrap();

        assert_eq!(request.name, "From File");
        assert_eq!(request.birth_place, "Paris");
        assert_eq!(request.birth_time, "06:30");
        assert!(!request.include_bodygraph);
    }

    #[test]
    fn test_input_file_falls_back_to_toml_profile() {
        let mut toml_file = NamedTempFile::new().unwrap();
        toml_file
            .write_all(b"[profile]\ndesign_mode = \"solarArc\"\ninclude_bodygraph = false\n")
            .unwrap();
        let toml_path = toml_file.path().to_string_lossy().to_string();

        let mut input = NamedTempFile::new().unwrap();
        input
            .write_all(br#"{"birthDate":"1991-07-17","birthPlace":"Lima"}"#)
            .unwrap();
        let input_path = input.path().to_string_lossy().to_string();

        let cli = parse(&["--config", &toml_path, "--input", &input_path]);
        let config = cli.load_config().unwrap();
        let request = cli.birth_request(&config).unwrap();

        assert_eq!(request.birth_place, "Lima");
        assert_eq!(request.design_mode, DesignMode::SolarArc);
        assert!(!request.include_bodygraph);

        // 檔案明確寫出的值優先於 TOML
        let mut explicit = NamedTempFile::new().unwrap();
        explicit
            .write_all(
                br#"{"birthDate":"1991-07-17","birthPlace":"Lima","designMode":"days","includeBodygraph":true}"#,
            )
            .unwrap();
        let explicit_path = explicit.path().to_string_lossy().to_string();

        let cli = parse(&["--config", &toml_path, "--input", &explicit_path]);
        let request = cli.birth_request(&config).unwrap();
        assert_eq!(request.design_mode, DesignMode::FixedOffset);
        assert!(request.include_bodygraph);
    }

    #[test]
    fn test_invalid_flag_values() {
        let result = CliConfig::try_parse_from(["genegraph", "--design-mode", "weekly"]);
        assert!(result.is_err());

        let cli = parse(&["--formats", "svg"]);
        assert!(cli.load_config().is_err());
    }
}
