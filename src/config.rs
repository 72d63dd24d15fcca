use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::audio::ResampleMethod;
use crate::convert::{ResampleJob, DEFAULT_OUTPUT_SUFFIX, DEFAULT_QUALITY};
use crate::pdf::PageSize;

/// Common configuration for both CLI and Web UI
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub pdf: PdfConfig,
    #[serde(default)]
    pub server: Option<ServerConfig>,
}

/// Common configuration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommonConfig {
    /// Appended to the input's stem when naming output files
    pub output_suffix: String,
    /// Fraction of the source sample rate to keep
    pub default_quality: f64,
    pub method: ResampleMethod,
}

/// Defaults for the PDF resize tool
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct PdfConfig {
    pub page_size: PageSize,
    /// Extra scale after fitting the page, in percent
    pub scale_percent: f32,
}

/// Server-specific configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub max_file_size_mb: u64,
    pub limits: QualityLimits,
}

/// Range of quality values the Web UI accepts
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct QualityLimits {
    pub min_quality: f64,
    pub max_quality: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            common: CommonConfig::default(),
            pdf: PdfConfig::default(),
            server: Some(ServerConfig::default()),
        }
    }
}

impl Default for CommonConfig {
    fn default() -> Self {
        CommonConfig {
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            default_quality: DEFAULT_QUALITY,
            method: ResampleMethod::default(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        PdfConfig {
            page_size: PageSize::default(),
            scale_percent: 100.0,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 8573,
            max_file_size_mb: 80,
            limits: QualityLimits::default(),
        }
    }
}

impl Default for QualityLimits {
    fn default() -> Self {
        QualityLimits {
            min_quality: 0.05,
            max_quality: 1.0,
        }
    }
}

impl Config {
    /// Builds a resample job from the common settings
    pub fn job(&self) -> ResampleJob {
        ResampleJob {
            quality: self.common.default_quality,
            method: self.common.method,
            output_suffix: self.common.output_suffix.clone(),
        }
    }

    /// Server settings, falling back to defaults when the section is missing
    pub fn server_or_default(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }
}

impl QualityLimits {
    pub fn contains(&self, quality: f64) -> bool {
        quality >= self.min_quality && quality <= self.max_quality
    }
}

/// Parse configuration from TOML text
pub fn parse_config(contents: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(contents)
}

/// Load configuration from a TOML file, using defaults if it doesn't exist
pub fn load_config_from(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    match File::open(path) {
        Ok(mut file) => {
            let mut contents = String::new();
            file.read_to_string(&mut contents)?;
            Ok(parse_config(&contents)?)
        }
        Err(_) => {
            // If file doesn't exist, return default config
            Ok(Config::default())
        }
    }
}

/// Load configuration from config.toml
pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    load_config_from(Path::new("config.toml"))
}

/// Like [`load_config_from`], but a file that cannot be read or parsed is
/// reported with a warning and replaced by the defaults.
pub fn load_config_or_default_from(path: &Path) -> Config {
    load_config_from(path).unwrap_or_else(|err| {
        tracing::warn!(
            "Ignoring {}: {}; using default settings",
            path.display(),
            err
        );
        Config::default()
    })
}

/// Load config.toml, warning about and ignoring a malformed file
pub fn load_config_or_default() -> Config {
    load_config_or_default_from(Path::new("config.toml"))
}
