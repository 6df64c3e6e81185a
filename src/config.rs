//! qrsplice runtime configuration handling

use crate::error::{Error, Result};
use crate::qr::EccLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Alt text that marks the placeholder image when nothing else is configured
pub const DEFAULT_MARKER: &str = "QRCODE_PLACEHOLDER";

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrspliceConfig {
    /// QR rendering settings
    pub qr: QrOptions,
    /// Placeholder substitution settings
    pub substitution: SubstitutionOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl QrspliceConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No qrsplice.toml / qrsplice.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["qrsplice.toml", "qrsplice.yaml", "qrsplice.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("qrsplice");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.qr.apply_env_overrides();
        self.substitution.apply_env_overrides();
        self.logging.apply_env_overrides();
    }
}

/// QR rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    /// Error correction level (L, M, Q, H)
    pub ecc_level: EccLevel,
    /// Minimum edge length of the rendered PNG in pixels
    pub min_dimension: u32,
    /// Surround the symbol with the standard four-module quiet zone
    pub quiet_zone: bool,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            ecc_level: EccLevel::M,
            // Minimum size for reliable scanning
            min_dimension: 400,
            quiet_zone: true,
        }
    }
}

impl QrOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("QRSPLICE_QR_ECC") {
            if let Some(parsed) = EccLevel::parse(&level) {
                self.ecc_level = parsed;
            }
        }
        if let Ok(size) = env::var("QRSPLICE_QR_MIN_DIMENSION") {
            if let Ok(parsed) = size.parse::<u32>() {
                self.min_dimension = parsed;
            }
        }
        if let Some(flag) = env_flag("QRSPLICE_QR_QUIET_ZONE") {
            self.quiet_zone = flag;
        }
    }
}

/// What to do when no inline shape carries the marker
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingMarkerPolicy {
    /// Save the unchanged document without comment
    Ignore,
    /// Save the unchanged document and log a warning
    #[default]
    Warn,
    /// Abort with [`Error::MarkerNotFound`] and write nothing
    Fail,
}

impl MissingMarkerPolicy {
    /// Parse a policy identifier (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "ignore" => Some(Self::Ignore),
            "warn" => Some(Self::Warn),
            "fail" | "error" => Some(Self::Fail),
            _ => None,
        }
    }
}

impl FromStr for MissingMarkerPolicy {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| {
            format!("Unsupported missing-marker policy '{value}', expected ignore, warn or fail")
        })
    }
}

/// Placeholder substitution options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionOptions {
    /// Alt text identifying the placeholder image
    pub marker: String,
    /// Directory receiving the transient QR image (defaults to the OS temp dir)
    pub transient_dir: Option<PathBuf>,
    /// Behaviour when the marker is absent
    pub on_missing: MissingMarkerPolicy,
    /// Decode the rendered QR image and compare it with the payload before embedding
    pub verify: bool,
    /// Alt text given to the inserted QR picture
    pub alt_text: String,
}

impl Default for SubstitutionOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            transient_dir: None,
            on_missing: MissingMarkerPolicy::Warn,
            verify: false,
            alt_text: String::new(),
        }
    }
}

impl SubstitutionOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(marker) = env::var("QRSPLICE_MARKER") {
            self.marker = marker;
        }
        if let Ok(dir) = env::var("QRSPLICE_TRANSIENT_DIR") {
            if dir.trim().is_empty() {
                self.transient_dir = None;
            } else {
                self.transient_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(policy) = env::var("QRSPLICE_ON_MISSING") {
            if let Some(parsed) = MissingMarkerPolicy::parse(&policy) {
                self.on_missing = parsed;
            }
        }
        if let Some(flag) = env_flag("QRSPLICE_VERIFY") {
            self.verify = flag;
        }
        if let Ok(alt_text) = env::var("QRSPLICE_ALT_TEXT") {
            self.alt_text = alt_text;
        }
    }

    /// Resolved directory for the transient QR image.
    pub fn transient_dir(&self) -> PathBuf {
        self.transient_dir.clone().unwrap_or_else(env::temp_dir)
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `QRSPLICE_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in terminal logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("QRSPLICE_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("QRSPLICE_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Some(flag) = env_flag("QRSPLICE_LOG_COLOR") {
            self.color = flag;
        }
        if let Ok(rotation) = env::var("QRSPLICE_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::from_str(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}
