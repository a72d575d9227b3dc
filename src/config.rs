//! QRCARD runtime configuration handling

use crate::error::{Error, Result};
use crate::locale::{self, Locale};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Chart-style image service tried first when local encoding is unavailable.
///
/// Google has deprecated the Chart QR API and the host often refuses
/// requests, in which case the chain moves on to
/// [`DEFAULT_SECONDARY_ENDPOINT`]. Override `render.endpoints` to drop it.
pub const DEFAULT_PRIMARY_ENDPOINT: &str =
    "https://chart.googleapis.com/chart?cht=qr&chs={size}x{size}&chl={data}&choe=UTF-8&chld=M|1";

/// Second image service, tried when the first one fails to load.
pub const DEFAULT_SECONDARY_ENDPOINT: &str =
    "https://api.qrserver.com/v1/create-qr-code/?size={size}x{size}&data={data}&format=png&margin=10";

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrcardConfig {
    /// QR rendering options
    pub render: RenderOptions,
    /// UI language selection
    pub locale: LocaleOptions,
    /// Where downloads land
    pub output: OutputOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl QrcardConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No qrcard.toml / qrcard.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.render.validate()?;
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["qrcard.toml", "qrcard.yaml", "qrcard.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("qrcard");
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
        self.render.apply_env_overrides();
        self.locale.apply_env_overrides();
        self.output.apply_env_overrides();
        self.logging.apply_env_overrides();
    }
}

/// QR error-correction level
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCorrection {
    /// ~7% recoverable
    L,
    /// ~15% recoverable
    #[default]
    M,
    /// ~25% recoverable
    Q,
    /// ~30% recoverable
    H,
}

impl ErrorCorrection {
    /// Parse a level letter (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "L" => Some(Self::L),
            "M" => Some(Self::M),
            "Q" => Some(Self::Q),
            "H" => Some(Self::H),
            _ => None,
        }
    }

    /// Level letter as used by QR tooling and chart URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        }
    }

    pub(crate) fn to_qrcode(self) -> qrcode::EcLevel {
        match self {
            Self::L => qrcode::EcLevel::L,
            Self::M => qrcode::EcLevel::M,
            Self::Q => qrcode::EcLevel::Q,
            Self::H => qrcode::EcLevel::H,
        }
    }
}

/// QR rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Target edge length in pixels
    pub size: u32,
    /// Error-correction level for the local encoder
    pub error_correction: ErrorCorrection,
    /// Surround the code with the standard white border
    pub quiet_zone: bool,
    /// Fall back to remote image services when local encoding fails
    pub remote_fallback: bool,
    /// Remote image URL templates, tried in order. `{size}` and `{data}` are substituted.
    pub endpoints: Vec<String>,
    /// Per-request timeout for remote image services, in seconds
    pub timeout_secs: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            size: 300,
            error_correction: ErrorCorrection::M,
            quiet_zone: true,
            remote_fallback: true,
            endpoints: vec![
                DEFAULT_PRIMARY_ENDPOINT.to_string(),
                DEFAULT_SECONDARY_ENDPOINT.to_string(),
            ],
            timeout_secs: 10,
        }
    }
}

impl RenderOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(size) = env::var("QRCARD_SIZE") {
            if let Ok(parsed) = size.parse::<u32>() {
                self.size = parsed;
            }
        }
        if let Ok(level) = env::var("QRCARD_EC_LEVEL") {
            if let Some(parsed) = ErrorCorrection::parse(&level) {
                self.error_correction = parsed;
            }
        }
        if let Ok(fallback) = env::var("QRCARD_REMOTE_FALLBACK") {
            match fallback.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.remote_fallback = false,
                "1" | "true" | "on" => self.remote_fallback = true,
                _ => {}
            }
        }
        if let Ok(timeout) = env::var("QRCARD_TIMEOUT_SECS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.timeout_secs = value.max(1);
            }
        }
    }

    /// Reject values that cannot produce a usable image.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::Config("render.size must be greater than zero".into()));
        }
        if let Some(bad) = self.endpoints.iter().find(|e| !e.contains("{data}")) {
            return Err(Error::Config(format!(
                "Endpoint template '{bad}' is missing the {{data}} placeholder"
            )));
        }
        Ok(())
    }

    /// Timeout applied to each remote request
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// UI language selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleOptions {
    /// Requested language tag; detected from the environment when absent
    pub preferred: Option<String>,
}

impl LocaleOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(tag) = env::var("QRCARD_LOCALE") {
            if !tag.trim().is_empty() {
                self.preferred = Some(tag);
            }
        }
    }

    /// Resolve the configured tag, or detect one from the environment.
    pub fn resolve(&self) -> Locale {
        match self.preferred.as_deref() {
            Some(tag) => locale::resolve_locale(tag),
            None => locale::detect_locale(),
        }
    }
}

/// Download destination
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Directory receiving `qr-code-<mode>.png`
    pub directory: PathBuf,
    /// How long the CLI keeps serving copied text on X11/Wayland before exiting, in seconds
    pub clipboard_hold_secs: u64,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            clipboard_hold_secs: 30,
        }
    }
}

impl OutputOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("QRCARD_OUTPUT_DIR") {
            self.directory = PathBuf::from(dir);
        }
        if let Ok(hold) = env::var("QRCARD_CLIPBOARD_HOLD_SECS") {
            if let Ok(value) = hold.parse::<u64>() {
                self.clipboard_hold_secs = value;
            }
        }
    }

    /// Window during which a short-lived process serves copied text
    pub fn clipboard_hold(&self) -> Duration {
        Duration::from_secs(self.clipboard_hold_secs.max(1))
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `QRCARD_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in console (stderr) logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("QRCARD_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("QRCARD_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("QRCARD_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(rotation) = env::var("QRCARD_LOG_ROTATION") {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_expected_render_target() {
        let config = QrcardConfig::default();
        assert_eq!(config.render.size, 300);
        assert_eq!(config.render.error_correction, ErrorCorrection::M);
        assert_eq!(config.render.endpoints.len(), 2);
        assert!(config.render.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[render]\nsize = 512\nerror_correction = \"H\"\n\n[locale]\npreferred = \"en-GB\""
        )
        .unwrap();

        let config = QrcardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.render.size, 512);
        assert_eq!(config.render.error_correction, ErrorCorrection::H);
        assert!(config.render.remote_fallback);
        assert_eq!(config.locale.resolve(), Locale::EnUs);
    }

    #[test]
    fn parses_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "output:\n  directory: /tmp/codes\nlogging:\n  level: debug").unwrap();

        let config = QrcardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.output.directory, PathBuf::from("/tmp/codes"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            QrcardConfig::from_file(file.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn validation_catches_bad_render_options() {
        let mut options = RenderOptions::default();
        options.size = 0;
        assert!(options.validate().is_err());

        let mut options = RenderOptions::default();
        options.endpoints = vec!["https://example.test/qr?size={size}".into()];
        assert!(options.validate().is_err());
    }

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Run `f` with `vars` set, removing them afterwards.
    fn with_env(vars: &[(&str, &str)], f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for (key, value) in vars {
            // SAFETY: every test touching the environment holds ENV_LOCK.
            unsafe { env::set_var(key, value) };
        }
        f();
        for (key, _) in vars {
            // SAFETY: as above.
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    fn env_overrides_render_options() {
        with_env(
            &[
                ("QRCARD_SIZE", "512"),
                ("QRCARD_EC_LEVEL", "x"),
                ("QRCARD_REMOTE_FALLBACK", "off"),
                ("QRCARD_TIMEOUT_SECS", "0"),
            ],
            || {
                let mut options = RenderOptions::default();
                options.apply_env_overrides();
                assert_eq!(options.size, 512);
                assert_eq!(options.error_correction, ErrorCorrection::M);
                assert!(!options.remote_fallback);
                assert_eq!(options.timeout_secs, 1);
            },
        );
    }

    #[test]
    fn env_overrides_ignore_unparseable_values() {
        with_env(
            &[
                ("QRCARD_SIZE", "huge"),
                ("QRCARD_REMOTE_FALLBACK", "maybe"),
                ("QRCARD_LOG_COLOR", "off"),
                ("QRCARD_LOG_ROTATION", "weekly"),
                ("QRCARD_CLIPBOARD_HOLD_SECS", "5"),
                ("QRCARD_LOCALE", "en_GB"),
            ],
            || {
                let mut config = QrcardConfig::default();
                config.apply_env_overrides();
                assert_eq!(config.render.size, 300);
                assert!(config.render.remote_fallback);
                assert!(!config.logging.color);
                assert_eq!(config.logging.rotation, None);
                assert_eq!(config.output.clipboard_hold(), Duration::from_secs(5));
                assert_eq!(config.locale.resolve(), Locale::EnUs);
            },
        );
    }

    #[test]
    fn error_correction_parsing() {
        assert_eq!(ErrorCorrection::parse("q"), Some(ErrorCorrection::Q));
        assert_eq!(ErrorCorrection::parse("X"), None);
        assert_eq!(ErrorCorrection::M.as_str(), "M");
    }
}
