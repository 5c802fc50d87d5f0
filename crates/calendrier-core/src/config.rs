use crate::runtime::{CalendarConfig, STDIN_INPUT};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "calendrier";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "calendrier.docx";
pub const DEFAULT_CREATOR: &str = "calendrier";
const DOCX_EXTENSION: &str = ".docx";

/// Result returned by [`load_config`], capturing the source and any non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No persisted configuration was found or usable; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

/// Errors that can occur when persisting configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Ser(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {err}"),
            ConfigError::Ser(err) => write!(f, "TOML serialization error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Ser(value)
    }
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub runtime: RuntimePreferences,
    #[serde(default)]
    pub document: DocumentPreferences,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            runtime: RuntimePreferences::default(),
            document: DocumentPreferences::default(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }
}

/// Runtime preferences that map closely to CLI flag behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimePreferences {
    /// Events file to read; `-` reads standard input.
    #[serde(default = "RuntimePreferences::default_input_path")]
    pub input_path: String,
    #[serde(default = "RuntimePreferences::default_output_file_name")]
    pub output_file_name: String,
    #[serde(default)]
    pub output_directory: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for RuntimePreferences {
    fn default() -> Self {
        Self {
            input_path: Self::default_input_path(),
            output_file_name: Self::default_output_file_name(),
            output_directory: None,
            dry_run: false,
        }
    }
}

impl RuntimePreferences {
    fn default_input_path() -> String {
        STDIN_INPUT.to_string()
    }

    fn default_output_file_name() -> String {
        DEFAULT_OUTPUT_FILE_NAME.to_string()
    }
}

/// Values stamped into the generated document's properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPreferences {
    #[serde(default = "DocumentPreferences::default_creator")]
    pub creator: String,
}

impl Default for DocumentPreferences {
    fn default() -> Self {
        Self {
            creator: Self::default_creator(),
        }
    }
}

impl DocumentPreferences {
    fn default_creator() -> String {
        DEFAULT_CREATOR.to_string()
    }
}

/// Represents overrides sourced from runtime inputs (CLI flags).
#[derive(Debug, Default, Clone)]
pub struct RuntimeOverrides {
    pub infile: Option<String>,
    pub outfile: Option<Option<String>>,
    pub output_directory: Option<Option<String>>,
    pub dry_run: Option<bool>,
    pub creator: Option<String>,
}

impl RuntimeOverrides {
    pub fn is_empty(&self) -> bool {
        self.infile.is_none()
            && self.outfile.is_none()
            && self.output_directory.is_none()
            && self.dry_run.is_none()
            && self.creator.is_none()
    }
}

/// Path to the configuration directory.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to `config.toml`.
pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Load the configuration, falling back to defaults.
pub fn load_config() -> ConfigLoadResult {
    load_config_from(&config_path())
}

/// Load the configuration stored at `path`.
pub fn load_config_from(path: &Path) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(cfg) => {
                    let (cfg, mut sanitize_warnings) = sanitize_config(cfg);
                    warnings.append(&mut sanitize_warnings);
                    return ConfigLoadResult {
                        config: cfg,
                        warnings,
                        source: ConfigSource::File,
                    };
                }
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {} as TOML: {}. Falling back to defaults.",
                        CONFIG_FILE_NAME, err
                    ));
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {}: {}. Falling back to defaults.",
                    CONFIG_FILE_NAME, err
                ));
            }
        }
    }

    ConfigLoadResult {
        config: FileConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

/// Persist the configuration to `config.toml`.
pub fn save_config(config: &FileConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_path())
}

pub fn save_config_to(config: &FileConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(config)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn sanitize_config(mut config: FileConfig) -> (FileConfig, Vec<String>) {
    let mut warnings = Vec::new();

    if config.schema_version != CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "Unknown config schema version {}. Resetting to {}.",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
        return (FileConfig::default(), warnings);
    }

    if config.runtime.input_path.trim().is_empty() {
        warnings.push(format!(
            "Empty input_path. Resetting to '{}' (standard input).",
            STDIN_INPUT
        ));
        config.runtime.input_path = RuntimePreferences::default_input_path();
    }

    if let Some(name) = normalize_output_file_name(&config.runtime.output_file_name, &mut warnings)
    {
        config.runtime.output_file_name = name;
    }

    if config
        .runtime
        .output_directory
        .as_deref()
        .is_some_and(|dir| dir.trim().is_empty())
    {
        config.runtime.output_directory = None;
    }

    if config.document.creator.trim().is_empty() {
        warnings.push(format!(
            "Empty document creator. Resetting to '{}'.",
            DEFAULT_CREATOR
        ));
        config.document.creator = DocumentPreferences::default_creator();
    }

    (config, warnings)
}

/// Returns the corrected file name when `name` needs fixing.
fn normalize_output_file_name(name: &str, warnings: &mut Vec<String>) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        warnings.push(format!(
            "Empty output_file_name. Resetting to '{}'.",
            DEFAULT_OUTPUT_FILE_NAME
        ));
        return Some(DEFAULT_OUTPUT_FILE_NAME.to_string());
    }
    if !trimmed.to_ascii_lowercase().ends_with(DOCX_EXTENSION) {
        let fixed = format!("{trimmed}{DOCX_EXTENSION}");
        warnings.push(format!(
            "output_file_name '{}' lacks the {} extension. Using '{}'.",
            trimmed, DOCX_EXTENSION, fixed
        ));
        return Some(fixed);
    }
    (trimmed != name).then(|| trimmed.to_string())
}

/// Convert persisted preferences into the runtime configuration.
pub fn runtime_preferences_to_calendar(
    runtime: &RuntimePreferences,
    document: &DocumentPreferences,
) -> CalendarConfig {
    CalendarConfig {
        infile: runtime.input_path.clone(),
        outfile: None,
        output_directory: runtime.output_directory.clone(),
        output_file_name: runtime.output_file_name.clone(),
        dry_run: runtime.dry_run,
        creator: document.creator.clone(),
    }
}

pub fn apply_runtime_overrides(
    config: &mut CalendarConfig,
    overrides: &RuntimeOverrides,
    warnings: &mut Vec<String>,
) {
    if let Some(ref value) = overrides.infile {
        config.infile = value.clone();
    }
    if let Some(ref value) = overrides.outfile {
        config.outfile = value.clone();
        if let Some(outfile) = config.outfile.as_deref() {
            if !outfile.to_ascii_lowercase().ends_with(DOCX_EXTENSION) {
                warnings.push(format!(
                    "Output file '{}' does not end with {}; word processors may refuse to open it.",
                    outfile, DOCX_EXTENSION
                ));
            }
        }
    }
    if let Some(ref value) = overrides.output_directory {
        config.output_directory = value.clone();
    }
    if let Some(value) = overrides.dry_run {
        config.dry_run = value;
    }
    if let Some(ref value) = overrides.creator {
        if value.trim().is_empty() {
            warnings.push("Ignoring empty --creator override.".to_string());
        } else {
            config.creator = value.trim().to_string();
        }
    }
}
