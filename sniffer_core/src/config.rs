use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_EXECUTABLE: &str = "phpcs";

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has mistyped fields.
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A numeric option holds something that is not a non-negative integer.
    #[error("Option `{option}` expects a non-negative integer, got {value}")]
    InvalidNumber { option: &'static str, value: String },
}

/// A list-valued option as written by the user.
///
/// Anything that is not a list of strings is kept as `Other` and later
/// treated as if the option were absent.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ListSetting {
    List(Vec<String>),
    Other(toml::Value),
}

impl ListSetting {
    fn into_list(self, option: &'static str) -> Option<Vec<String>> {
        match self {
            ListSetting::List(items) => Some(items),
            ListSetting::Other(value) => {
                log::debug!("Ignoring `{option}`: expected a list of strings, got {value}");
                None
            }
        }
    }
}

impl From<Vec<String>> for ListSetting {
    fn from(items: Vec<String>) -> Self {
        ListSetting::List(items)
    }
}

/// An integer option as written by the user. Numeric strings are accepted.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum NumericSetting {
    Integer(i64),
    Text(String),
    Other(toml::Value),
}

impl NumericSetting {
    fn validate(&self, option: &'static str) -> Result<u32, ConfigError> {
        let invalid = |value: String| ConfigError::InvalidNumber { option, value };
        match self {
            NumericSetting::Integer(n) => u32::try_from(*n).map_err(|_| invalid(n.to_string())),
            NumericSetting::Text(s) => s.trim().parse::<u32>().map_err(|_| invalid(format!("{s:?}"))),
            NumericSetting::Other(v) => Err(invalid(v.to_string())),
        }
    }
}

impl From<i64> for NumericSetting {
    fn from(n: i64) -> Self {
        NumericSetting::Integer(n)
    }
}

/// Checker options exactly as they appear in the `[checker]` table.
///
/// Keys follow the PHP_CodeSniffer flag names. Unknown keys are ignored.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(default)]
pub struct CheckerSettings {
    #[serde(alias = "executable-path")]
    pub bin: Option<String>,
    pub standard: Option<String>,
    pub severity: Option<NumericSetting>,
    pub warning_severity: Option<NumericSetting>,
    pub error_severity: Option<NumericSetting>,
    pub encoding: Option<String>,
    pub report: Option<String>,
    pub show_sniff_code: bool,
    pub sniffs: Option<ListSetting>,
    pub exclude: Option<ListSetting>,
    pub ignore: Option<ListSetting>,
    pub colors: bool,
}

impl CheckerSettings {
    /// Validates user input into a [`CheckerConfig`].
    ///
    /// Numeric options that do not parse are rejected. List options that are
    /// not lists are dropped.
    pub fn validate(self) -> Result<CheckerConfig, ConfigError> {
        let number = |setting: &Option<NumericSetting>, option| {
            setting.as_ref().map(|s| s.validate(option)).transpose()
        };

        Ok(CheckerConfig {
            executable_path: self.bin.unwrap_or_else(|| DEFAULT_EXECUTABLE.to_string()),
            standard: self.standard,
            severity: number(&self.severity, "severity")?,
            warning_severity: number(&self.warning_severity, "warning-severity")?,
            error_severity: number(&self.error_severity, "error-severity")?,
            encoding: self.encoding,
            report_format: self.report,
            show_sniff_codes: self.show_sniff_code,
            sniff_whitelist: self.sniffs.and_then(|s| s.into_list("sniffs")),
            exclude_list: self.exclude.and_then(|s| s.into_list("exclude")),
            ignore_list: self.ignore.and_then(|s| s.into_list("ignore")),
            use_color_output: self.colors,
        })
    }
}

/// Validated checker options. Feeds [`crate::command::build_command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    pub executable_path: String,
    pub standard: Option<String>,
    pub severity: Option<u32>,
    pub warning_severity: Option<u32>,
    pub error_severity: Option<u32>,
    pub encoding: Option<String>,
    pub report_format: Option<String>,
    pub show_sniff_codes: bool,
    pub sniff_whitelist: Option<Vec<String>>,
    pub exclude_list: Option<Vec<String>>,
    pub ignore_list: Option<Vec<String>>,
    pub use_color_output: bool,
}

impl CheckerConfig {
    pub fn with_executable(executable_path: impl Into<String>) -> Self {
        Self {
            executable_path: executable_path.into(),
            ..Self::default()
        }
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            executable_path: DEFAULT_EXECUTABLE.to_string(),
            standard: None,
            severity: None,
            warning_severity: None,
            error_severity: None,
            encoding: None,
            report_format: None,
            show_sniff_codes: false,
            sniff_whitelist: None,
            exclude_list: None,
            ignore_list: None,
            use_color_output: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(default)]
pub struct RunSettings {
    /// Number of checker processes allowed in flight. `1` runs files one by one.
    pub jobs: usize,
}

pub fn default_jobs() -> usize {
    1
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(default)]
pub struct ReporterSettings {
    pub names: Option<Vec<String>>,
    pub path: Option<PathBuf>,
    pub fail_on_first: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(default)]
pub struct SnifferConfig {
    pub checker: CheckerSettings,
    pub run: RunSettings,
    pub reporters: ReporterSettings,
}

impl SnifferConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
