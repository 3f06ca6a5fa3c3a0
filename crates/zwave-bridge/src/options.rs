//! Driver options.
//!
//! Options arrive as `{name: value}` pairs, typically from a JSON file, and
//! are validated against a fixed table of known option names and their
//! types. Unknown names and values of the wrong JSON type are reported as
//! [`ConfigurationWarning`]s and skipped; they never abort startup. Values
//! are not coerced between types.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use zwave_bridge::options::DriverOptions;
//!
//! let (options, warnings) = DriverOptions::from_json_value(&json!({
//!     "ConsoleOutput": false,
//!     "PollInterval": 500,
//!     "NoSuchOption": true,
//! }))
//! .unwrap();
//!
//! assert!(!options.console_output);
//! assert_eq!(options.poll_interval, 500);
//! assert_eq!(warnings.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use zwave_core::constants::DEFAULT_POLL_INTERVAL_MS;
use zwave_core::{Error, Result};

/// Type of a driver option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Invalid,
    Bool,
    Int,
    String,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Invalid => write!(f, "invalid"),
            OptionType::Bool => write!(f, "bool"),
            OptionType::Int => write!(f, "int"),
            OptionType::String => write!(f, "string"),
        }
    }
}

/// Every option the driver understands, with its type.
pub const OPTION_TABLE: [(&str, OptionType); 26] = [
    ("ConfigPath", OptionType::String),
    ("UserPath", OptionType::String),
    ("Logging", OptionType::Bool),
    ("LogFileName", OptionType::String),
    ("AppendLogFile", OptionType::Bool),
    ("ConsoleOutput", OptionType::Bool),
    ("SaveLogLevel", OptionType::Int),
    ("QueueLogLevel", OptionType::Int),
    ("DumpTriggerLevel", OptionType::Int),
    ("Associate", OptionType::Bool),
    ("Exclude", OptionType::String),
    ("Include", OptionType::String),
    ("NotifyTransactions", OptionType::Bool),
    ("Interface", OptionType::String),
    ("SaveConfiguration", OptionType::Bool),
    ("DriverMaxAttempts", OptionType::Int),
    ("PollInterval", OptionType::Int),
    ("IntervalBetweenPolls", OptionType::Bool),
    ("SuppressValueRefresh", OptionType::Bool),
    ("PerformReturnRoutes", OptionType::Bool),
    ("NetworkKey", OptionType::String),
    ("RefreshAllUserCodes", OptionType::Bool),
    ("RetryTimeout", OptionType::Int),
    ("EnableSIS", OptionType::Bool),
    ("AssumeAwake", OptionType::Bool),
    ("NotifyOnDriverUnload", OptionType::Bool),
];

/// Look up the type of an option. Unknown names are `OptionType::Invalid`.
pub fn option_type(name: &str) -> OptionType {
    OPTION_TABLE
        .iter()
        .find(|(known, _)| *known == name)
        .map_or(OptionType::Invalid, |(_, ty)| *ty)
}

/// Non-fatal problem found while applying options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationWarning {
    #[error("invalid option: {0}")]
    UnknownOption(String),

    #[error("option {option} expects {expected}, got {actual}")]
    TypeMismatch {
        option: String,
        expected: OptionType,
        actual: &'static str,
    },
}

/// A validated option value.
#[derive(Debug, Clone, PartialEq)]
enum OptionValue {
    Bool(bool),
    Int(i32),
    String(String),
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => "int",
        JsonValue::Number(_) => "float",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn validate(name: &str, value: &JsonValue) -> std::result::Result<OptionValue, ConfigurationWarning> {
    let expected = option_type(name);
    let parsed = match (expected, value) {
        (OptionType::Invalid, _) => {
            return Err(ConfigurationWarning::UnknownOption(name.to_string()));
        }
        (OptionType::Bool, JsonValue::Bool(b)) => Some(OptionValue::Bool(*b)),
        (OptionType::Int, JsonValue::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(OptionValue::Int),
        (OptionType::String, JsonValue::String(s)) => Some(OptionValue::String(s.clone())),
        _ => None,
    };

    parsed.ok_or_else(|| ConfigurationWarning::TypeMismatch {
        option: name.to_string(),
        expected,
        actual: json_type_name(value),
    })
}

/// Options handed to the driver. Frozen once passed to `ZWave::new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DriverOptions {
    pub config_path: Option<String>,
    pub user_path: Option<String>,
    pub logging: bool,
    pub log_file_name: String,
    pub append_log_file: bool,
    pub console_output: bool,
    pub save_log_level: i32,
    pub queue_log_level: i32,
    pub dump_trigger_level: i32,
    pub associate: bool,
    pub exclude: String,
    pub include: String,
    pub notify_transactions: bool,
    pub interface: String,
    pub save_configuration: bool,
    pub driver_max_attempts: i32,
    /// Milliseconds between two complete polling passes.
    pub poll_interval: i32,
    pub interval_between_polls: bool,
    pub suppress_value_refresh: bool,
    pub perform_return_routes: bool,
    pub network_key: String,
    pub refresh_all_user_codes: bool,
    pub retry_timeout: i32,
    #[serde(rename = "EnableSIS")]
    pub enable_sis: bool,
    pub assume_awake: bool,
    pub notify_on_driver_unload: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            user_path: None,
            logging: true,
            log_file_name: "OZW_Log.txt".to_string(),
            append_log_file: false,
            console_output: true,
            save_log_level: 8,
            queue_log_level: 9,
            dump_trigger_level: 0,
            associate: true,
            exclude: String::new(),
            include: String::new(),
            notify_transactions: false,
            interface: String::new(),
            save_configuration: true,
            driver_max_attempts: 0,
            poll_interval: DEFAULT_POLL_INTERVAL_MS as i32,
            interval_between_polls: false,
            suppress_value_refresh: false,
            perform_return_routes: true,
            network_key: String::new(),
            refresh_all_user_codes: false,
            retry_timeout: 40_000,
            enable_sis: true,
            assume_awake: true,
            notify_on_driver_unload: false,
        }
    }
}

impl DriverOptions {
    /// Apply `{name: value}` pairs on top of the defaults.
    ///
    /// Returns the options together with a warning for every pair that was
    /// skipped.
    pub fn from_pairs<'a, I>(pairs: I) -> (Self, Vec<ConfigurationWarning>)
    where
        I: IntoIterator<Item = (&'a str, &'a JsonValue)>,
    {
        let mut options = Self::default();
        let mut warnings = Vec::new();

        for (name, value) in pairs {
            match validate(name, value) {
                Ok(value) => {
                    debug!(option = name, ?value, "driver option set");
                    options.apply(name, value);
                }
                Err(warning) => {
                    warn!(%warning, "driver option skipped");
                    warnings.push(warning);
                }
            }
        }

        (options, warnings)
    }

    /// Apply the members of a JSON object.
    ///
    /// # Errors
    /// Returns `Error::Config` if `value` is not an object.
    pub fn from_json_value(value: &JsonValue) -> Result<(Self, Vec<ConfigurationWarning>)> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::Config(format!("options must be a JSON object, got {}", json_type_name(value))))?;
        Ok(Self::from_pairs(
            object.iter().map(|(name, value)| (name.as_str(), value)),
        ))
    }

    /// Load options from a JSON file.
    ///
    /// # Errors
    /// Returns `Error::Config` if the file cannot be read or is not a JSON object.
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, Vec<ConfigurationWarning>)> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let value: JsonValue = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid JSON in {}: {e}", path.display())))?;
        Self::from_json_value(&value)
    }

    /// Polling interval as a duration. Negative values count as zero.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.poll_interval).unwrap_or(0))
    }

    fn apply(&mut self, name: &str, value: OptionValue) {
        use OptionValue::{Bool, Int, String as Str};

        match (name, value) {
            ("ConfigPath", Str(s)) => self.config_path = Some(s),
            ("UserPath", Str(s)) => self.user_path = Some(s),
            ("Logging", Bool(b)) => self.logging = b,
            ("LogFileName", Str(s)) => self.log_file_name = s,
            ("AppendLogFile", Bool(b)) => self.append_log_file = b,
            ("ConsoleOutput", Bool(b)) => self.console_output = b,
            ("SaveLogLevel", Int(n)) => self.save_log_level = n,
            ("QueueLogLevel", Int(n)) => self.queue_log_level = n,
            ("DumpTriggerLevel", Int(n)) => self.dump_trigger_level = n,
            ("Associate", Bool(b)) => self.associate = b,
            ("Exclude", Str(s)) => self.exclude = s,
            ("Include", Str(s)) => self.include = s,
            ("NotifyTransactions", Bool(b)) => self.notify_transactions = b,
            ("Interface", Str(s)) => self.interface = s,
            ("SaveConfiguration", Bool(b)) => self.save_configuration = b,
            ("DriverMaxAttempts", Int(n)) => self.driver_max_attempts = n,
            ("PollInterval", Int(n)) => self.poll_interval = n,
            ("IntervalBetweenPolls", Bool(b)) => self.interval_between_polls = b,
            ("SuppressValueRefresh", Bool(b)) => self.suppress_value_refresh = b,
            ("PerformReturnRoutes", Bool(b)) => self.perform_return_routes = b,
            ("NetworkKey", Str(s)) => self.network_key = s,
            ("RefreshAllUserCodes", Bool(b)) => self.refresh_all_user_codes = b,
            ("RetryTimeout", Int(n)) => self.retry_timeout = n,
            ("EnableSIS", Bool(b)) => self.enable_sis = b,
            ("AssumeAwake", Bool(b)) => self.assume_awake = b,
            ("NotifyOnDriverUnload", Bool(b)) => self.notify_on_driver_unload = b,
            // validate() only lets through names and types from OPTION_TABLE
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::io::Write;

    #[rstest]
    #[case("ConsoleOutput", OptionType::Bool)]
    #[case("PollInterval", OptionType::Int)]
    #[case("NetworkKey", OptionType::String)]
    #[case("consoleoutput", OptionType::Invalid)]
    #[case("", OptionType::Invalid)]
    fn test_option_type(#[case] name: &str, #[case] expected: OptionType) {
        assert_eq!(option_type(name), expected);
    }

    #[test]
    fn test_every_table_entry_is_applied() {
        let sample = |ty: OptionType| match ty {
            OptionType::Bool => json!(false),
            OptionType::Int => json!(1234),
            OptionType::String => json!("x"),
            OptionType::Invalid => unreachable!(),
        };
        let values: Vec<(&str, JsonValue)> = OPTION_TABLE
            .iter()
            .map(|(name, ty)| (*name, sample(*ty)))
            .collect();

        let (options, warnings) =
            DriverOptions::from_pairs(values.iter().map(|(name, value)| (*name, value)));

        assert!(warnings.is_empty());
        assert_ne!(options, DriverOptions::default());
        assert_eq!(options.poll_interval, 1234);
        assert_eq!(options.network_key, "x");
        assert!(!options.enable_sis);
    }

    #[rstest]
    #[case(json!({"PollInterval": "fast"}), "int", "string")]
    #[case(json!({"PollInterval": 1.5}), "int", "float")]
    #[case(json!({"PollInterval": 9_999_999_999_i64}), "int", "int")]
    #[case(json!({"ConsoleOutput": 1}), "bool", "int")]
    #[case(json!({"NetworkKey": null}), "string", "null")]
    fn test_type_mismatch_is_skipped(
        #[case] input: JsonValue,
        #[case] expected: &str,
        #[case] actual: &str,
    ) {
        let (options, warnings) = DriverOptions::from_json_value(&input).unwrap();

        assert_eq!(options, DriverOptions::default());
        assert_eq!(warnings.len(), 1);
        match &warnings[0] {
            ConfigurationWarning::TypeMismatch {
                expected: e,
                actual: a,
                ..
            } => {
                assert_eq!(e.to_string(), expected);
                assert_eq!(*a, actual);
            }
            other => panic!("unexpected warning: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_option_is_skipped() {
        let (options, warnings) =
            DriverOptions::from_json_value(&json!({"Bogus": true, "Associate": false})).unwrap();

        assert!(!options.associate);
        assert_eq!(
            warnings,
            vec![ConfigurationWarning::UnknownOption("Bogus".to_string())]
        );
    }

    #[test]
    fn test_non_object_is_an_error() {
        let result = DriverOptions::from_json_value(&json!([1, 2, 3]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "ConsoleOutput": false, "PollInterval": 500 }}"#).unwrap();

        let (options, warnings) = DriverOptions::load(file.path()).unwrap();
        assert!(warnings.is_empty());
        assert!(!options.console_output);
        assert_eq!(options.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_load_missing_file() {
        let result = DriverOptions::load("/nonexistent/zwave-options.json");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
