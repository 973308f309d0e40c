use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub keywords: KeywordsConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub stt: SttConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct KeywordsConfig {
    #[serde(default)]
    pub words: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_source_rate")]
    pub source_rate: u32,

    #[serde(default = "default_target_rate")]
    pub target_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            source_rate: default_source_rate(),
            target_rate: default_target_rate(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            queue_capacity: default_queue_capacity(),
            poll_ms: default_poll_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SttConfig {
    #[serde(default = "default_engine")]
    pub engine: String,

    #[serde(default)]
    pub vosk: Option<VoskConfig>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            vosk: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VoskConfig {
    pub model_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_source_rate() -> u32 {
    48000
}

fn default_target_rate() -> u32 {
    16000
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_queue_capacity() -> usize {
    64
}

fn default_poll_ms() -> u64 {
    1000
}

fn default_engine() -> String {
    "null".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./data/tally.sqlite")
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = input.to_string();
    let mut errors = Vec::new();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                errors.push(var_name.to_string());
            }
        }
    }

    if let Some(first_missing) = errors.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound(first_missing));
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let interpolated = interpolate_env_vars(&content)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (for testing).
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parse_valid_toml() {
        let toml_str = r#"
[general]
log_level = "debug"

[keywords]
words = ["hello", "hi"]

[audio]
source_rate = 48000
target_rate = 16000

[pipeline]
debounce_ms = 1500
queue_capacity = 32
poll_ms = 500

[stt]
engine = "vosk"

[stt.vosk]
model_path = "./models/vosk-small"

[store]
path = "./data/counts.sqlite"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.keywords.words, vec!["hello", "hi"]);
        assert_eq!(config.audio.source_rate, 48000);
        assert_eq!(config.audio.target_rate, 16000);
        assert_eq!(config.pipeline.debounce_ms, 1500);
        assert_eq!(config.pipeline.queue_capacity, 32);
        assert_eq!(config.pipeline.poll_ms, 500);
        assert_eq!(config.stt.engine, "vosk");
        assert_eq!(
            config.stt.vosk.unwrap().model_path,
            "./models/vosk-small"
        );
        assert_eq!(config.store.path, PathBuf::from("./data/counts.sqlite"));
    }

    #[test]
    fn test_config_default_values() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert!(config.keywords.words.is_empty());
        assert_eq!(config.audio.source_rate, 48000);
        assert_eq!(config.audio.target_rate, 16000);
        assert_eq!(config.pipeline.debounce_ms, 2000);
        assert_eq!(config.pipeline.queue_capacity, 64);
        assert_eq!(config.pipeline.poll_ms, 1000);
        assert_eq!(config.stt.engine, "null");
        assert!(config.stt.vosk.is_none());
        assert_eq!(config.store.path, PathBuf::from("./data/tally.sqlite"));
    }

    #[test]
    fn test_config_env_var_interpolation() {
        std::env::set_var("TALLYVOX_TEST_MODEL", "/opt/models/vosk");
        let toml_str = r#"
[stt]
engine = "vosk"

[stt.vosk]
model_path = "${TALLYVOX_TEST_MODEL}"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.stt.vosk.unwrap().model_path, "/opt/models/vosk");
        std::env::remove_var("TALLYVOX_TEST_MODEL");
    }

    #[test]
    fn test_config_missing_env_var_error() {
        let toml_str = r#"
[general]
log_level = "${DEFINITELY_DOES_NOT_EXIST_12345}"
"#;
        let result = AppConfig::from_toml_str(toml_str);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("DEFINITELY_DOES_NOT_EXIST_12345"));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let toml_str = "this is not valid toml [[[";
        let result = AppConfig::from_toml_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = std::env::temp_dir().join("tallyvox_test_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.toml");
        std::fs::write(
            &path,
            r#"
[general]
log_level = "warn"

[keywords]
words = ["bingo"]
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.keywords.words, vec!["bingo"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_config_load_from_file_not_found() {
        let result = AppConfig::load_from_file(std::path::Path::new("/nonexistent/path.toml"));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("failed to read config file"));
    }

    #[test]
    fn test_config_keywords_preserved_verbatim() {
        // Normalization (trim, lower-case) happens in the keyword set, not here.
        let toml_str = r#"
[keywords]
words = ["  Hello ", "HI"]
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.keywords.words, vec!["  Hello ", "HI"]);
    }
}
