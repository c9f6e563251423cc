use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use tracing::Level;

use super::{parse_env_var, SettingsError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// 로그 출력 위치. 표준 출력은 스트림 데이터가 쓰므로 기본값은 stderr
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogOutput {
    #[default]
    Stderr,
    Stdout,
    File(String),
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stderr" => Ok(LogOutput::Stderr),
            "stdout" => Ok(LogOutput::Stdout),
            "" => Err("빈 로그 출력 경로".to_string()),
            _ => Ok(LogOutput::File(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for LogOutput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_level", deserialize_with = "deserialize_level")]
    pub level: Level,
    #[serde(default)]
    pub output: LogOutput,
}

fn default_level() -> Level {
    Level::INFO
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    value
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("유효하지 않은 로그 레벨: {}", value)))
}

impl LogSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            format: parse_env_var("TOXIC_LOG_FORMAT", LogFormat::default)?,
            level: parse_env_var("TOXIC_LOG_LEVEL", default_level)?,
            output: parse_env_var("TOXIC_LOG_OUTPUT", LogOutput::default)?,
        })
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_level(),
            output: LogOutput::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_output_from_str() {
        assert_eq!("STDOUT".parse::<LogOutput>(), Ok(LogOutput::Stdout));
        assert_eq!("stderr".parse::<LogOutput>(), Ok(LogOutput::Stderr));
        assert_eq!(
            "/var/log/toxic.log".parse::<LogOutput>(),
            Ok(LogOutput::File("/var/log/toxic.log".to_string()))
        );
        assert!("".parse::<LogOutput>().is_err());
    }

    #[test]
    fn test_log_settings_from_toml() {
        let settings: LogSettings = toml::from_str(
            r#"
            format = "json"
            level = "debug"
            output = "toxic.log"
            "#,
        )
        .unwrap();

        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.level, Level::DEBUG);
        assert_eq!(settings.output, LogOutput::File("toxic.log".to_string()));
    }

    #[test]
    fn test_invalid_level_in_toml() {
        let result: Result<LogSettings, _> = toml::from_str(r#"level = "loud""#);
        assert!(result.is_err());
    }
}
