use std::{collections::HashMap, env, path::Path};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub mod logging;
mod error;
mod toxic;

pub use logging::{LogFormat, LogOutput, LogSettings};
pub use error::SettingsError;
pub use toxic::{StreamDirection, ToxicSettings};

pub type Result<T> = std::result::Result<T, SettingsError>;

/// 환경 변수로 정의되는 HTTP toxic 의 이름
pub const ENV_HTTP_TOXIC_NAME: &str = "httptoxic";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    // 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,

    /// 이름별 toxic 설정
    #[serde(default)]
    pub toxics: HashMap<String, ToxicSettings>,
}

impl Settings {
    pub async fn load() -> Result<Self> {
        if let Ok(config_path) = env::var("TOXIC_CONFIG_FILE") {
            Self::from_toml_file(&config_path).await
        } else {
            Self::from_env().await
        }
    }

    pub async fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| SettingsError::FileError {
            path: path.as_ref().to_string_lossy().to_string(),
            error: e,
        })?;

        let settings = Self::from_toml_str(&content)?;
        debug!(
            path = %path.as_ref().display(),
            toxics = settings.toxics.len(),
            "설정 파일 로드 완료"
        );
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SettingsError::ParseError { source: e })
    }

    /// 환경 변수에서 설정을 읽습니다.
    ///
    /// `TOXIC_HTTP_*` 중 하나라도 있으면 `httptoxic` toxic 하나를 정의합니다.
    /// 헤더는 `key:value;key:value` 형식의 문자열로 받습니다.
    pub async fn from_env() -> Result<Self> {
        let mut toxics = HashMap::new();

        let status_code = env::var("TOXIC_HTTP_STATUS_CODE").ok();
        let headers = env::var("TOXIC_HTTP_RESPONSE_HEADERS").ok();
        let body = env::var("TOXIC_HTTP_RESPONSE_BODY").ok();

        if status_code.is_some() || headers.is_some() || body.is_some() {
            let status_code: u16 = parse_env_var("TOXIC_HTTP_STATUS_CODE", || 200)?;
            let attributes = json!({
                "status_code": status_code,
                "response_headers": headers.unwrap_or_default(),
                "response_body": body.unwrap_or_default(),
            });
            toxics.insert(
                ENV_HTTP_TOXIC_NAME.to_string(),
                ToxicSettings::new(crate::toxics::HTTP_TOXIC_TYPE, attributes),
            );
        }

        Ok(Self {
            logging: LogSettings::from_env()?,
            toxics,
        })
    }
}

pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: "".to_string(),
            reason: e.to_string(),
        }),
    }
}
