use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// toxic 이 적용되는 스트림 방향
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamDirection {
    /// 클라이언트 → 업스트림
    Upstream,
    /// 업스트림 → 클라이언트 (HTTP 응답이 흐르는 방향)
    #[default]
    Downstream,
}

impl fmt::Display for StreamDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Downstream => write!(f, "downstream"),
        }
    }
}

impl FromStr for StreamDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upstream" => Ok(Self::Upstream),
            "downstream" => Ok(Self::Downstream),
            _ => Err(format!("Invalid stream direction: {}", s)),
        }
    }
}

/// 설정 파일의 toxic 항목
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToxicSettings {
    /// 레지스트리에 등록된 toxic 타입 이름
    #[serde(rename = "type")]
    pub toxic_type: String,

    #[serde(default)]
    pub stream: StreamDirection,

    /// 활성화 여부
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// 실행 순서 (낮은 숫자가 먼저 실행)
    #[serde(default)]
    pub order: i32,

    /// toxic 별 속성
    #[serde(default)]
    pub attributes: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

impl ToxicSettings {
    pub fn new(toxic_type: impl Into<String>, attributes: serde_json::Value) -> Self {
        Self {
            toxic_type: toxic_type.into(),
            stream: StreamDirection::default(),
            enabled: default_enabled(),
            order: 0,
            attributes,
        }
    }
}
