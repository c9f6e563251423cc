//! 기본 제공 toxic 구현

pub mod http;
pub mod noop;

pub use http::{HttpToxic, HttpToxicConfig, HTTP_TOXIC_BUFFER_SIZE, HTTP_TOXIC_TYPE};
pub use noop::{NoopToxic, NOOP_TOXIC_TYPE};

use crate::toxic::{ToxicError, ToxicRegistry};

/// 기본 제공 toxic 들을 레지스트리에 등록합니다.
pub fn register_builtin(registry: &mut ToxicRegistry) -> Result<(), ToxicError> {
    NoopToxic::register(registry)?;
    HttpToxic::register(registry)?;
    Ok(())
}
