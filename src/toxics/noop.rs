use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::toxic::{PipeExit, Toxic, ToxicError, ToxicRegistry, ToxicStub};

pub const NOOP_TOXIC_TYPE: &str = "noop";

/// 청크를 그대로 전달하는 toxic
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToxic;

impl NoopToxic {
    pub fn register(registry: &mut ToxicRegistry) -> Result<(), ToxicError> {
        registry.register(NOOP_TOXIC_TYPE, create)
    }
}

fn create(_attributes: &Value) -> Result<Arc<dyn Toxic>, ToxicError> {
    Ok(Arc::new(NoopToxic))
}

#[async_trait]
impl Toxic for NoopToxic {
    fn name(&self) -> &str {
        NOOP_TOXIC_TYPE
    }

    async fn pipe(&self, stub: &mut ToxicStub) -> PipeExit {
        stub.pipe_with(|chunk| chunk).await
    }
}
