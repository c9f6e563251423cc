use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::{Toxic, ToxicError};

/// 속성 값으로부터 toxic 인스턴스를 만드는 생성 함수
pub type ToxicFactory = fn(&Value) -> Result<Arc<dyn Toxic>, ToxicError>;

/// toxic 타입 이름과 생성 함수의 명시적 레지스트리
///
/// 호스트가 초기화 시점에 직접 채웁니다. 각 toxic 은 자신의 `register`
/// 함수를 통해 등록됩니다.
#[derive(Default, Clone)]
pub struct ToxicRegistry {
    factories: HashMap<String, ToxicFactory>,
}

impl ToxicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_name: &str, factory: ToxicFactory) -> Result<(), ToxicError> {
        if self.factories.contains_key(type_name) {
            return Err(ToxicError::AlreadyRegistered(type_name.to_string()));
        }

        debug!(toxic_type = %type_name, "toxic 타입 등록");
        self.factories.insert(type_name.to_string(), factory);
        Ok(())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// 등록된 타입 이름 (정렬됨)
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 타입 이름으로 새 toxic 을 생성합니다. `Null` 속성은 빈 객체로 취급합니다.
    pub fn create(&self, type_name: &str, attributes: &Value) -> Result<Arc<dyn Toxic>, ToxicError> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| ToxicError::UnknownType(type_name.to_string()))?;

        let empty = Value::Object(Default::default());
        let attributes = if attributes.is_null() { &empty } else { attributes };
        factory(attributes)
    }
}
