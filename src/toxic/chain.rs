use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error};

use super::{Toxic, ToxicLink, ToxicRegistry, DEFAULT_BUFFER_SIZE};
use crate::settings::{StreamDirection, ToxicSettings};

/// 한 방향에 적용되는 toxic 들의 순서 있는 목록
#[derive(Clone)]
pub struct ToxicChain {
    direction: StreamDirection,
    toxics: Vec<(String, Arc<dyn Toxic>)>,
}

impl ToxicChain {
    pub fn new(direction: StreamDirection) -> Self {
        Self {
            direction,
            toxics: Vec::new(),
        }
    }

    /// 설정에서 체인을 구성합니다.
    ///
    /// 방향이 다르거나 비활성화된 항목은 제외하고, `order` 와 이름 순으로
    /// 정렬합니다. 생성에 실패한 toxic 은 로그를 남기고 건너뜁니다.
    pub fn from_settings(
        registry: &ToxicRegistry,
        configs: &HashMap<String, ToxicSettings>,
        direction: StreamDirection,
    ) -> Self {
        let mut chain = Self::new(direction);

        let mut ordered: Vec<_> = configs
            .iter()
            .filter(|(_, config)| config.enabled && config.stream == direction)
            .collect();
        ordered.sort_by(|(a_name, a), (b_name, b)| a.order.cmp(&b.order).then_with(|| a_name.cmp(b_name)));

        for (name, config) in ordered {
            debug!(toxic = %name, toxic_type = %config.toxic_type, "toxic 생성 시작");
            match registry.create(&config.toxic_type, &config.attributes) {
                Ok(toxic) => chain.add(name.clone(), toxic),
                Err(e) => {
                    error!(toxic = %name, error = %e, "toxic 생성 실패");
                    continue;
                }
            }
        }

        chain
    }

    pub fn add(&mut self, name: impl Into<String>, toxic: Arc<dyn Toxic>) {
        self.toxics.push((name.into(), toxic));
    }

    pub fn direction(&self) -> StreamDirection {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.toxics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toxics.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.toxics.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// 체인 안에서 가장 작은 선호 청크 크기
    pub fn buffer_size(&self) -> usize {
        self.toxics
            .iter()
            .map(|(_, toxic)| toxic.buffer_size())
            .min()
            .unwrap_or(DEFAULT_BUFFER_SIZE)
    }

    /// 체인의 각 단계를 작업으로 띄운 새 링크를 만듭니다.
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn link(&self) -> ToxicLink {
        ToxicLink::start(&self.toxics, self.direction)
    }
}
