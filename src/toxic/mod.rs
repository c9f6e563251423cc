//! toxic 트레이트와 링크 구성 요소
//!
//! 호스트는 [`ToxicRegistry`] 에 toxic 타입을 등록하고, [`ToxicChain`] 으로
//! 한 방향의 체인을 만든 뒤 [`ToxicLink`] 로 실행합니다.

mod chain;
mod error;
mod link;
mod registry;
mod stub;
mod traits;

pub use chain::ToxicChain;
pub use error::ToxicError;
pub use link::{InterruptedStage, LinkWriter, ToxicLink, LINK_CHANNEL_CAPACITY};
pub use registry::{ToxicFactory, ToxicRegistry};
pub use stub::{PipeExit, StreamChunk, StubControl, ToxicStub};
pub use traits::{Toxic, DEFAULT_BUFFER_SIZE};
