use super::{PipeExit, ToxicStub};
use async_trait::async_trait;

/// 호스트가 읽기 버퍼 크기를 정할 때 쓰는 기본값
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Toxic 트레이트
///
/// 연결의 한 방향에 끼워져 스트림 청크를 변형하는 단계입니다.
#[async_trait]
pub trait Toxic: Send + Sync {
    /// 레지스트리에 등록되는 toxic 타입 이름을 반환합니다.
    fn name(&self) -> &str;

    /// 이 단계가 선호하는 청크 크기 (바이트)
    fn buffer_size(&self) -> usize {
        DEFAULT_BUFFER_SIZE
    }

    /// 인터럽트나 스트림 종료까지 `stub` 의 입력을 처리해 출력으로 보냅니다.
    async fn pipe(&self, stub: &mut ToxicStub) -> PipeExit;
}
