use bytes::Bytes;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// 링크를 따라 흐르는 데이터 단위
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    pub data: Bytes,
    /// 청크가 파이프라인에 들어온 시각
    pub timestamp: Instant,
}

impl StreamChunk {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            timestamp: Instant::now(),
        }
    }
}

/// 파이프 루프가 끝난 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeExit {
    /// 인터럽트 신호로 종료. `close` 는 호출되지 않음
    Interrupted,
    /// nil 청크를 받아 `close` 후 종료
    Closed,
    /// 다음 단계가 사라져 더 이상 전달할 수 없음
    OutputDropped,
}

/// 하나의 toxic 에 연결된 링크의 toxic 쪽 끝
///
/// `input` 에서 `None` 이 오거나 모든 송신자가 사라지면 스트림의 끝입니다.
pub struct ToxicStub {
    pub input: mpsc::Receiver<Option<StreamChunk>>,
    pub output: mpsc::Sender<Option<StreamChunk>>,
    pub interrupt: mpsc::Receiver<()>,
    closed: Option<oneshot::Sender<()>>,
}

/// 호스트가 보관하는 스텁 제어 핸들
pub struct StubControl {
    pub interrupt: mpsc::Sender<()>,
    /// 스텁이 `close` 되면 완료됩니다.
    pub closed: oneshot::Receiver<()>,
}

impl ToxicStub {
    pub fn new(
        input: mpsc::Receiver<Option<StreamChunk>>,
        output: mpsc::Sender<Option<StreamChunk>>,
    ) -> (Self, StubControl) {
        let (interrupt_tx, interrupt_rx) = mpsc::channel(1);
        let (closed_tx, closed_rx) = oneshot::channel();

        let stub = Self {
            input,
            output,
            interrupt: interrupt_rx,
            closed: Some(closed_tx),
        };
        let control = StubControl {
            interrupt: interrupt_tx,
            closed: closed_rx,
        };
        (stub, control)
    }

    /// 이 방향의 스트림을 닫습니다.
    ///
    /// nil 센티널을 다음 단계로 전달하고 호스트에 종료를 알립니다. 두 번째
    /// 호출부터는 아무것도 하지 않고 `false` 를 반환합니다.
    pub async fn close(&mut self) -> bool {
        let Some(closed) = self.closed.take() else {
            return false;
        };

        // 다음 단계가 이미 사라졌어도 종료 통지는 계속 진행
        let _ = self.output.send(None).await;
        let _ = closed.send(());
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_none()
    }

    /// 청크마다 `transform` 을 적용해 순서대로 전달하는 기본 파이프 루프
    ///
    /// 인터럽트와 입력이 동시에 준비되어 있으면 인터럽트가 우선합니다.
    /// 인터럽트 핸들이 버려진 경우에는 인터럽트 없이 계속 동작합니다.
    pub async fn pipe_with<F>(&mut self, mut transform: F) -> PipeExit
    where
        F: FnMut(StreamChunk) -> StreamChunk + Send,
    {
        loop {
            tokio::select! {
                biased;

                Some(()) = self.interrupt.recv() => {
                    debug!("인터럽트 수신, 파이프 종료");
                    return PipeExit::Interrupted;
                }
                chunk = self.input.recv() => {
                    let Some(chunk) = chunk.flatten() else {
                        debug!("스트림 종료, 링크 닫음");
                        self.close().await;
                        return PipeExit::Closed;
                    };

                    if self.output.send(Some(transform(chunk))).await.is_err() {
                        return PipeExit::OutputDropped;
                    }
                }
            }
        }
    }
}
