use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use super::{PipeExit, StreamChunk, StubControl, Toxic, ToxicError, ToxicStub};
use crate::logging::{log_link, LinkLog};
use crate::settings::StreamDirection;
use crate::toxics::NoopToxic;

/// 단계 사이 채널에 대기할 수 있는 청크 수
pub const LINK_CHANNEL_CAPACITY: usize = 16;

struct Stage {
    name: String,
    control: StubControl,
    task: JoinHandle<(ToxicStub, PipeExit)>,
}

/// 인터럽트로 멈춘 단계
pub struct InterruptedStage {
    pub name: String,
    pub stub: ToxicStub,
    pub exit: PipeExit,
    /// 단계가 멈추기를 기다리는 동안 출력에서 읽어 낸 청크.
    /// 다음 단계 스텁의 `input` 에 남아 있는 청크보다 앞섭니다.
    pub drained: Vec<StreamChunk>,
}

/// 링크 입력 쪽 핸들. 읽기와 동시에 쓰기 위해 복제할 수 있습니다.
#[derive(Clone)]
pub struct LinkWriter {
    input: mpsc::Sender<Option<StreamChunk>>,
}

impl LinkWriter {
    pub async fn write(&self, data: impl Into<Bytes>) -> Result<(), ToxicError> {
        self.input
            .send(Some(StreamChunk::new(data)))
            .await
            .map_err(|_| ToxicError::LinkClosed)
    }

    /// nil 센티널을 보내 스트림을 끝냅니다.
    pub async fn finish(&self) -> Result<(), ToxicError> {
        self.input.send(None).await.map_err(|_| ToxicError::LinkClosed)
    }
}

/// 연결 한 방향의 toxic 파이프라인
///
/// 첫 단계는 항상 noop toxic 이므로 빈 체인도 그대로 통과시킵니다.
pub struct ToxicLink {
    id: Uuid,
    direction: StreamDirection,
    writer: LinkWriter,
    output: mpsc::Receiver<Option<StreamChunk>>,
    stages: Vec<Stage>,
}

impl ToxicLink {
    pub fn start(toxics: &[(String, Arc<dyn Toxic>)], direction: StreamDirection) -> Self {
        let id = Uuid::new_v4();
        let (input, mut upstream) = mpsc::channel(LINK_CHANNEL_CAPACITY);

        let noop: Arc<dyn Toxic> = Arc::new(NoopToxic);
        let all = std::iter::once(("noop".to_string(), noop)).chain(toxics.iter().cloned());

        let mut stages = Vec::with_capacity(toxics.len() + 1);
        for (name, toxic) in all {
            let (tx, rx) = mpsc::channel(LINK_CHANNEL_CAPACITY);
            let (mut stub, control) = ToxicStub::new(upstream, tx);
            upstream = rx;

            debug!(link = %id, direction = %direction, toxic = %name, "toxic 단계 시작");
            let task = tokio::spawn(async move {
                let exit = toxic.pipe(&mut stub).await;
                (stub, exit)
            });
            stages.push(Stage { name, control, task });
        }

        Self {
            id,
            direction,
            writer: LinkWriter { input },
            output: upstream,
            stages,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn direction(&self) -> StreamDirection {
        self.direction
    }

    pub fn writer(&self) -> LinkWriter {
        self.writer.clone()
    }

    pub async fn write(&self, data: impl Into<Bytes>) -> Result<(), ToxicError> {
        self.writer.write(data).await
    }

    pub async fn finish(&self) -> Result<(), ToxicError> {
        self.writer.finish().await
    }

    /// 마지막 단계의 다음 청크. 스트림이 끝나면 `None`
    pub async fn read(&mut self) -> Option<StreamChunk> {
        self.output.recv().await.flatten()
    }

    /// 모든 단계에 인터럽트를 보내고 스텁을 돌려받습니다.
    ///
    /// 마지막 단계부터 멈추며, 각 단계가 끝나기를 기다리는 동안 그 단계의
    /// 출력을 계속 읽어 가득 찬 채널에 막힌 단계도 인터럽트를 볼 수 있게 합니다.
    /// 이렇게 읽어 낸 청크는 [`InterruptedStage::drained`] 에 순서대로 담깁니다.
    /// 이미 끝난 단계의 스텁도 함께 반환됩니다.
    pub async fn interrupt(self) -> Result<Vec<InterruptedStage>, ToxicError> {
        let link_id = self.id.to_string();
        let mut output = self.output;
        let mut stopped: Vec<InterruptedStage> = Vec::with_capacity(self.stages.len());

        for mut stage in self.stages.into_iter().rev() {
            // 가득 차 있으면 이미 인터럽트가 대기 중, 닫혀 있으면 이미 종료된 단계
            let _ = stage.control.interrupt.try_send(());

            let downstream = match stopped.last_mut() {
                Some(next) => &mut next.stub.input,
                None => &mut output,
            };

            let mut drained = Vec::new();
            let mut open = true;
            let joined = loop {
                tokio::select! {
                    result = &mut stage.task => break result,
                    chunk = downstream.recv(), if open => match chunk {
                        Some(Some(chunk)) => drained.push(chunk),
                        Some(None) => {}
                        None => open = false,
                    },
                }
            };

            let mut log = LinkLog::new(link_id.clone(), self.direction, stage.name.clone());
            let (stub, exit) = match joined {
                Ok(joined) => joined,
                Err(e) => {
                    log.with_error(&e);
                    log_link(&log);
                    return Err(e.into());
                }
            };
            log.with_exit(exit, stage.control.closed.try_recv().is_ok());
            log_link(&log);

            // 링크 출력에 남은 청크는 버려지지 않도록 마지막 단계에 붙임
            if stopped.is_empty() {
                while let Ok(chunk) = output.try_recv() {
                    drained.extend(chunk);
                }
            }

            debug!(link = %link_id, toxic = %stage.name, drained = drained.len(), "toxic 단계 인터럽트");
            stopped.push(InterruptedStage {
                name: stage.name,
                stub,
                exit,
                drained,
            });
        }

        stopped.reverse();
        Ok(stopped)
    }

    /// 모든 단계가 끝날 때까지 기다립니다.
    pub async fn wait(self) -> Result<Vec<PipeExit>, ToxicError> {
        let stubs = self.join().await?;
        Ok(stubs.into_iter().map(|(_, exit)| exit).collect())
    }

    async fn join(self) -> Result<Vec<(ToxicStub, PipeExit)>, ToxicError> {
        let link_id = self.id.to_string();
        let mut results = Vec::with_capacity(self.stages.len());

        for mut stage in self.stages {
            let mut log = LinkLog::new(link_id.clone(), self.direction, stage.name);
            match stage.task.await {
                Ok((stub, exit)) => {
                    log.with_exit(exit, stage.control.closed.try_recv().is_ok());
                    log_link(&log);
                    results.push((stub, exit));
                }
                Err(e) => {
                    log.with_error(&e);
                    log_link(&log);
                    return Err(e.into());
                }
            }
        }

        Ok(results)
    }
}
