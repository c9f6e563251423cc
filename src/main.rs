use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{error, info};

use http_toxic::logging::init_logging;
use http_toxic::settings::{Settings, StreamDirection};
use http_toxic::toxic::{ToxicChain, ToxicRegistry};
use http_toxic::toxics::register_builtin;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 표준 입력을 downstream toxic 체인에 통과시켜 표준 출력으로 내보냅니다.
#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let settings = Settings::load().await?;
    let _guard = init_logging(&settings.logging);

    let mut registry = ToxicRegistry::new();
    register_builtin(&mut registry)?;
    info!(types = ?registry.type_names(), "toxic 타입 등록 완료");

    let chain = ToxicChain::from_settings(&registry, &settings.toxics, StreamDirection::Downstream);
    let buffer_size = chain.buffer_size();
    info!(toxics = ?chain.names(), buffer_size, "toxic 체인 구성 완료");

    let mut link = chain.link();
    let writer = link.writer();

    let reader = tokio::spawn(async move {
        let mut stdin = tokio::io::stdin();
        let mut buf = vec![0u8; buffer_size];
        loop {
            let n = stdin.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.write(Bytes::copy_from_slice(&buf[..n])).await?;
        }
        writer.finish().await?;
        Ok::<(), BoxError>(())
    });

    let mut stdout = tokio::io::stdout();
    while let Some(chunk) = link.read().await {
        stdout.write_all(&chunk.data).await?;
    }
    stdout.flush().await?;

    if let Err(e) = reader.await? {
        error!(error = %e, "입력 처리 실패");
        return Err(e);
    }

    let exits = link.wait().await?;
    info!(exits = ?exits, "링크 종료");
    Ok(())
}
