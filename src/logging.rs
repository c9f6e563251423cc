use std::path::Path;

use tracing::{error, info, info_span, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use crate::settings::{LogFormat, LogOutput, LogSettings, StreamDirection};
use crate::toxic::PipeExit;

/// 로그 설정에 따라 전역 subscriber 를 초기화합니다.
///
/// 반환된 guard 가 살아 있는 동안 비동기 writer 가 로그를 내보냅니다.
/// 이미 subscriber 가 설정되어 있으면 `None` 을 반환합니다.
pub fn init_logging(settings: &LogSettings) -> Option<WorkerGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(settings.level).into())
        .from_env_lossy();

    let (writer, guard) = match &settings.output {
        LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::File(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().unwrap_or(path.as_os_str());
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let result = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    match result {
        Ok(()) => Some(guard),
        Err(e) => {
            eprintln!("로깅 초기화 실패: {}", e);
            None
        }
    }
}

/// 링크의 한 단계가 끝났을 때 남기는 기록
#[derive(Debug)]
pub struct LinkLog {
    pub link_id: String,
    pub direction: StreamDirection,
    pub toxic: String,
    pub exit: Option<PipeExit>,
    pub closed: bool,
    pub error: Option<String>,
}

impl LinkLog {
    pub fn new(link_id: String, direction: StreamDirection, toxic: String) -> Self {
        Self {
            link_id,
            direction,
            toxic,
            exit: None,
            closed: false,
            error: None,
        }
    }

    pub fn with_exit(&mut self, exit: PipeExit, closed: bool) {
        self.exit = Some(exit);
        self.closed = closed;
    }

    pub fn with_error(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }

    fn level(&self) -> Level {
        match (&self.error, self.exit) {
            (Some(_), _) => Level::ERROR,
            (None, Some(PipeExit::OutputDropped)) => Level::WARN,
            _ => Level::INFO,
        }
    }
}

pub fn log_link(log: &LinkLog) {
    let span = info_span!(
        "link",
        link_id = %log.link_id,
        direction = %log.direction,
        toxic = %log.toxic,
    );
    let _enter = span.enter();

    match log.level() {
        Level::ERROR => error!(error = ?log.error, "toxic 작업 실패"),
        Level::WARN => warn!(exit = ?log.exit, "다음 단계가 사라져 toxic 종료"),
        _ => info!(exit = ?log.exit, closed = log.closed, "toxic 종료"),
    }
}
