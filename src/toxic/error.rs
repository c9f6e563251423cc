#[derive(Debug, thiserror::Error)]
pub enum ToxicError {
    #[error("알 수 없는 toxic 타입: {0}")]
    UnknownType(String),

    #[error("이미 등록된 toxic 타입: {0}")]
    AlreadyRegistered(String),

    #[error("toxic {toxic} 설정 오류: {message}")]
    Config { toxic: String, message: String },

    #[error("toxic {toxic} 속성 파싱 실패: {source}")]
    Attributes {
        toxic: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("링크가 이미 닫혔습니다")]
    LinkClosed,

    #[error(transparent)]
    Task(#[from] tokio::task::JoinError),
}
