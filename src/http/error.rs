/// 청크 안의 바이트를 HTTP 응답으로 해석하지 못한 이유
///
/// 파이프 루프에서는 이 에러를 호출자에게 올리지 않고 청크를 그대로 전달합니다.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("응답 헤더가 불완전함")]
    IncompleteHead,

    #[error("응답 헤더 형식 오류: {0}")]
    InvalidHead(#[from] httparse::Error),

    #[error("상태 코드 오류: {0}")]
    InvalidStatus(u16),

    #[error("헤더 {name} 오류: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Content-Length 값 오류: {0}")]
    InvalidContentLength(String),

    #[error("본문이 불완전함 (필요: {expected}, 실제: {actual})")]
    IncompleteBody { expected: usize, actual: usize },

    #[error("chunked 본문 형식 오류: {0}")]
    InvalidChunk(String),

    #[error("응답 뒤에 {0} 바이트가 남음")]
    TrailingBytes(usize),
}
