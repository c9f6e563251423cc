//! HTTP 응답 파싱/직렬화와 헤더 목록 파서
//!
//! 스트림 청크 하나에 담긴 바이트만 사용하며, 여러 청크에 걸친 응답은
//! 재조립하지 않습니다.

mod error;
mod header_list;
mod response;

pub use error::ParseError;
pub use header_list::parse_headers;
pub use response::HttpResponse;
