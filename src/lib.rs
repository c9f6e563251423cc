//! http_toxic 은 장애 주입 프록시의 연결 파이프라인에 끼워지는 HTTP 응답 재작성 toxic 입니다.
//!
//! # 주요 기능
//!
//! - 청크 하나에 담긴 완전한 HTTP 응답의 상태 코드, 헤더, 본문 교체
//! - 파싱할 수 없는 청크는 그대로 전달 (fail-open)
//! - 인터럽트를 통한 협조적 취소
//! - 명시적 toxic 레지스트리
//!
//! 청크 경계를 넘는 응답은 재조립하지 않습니다. HTTP toxic 이 알리는 선호
//! 청크 크기는 1024 바이트입니다.
//!
//! # 예제
//!
//! ```
//! use http_toxic::toxic::{Toxic, ToxicRegistry};
//! use http_toxic::toxics::register_builtin;
//! use serde_json::json;
//!
//! let mut registry = ToxicRegistry::new();
//! register_builtin(&mut registry).unwrap();
//!
//! // 헤더는 "key:value;key:value" 문자열로도 지정할 수 있음
//! let toxic = registry
//!     .create("httptoxic", &json!({
//!         "status_code": 503,
//!         "response_headers": "Retry-After: 30; Content-Type: text/plain",
//!         "response_body": "maintenance",
//!     }))
//!     .unwrap();
//!
//! assert_eq!(toxic.buffer_size(), 1024);
//! ```
//!
//! # 링크 실행
//!
//! ```
//! use http_toxic::settings::StreamDirection;
//! use http_toxic::toxic::ToxicChain;
//! use http_toxic::toxics::HttpToxic;
//! use http_toxic::toxics::HttpToxicConfig;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut chain = ToxicChain::new(StreamDirection::Downstream);
//! let toxic = HttpToxic::new(HttpToxicConfig {
//!     status_code: 500,
//!     ..Default::default()
//! }).unwrap();
//! chain.add("broken", Arc::new(toxic));
//!
//! let mut link = chain.link();
//! link.write(&b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok"[..]).await.unwrap();
//! link.finish().await.unwrap();
//!
//! let chunk = link.read().await.unwrap();
//! assert!(chunk.data.starts_with(b"HTTP/1.1 500 Internal Server Error\r\n"));
//! # }
//! ```

pub mod http;
pub mod logging;
pub mod settings;
pub mod toxic;
pub mod toxics;
