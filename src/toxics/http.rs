use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::{self, HeaderName, HeaderValue};
use hyper::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::http::{parse_headers, HttpResponse, ParseError};
use crate::toxic::{PipeExit, StreamChunk, Toxic, ToxicError, ToxicRegistry, ToxicStub};

pub const HTTP_TOXIC_TYPE: &str = "httptoxic";

/// 호스트에 알리는 선호 청크 크기.
/// 이보다 큰 응답은 여러 청크로 나뉘어 재작성되지 않고 그대로 통과합니다.
pub const HTTP_TOXIC_BUFFER_SIZE: usize = 1024;

/// HTTP toxic 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpToxicConfig {
    /// 응답 상태 코드 (기본값: 200)
    #[serde(default = "default_status_code")]
    pub status_code: u16,

    /// 덮어쓸 응답 헤더. 테이블 또는 `key:value;key:value` 문자열
    #[serde(default, deserialize_with = "deserialize_response_headers")]
    pub response_headers: HashMap<String, String>,

    /// 응답 본문
    #[serde(default)]
    pub response_body: String,
}

fn default_status_code() -> u16 {
    200
}

impl Default for HttpToxicConfig {
    fn default() -> Self {
        Self {
            status_code: default_status_code(),
            response_headers: HashMap::new(),
            response_body: String::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHeaders {
    Map(HashMap<String, String>),
    List(String),
}

fn deserialize_response_headers<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawHeaders::deserialize(deserializer)? {
        RawHeaders::Map(headers) => headers,
        RawHeaders::List(list) => parse_headers(&list),
    })
}

/// 청크 안의 완전한 HTTP 응답을 설정된 상태 코드/헤더/본문으로 바꾸는 toxic
#[derive(Debug)]
pub struct HttpToxic {
    config: HttpToxicConfig,
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl HttpToxic {
    pub fn new(config: HttpToxicConfig) -> Result<Self, ToxicError> {
        let status = StatusCode::from_u16(config.status_code)
            .map_err(|e| config_error(format!("상태 코드 {}: {}", config.status_code, e)))?;

        let mut headers = Vec::with_capacity(config.response_headers.len());
        for (name, value) in &config.response_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| config_error(format!("헤더 이름 {:?}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| config_error(format!("헤더 {} 값 {:?}: {}", name, value, e)))?;
            headers.push((header_name, header_value));
        }
        headers.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));

        let body = Bytes::from(config.response_body.clone());
        Ok(Self {
            config,
            status,
            headers,
            body,
        })
    }

    pub fn from_attributes(attributes: &Value) -> Result<Self, ToxicError> {
        let config = HttpToxicConfig::deserialize(attributes).map_err(|e| ToxicError::Attributes {
            toxic: HTTP_TOXIC_TYPE.to_string(),
            source: e,
        })?;
        Self::new(config)
    }

    pub fn register(registry: &mut ToxicRegistry) -> Result<(), ToxicError> {
        registry.register(HTTP_TOXIC_TYPE, create)
    }

    pub fn config(&self) -> &HttpToxicConfig {
        &self.config
    }

    /// 파싱된 응답에 설정을 적용합니다.
    ///
    /// 설정된 헤더는 기존 값을 덮어쓰고, 본문은 교체되며 길이는
    /// `Content-Length` 로 다시 계산됩니다. chunked 전송 방식은 남기지 않습니다.
    pub fn modify_response(&self, res: &mut HttpResponse) {
        for (name, value) in &self.headers {
            res.headers.insert(name.clone(), value.clone());
        }

        res.status = self.status;
        res.reason = None;
        res.body = self.body.clone();

        res.headers.remove(header::TRANSFER_ENCODING);
        res.headers.remove(header::TRAILER);
        res.headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(self.body.len()));
    }

    /// 청크 데이터 하나를 재작성된 응답 바이트로 바꿉니다.
    pub fn rewrite(&self, data: &Bytes) -> Result<Bytes, ParseError> {
        let mut res = HttpResponse::parse(data)?;
        self.modify_response(&mut res);
        Ok(res.to_bytes())
    }

    fn process_chunk(&self, mut chunk: StreamChunk) -> StreamChunk {
        match self.rewrite(&chunk.data) {
            Ok(data) => {
                debug!(
                    original_len = chunk.data.len(),
                    rewritten_len = data.len(),
                    status = %self.status,
                    "HTTP 응답 재작성"
                );
                chunk.data = data;
            }
            Err(e) => {
                debug!(len = chunk.data.len(), reason = %e, "HTTP 응답이 아님, 그대로 전달");
            }
        }
        chunk
    }
}

fn config_error(message: String) -> ToxicError {
    ToxicError::Config {
        toxic: HTTP_TOXIC_TYPE.to_string(),
        message,
    }
}

fn create(attributes: &Value) -> Result<Arc<dyn Toxic>, ToxicError> {
    let toxic: Arc<dyn Toxic> = Arc::new(HttpToxic::from_attributes(attributes)?);
    Ok(toxic)
}

#[async_trait]
impl Toxic for HttpToxic {
    fn name(&self) -> &str {
        HTTP_TOXIC_TYPE
    }

    fn buffer_size(&self) -> usize {
        HTTP_TOXIC_BUFFER_SIZE
    }

    async fn pipe(&self, stub: &mut ToxicStub) -> PipeExit {
        stub.pipe_with(|chunk| self.process_chunk(chunk)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn toxic() -> HttpToxic {
        HttpToxic::new(HttpToxicConfig {
            status_code: 503,
            response_headers: HashMap::from([
                ("Content-Type".to_string(), "application/json".to_string()),
                ("X-Toxic".to_string(), "http".to_string()),
            ]),
            response_body: r#"{"error":"unavailable"}"#.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_modify_response() {
        let raw = Bytes::from_static(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nServer: origin\r\nContent-Length: 2\r\n\r\nhi",
        );
        let mut res = HttpResponse::parse(&raw).unwrap();

        toxic().modify_response(&mut res);

        assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(res.headers["content-type"], "application/json");
        assert_eq!(res.headers["x-toxic"], "http");
        assert_eq!(res.headers["server"], "origin");
        assert_eq!(&res.body[..], br#"{"error":"unavailable"}"#);
        assert_eq!(res.headers["content-length"], "23");
    }

    #[test]
    fn test_chunked_becomes_content_length() {
        let raw = Bytes::from_static(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nTrailer: X-Sum\r\n\r\n3\r\nabc\r\n0\r\nX-Sum: 1\r\n\r\n",
        );

        let rewritten = toxic().rewrite(&raw).unwrap();
        let res = HttpResponse::parse(&rewritten).unwrap();

        assert!(res.headers.get("transfer-encoding").is_none());
        assert!(res.headers.get("trailer").is_none());
        assert_eq!(res.headers["content-length"], "23");
        assert_eq!(res.status.as_u16(), 503);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let toxic = toxic();
        let raw = Bytes::from_static(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nok\r\n0\r\n\r\n");

        let once = toxic.rewrite(&raw).unwrap();
        let twice = toxic.rewrite(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rewrite_rejects_partial_response() {
        let raw = Bytes::from_static(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial");
        assert!(toxic().rewrite(&raw).is_err());
    }

    #[test]
    fn test_config_from_attributes() {
        let toxic = HttpToxic::from_attributes(&json!({
            "status_code": 418,
            "response_headers": {"X-Tea": "earl grey"},
            "response_body": "short and stout",
        }))
        .unwrap();

        assert_eq!(toxic.config().status_code, 418);
        assert_eq!(toxic.config().response_headers["X-Tea"], "earl grey");
        assert_eq!(toxic.config().response_body, "short and stout");
    }

    #[test]
    fn test_config_header_list_string() {
        let toxic = HttpToxic::from_attributes(&json!({
            "response_headers": "Location: http://example.com:8080/;Retry-After: 5 ;broken",
        }))
        .unwrap();

        let headers = &toxic.config().response_headers;
        assert_eq!(toxic.config().status_code, 200);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Location"], "http://example.com:8080/");
        assert_eq!(headers["Retry-After"], "5");
    }

    #[test]
    fn test_invalid_config() {
        let result = HttpToxic::new(HttpToxicConfig {
            status_code: 42,
            ..Default::default()
        });
        assert!(matches!(result, Err(ToxicError::Config { .. })));

        let result = HttpToxic::from_attributes(&json!({
            "response_headers": {"bad header": "x"},
        }));
        assert!(matches!(result, Err(ToxicError::Config { .. })));

        let result = HttpToxic::from_attributes(&json!({"status_code": "teapot"}));
        assert!(matches!(result, Err(ToxicError::Attributes { .. })));
    }

    #[test]
    fn test_buffer_size_is_constant() {
        assert_eq!(toxic().buffer_size(), HTTP_TOXIC_BUFFER_SIZE);
        let empty = HttpToxic::new(HttpToxicConfig::default()).unwrap();
        assert_eq!(empty.buffer_size(), 1024);
    }
}
