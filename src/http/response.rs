use bytes::{BufMut, Bytes, BytesMut};
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::{StatusCode, Version};

use super::ParseError;

/// 한 번에 파싱할 수 있는 최대 헤더 개수
const MAX_HEADERS: usize = 64;

/// 단일 버퍼에서 파싱된 HTTP/1.x 응답
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub version: Version,
    pub status: StatusCode,
    /// 원본 reason phrase. `None` 이면 상태 코드의 표준 문구를 사용합니다.
    pub reason: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// 본문 길이 결정 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFraming {
    Empty,
    Chunked,
    Length(usize),
    UntilEnd,
}

impl HttpResponse {
    /// 버퍼 전체를 정확히 하나의 완전한 응답으로 파싱합니다.
    ///
    /// 재조립은 하지 않습니다. 헤더나 본문이 잘려 있거나 응답 뒤에 다른
    /// 바이트가 남아 있으면 실패합니다.
    pub fn parse(buf: &Bytes) -> Result<Self, ParseError> {
        let mut raw_headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut raw = httparse::Response::new(&mut raw_headers);

        let head_len = match raw.parse(buf)? {
            httparse::Status::Complete(len) => len,
            httparse::Status::Partial => return Err(ParseError::IncompleteHead),
        };

        let version = match raw.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            _ => return Err(ParseError::IncompleteHead),
        };
        let code = raw.code.ok_or(ParseError::IncompleteHead)?;
        let status = StatusCode::from_u16(code).map_err(|_| ParseError::InvalidStatus(code))?;

        let mut headers = HeaderMap::with_capacity(raw.headers.len());
        for h in raw.headers.iter() {
            let name = HeaderName::from_bytes(h.name.as_bytes()).map_err(|e| {
                ParseError::InvalidHeader {
                    name: h.name.to_string(),
                    reason: e.to_string(),
                }
            })?;
            let value = HeaderValue::from_bytes(h.value).map_err(|e| ParseError::InvalidHeader {
                name: h.name.to_string(),
                reason: e.to_string(),
            })?;
            headers.append(name, value);
        }

        let mut response = Self {
            version,
            status,
            reason: raw.reason.map(str::to_string),
            headers,
            body: Bytes::new(),
        };

        let rest = buf.slice(head_len..);
        let (body, consumed) = match response.body_framing()? {
            BodyFraming::Empty => (Bytes::new(), 0),
            BodyFraming::Length(len) => {
                if rest.len() < len {
                    return Err(ParseError::IncompleteBody {
                        expected: len,
                        actual: rest.len(),
                    });
                }
                (rest.slice(..len), len)
            }
            BodyFraming::Chunked => decode_chunked(&rest)?,
            BodyFraming::UntilEnd => (rest.clone(), rest.len()),
        };

        if consumed < rest.len() {
            return Err(ParseError::TrailingBytes(rest.len() - consumed));
        }

        response.body = body;
        Ok(response)
    }

    fn body_framing(&self) -> Result<BodyFraming, ParseError> {
        // https://datatracker.ietf.org/doc/html/rfc7230#section-3.3.3
        if self.status.is_informational()
            || self.status == StatusCode::NO_CONTENT
            || self.status == StatusCode::NOT_MODIFIED
        {
            return Ok(BodyFraming::Empty);
        }

        if let Some(encoding) = self.headers.get_all(header::TRANSFER_ENCODING).iter().last() {
            let is_chunked = encoding
                .to_str()
                .ok()
                .and_then(|v| v.rsplit(',').next())
                .map(|v| v.trim().eq_ignore_ascii_case("chunked"))
                .unwrap_or(false);
            return Ok(if is_chunked {
                BodyFraming::Chunked
            } else {
                BodyFraming::UntilEnd
            });
        }

        let mut content_length = None;
        for value in self.headers.get_all(header::CONTENT_LENGTH) {
            let text = value
                .to_str()
                .map_err(|e| ParseError::InvalidContentLength(e.to_string()))?;
            let digits = text.trim();
            // usize::from_str 는 앞의 '+' 를 허용하므로 숫자만 받음
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseError::InvalidContentLength(text.to_string()));
            }
            let len = digits
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength(text.to_string()))?;
            match content_length {
                Some(prev) if prev != len => {
                    return Err(ParseError::InvalidContentLength(format!("{} != {}", prev, len)))
                }
                _ => content_length = Some(len),
            }
        }

        Ok(match content_length {
            Some(len) => BodyFraming::Length(len),
            None => BodyFraming::UntilEnd,
        })
    }

    /// 상태 줄, 헤더, 본문을 순서대로 직렬화합니다.
    ///
    /// 헤더는 이름 순으로 정렬되어 Title-Case 로 기록되므로 같은 응답은 항상
    /// 같은 바이트열이 됩니다.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(256 + self.body.len());

        let version = if self.version == Version::HTTP_10 {
            "HTTP/1.0"
        } else {
            "HTTP/1.1"
        };
        let reason = self
            .reason
            .as_deref()
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("");
        dst.put_slice(version.as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.status.as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(reason.as_bytes());
        dst.put_slice(b"\r\n");

        let mut names: Vec<&HeaderName> = self.headers.keys().collect();
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for name in names {
            for value in self.headers.get_all(name) {
                put_title_case(&mut dst, name.as_str().as_bytes());
                dst.put_slice(b": ");
                dst.put_slice(value.as_bytes());
                dst.put_slice(b"\r\n");
            }
        }
        dst.put_slice(b"\r\n");
        dst.put_slice(&self.body);

        dst.freeze()
    }
}

/// chunked 본문을 디코딩하고 (본문, 소비한 바이트 수)를 반환합니다.
fn decode_chunked(buf: &Bytes) -> Result<(Bytes, usize), ParseError> {
    let mut body = BytesMut::new();
    let mut pos = 0;

    loop {
        let (offset, size) = match httparse::parse_chunk_size(&buf[pos..]) {
            Ok(httparse::Status::Complete(v)) => v,
            Ok(httparse::Status::Partial) => {
                return Err(ParseError::IncompleteBody {
                    expected: pos + 1,
                    actual: buf.len(),
                })
            }
            Err(_) => return Err(ParseError::InvalidChunk("chunk size".to_string())),
        };
        pos += offset;
        if size == 0 {
            break;
        }

        let size = usize::try_from(size)
            .map_err(|_| ParseError::InvalidChunk(format!("chunk size {}", size)))?;
        let data_end = pos
            .checked_add(size)
            .ok_or_else(|| ParseError::InvalidChunk(format!("chunk size {}", size)))?;
        if buf.len() < data_end + 2 {
            return Err(ParseError::IncompleteBody {
                expected: data_end + 2,
                actual: buf.len(),
            });
        }
        body.put_slice(&buf[pos..data_end]);
        if &buf[data_end..data_end + 2] != b"\r\n" {
            return Err(ParseError::InvalidChunk("missing CRLF after chunk data".to_string()));
        }
        pos = data_end + 2;
    }

    // trailer 헤더는 버리고 빈 줄까지 소비
    loop {
        let rest = &buf[pos..];
        let line_end = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(ParseError::IncompleteBody {
                expected: buf.len() + 1,
                actual: buf.len(),
            })?;
        let line = &rest[..line_end];
        pos += line_end + 1;
        if line.is_empty() || line == b"\r" {
            break;
        }
    }

    Ok((body.freeze(), pos))
}

fn put_title_case(dst: &mut BytesMut, name: &[u8]) {
    let mut upper = true;
    for &b in name {
        dst.put_u8(if upper { b.to_ascii_uppercase() } else { b });
        upper = b == b'-';
    }
}
