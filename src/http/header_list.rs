use std::collections::HashMap;

/// `key1:value1;key2:value2` 형식의 헤더 목록을 파싱합니다.
///
/// 각 항목은 첫 번째 `:` 에서만 분리되므로 값에 `:` 가 포함될 수 있습니다.
/// `:` 가 없는 항목은 조용히 무시되고, 중복된 키는 나중 값이 덮어씁니다.
///
/// ```
/// use http_toxic::http::parse_headers;
///
/// let headers = parse_headers("a:1;b: 2 ;bad");
/// assert_eq!(headers.len(), 2);
/// assert_eq!(headers["b"], "2");
/// ```
pub fn parse_headers(header_list: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    if header_list.is_empty() {
        return headers;
    }

    for pair in header_list.split(';') {
        if let Some((name, value)) = split_pair(pair) {
            headers.insert(name.to_string(), value.to_string());
        }
    }

    headers
}

/// 헤더 이름과 값 분리
fn split_pair(pair: &str) -> Option<(&str, &str)> {
    let (name, value) = pair.split_once(':')?;
    Some((name.trim(), value.trim()))
}
