//! Shared form/query parsing and JSON response helpers for route handlers.

use std::str::FromStr;

/// Parse a URL-encoded form body into key-value pairs.
/// Handles `key=value&key2=value2` (host POST bodies).
pub fn parse_form_body(body: &str) -> Vec<(String, String)> {
    if body.is_empty() {
        return Vec::new();
    }
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, val) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(val))
        })
        .collect()
}

/// Percent-decode a URL-encoded value. Multi-byte UTF-8 sequences survive;
/// malformed escapes are kept literally.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(val) => {
                        out.push(val);
                        i += 3;
                    }
                    Err(_) => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse a query string into key-value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let q = query.strip_prefix('?').unwrap_or(query);
    parse_form_body(q)
}

/// Value for `key`, if present.
pub fn get_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Parsed value for `key`; None when missing or unparsable.
pub fn get_parsed<T: FromStr>(params: &[(String, String)], key: &str) -> Option<T> {
    get_param(params, key).and_then(|v| v.trim().parse().ok())
}

/// Boolean form field: `true`, `1`, `on` and `yes` count as set.
pub fn get_flag(params: &[(String, String)], key: &str) -> bool {
    matches!(
        get_param(params, key).map(|v| v.trim().to_ascii_lowercase()),
        Some(v) if v == "true" || v == "1" || v == "on" || v == "yes"
    )
}

/// `{"error": message}` document.
pub fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
