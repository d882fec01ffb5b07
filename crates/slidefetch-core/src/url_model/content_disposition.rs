//! Content-Disposition filename extraction (`filename` and RFC 8187 `filename*`).

use super::path::{percent_decode, percent_decode_bytes};

/// Returns the filename carried by a Content-Disposition header value.
///
/// `filename*` wins over `filename` when it is present and decodable. Quoted
/// values may contain `;` and backslash escapes.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for (name, value) in parameters(header_value) {
        if name.eq_ignore_ascii_case("filename*") {
            if let Some(decoded) = decode_ext_value(&value).filter(|v| !v.is_empty()) {
                extended = Some(decoded);
            }
        } else if name.eq_ignore_ascii_case("filename") && !value.is_empty() {
            plain = Some(value);
        }
    }

    extended.or(plain)
}

/// Splits `type; name=value; name="quoted"` into `(name, value)` pairs.
/// Segments without `=` (the disposition type, flags) are skipped.
fn parameters(header: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = header.chars().peekable();

    loop {
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ';' {
                break;
            }
            name.push(c);
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(';') => continue,
            Some(_) => {}
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
            }
        } else {
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
                value.push(c);
            }
            value = value.trim().to_string();
        }

        params.push((name.trim().to_string(), value));
    }

    params
}

/// Decodes an RFC 8187 `charset'language'value`. Only UTF-8 and ISO-8859-1
/// are understood.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;

    if charset.eq_ignore_ascii_case("utf-8") {
        Some(percent_decode(encoded))
    } else if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(percent_decode_bytes(encoded).into_iter().map(char::from).collect())
    } else {
        None
    }
}
