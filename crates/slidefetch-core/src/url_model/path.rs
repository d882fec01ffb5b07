//! Basename extraction from URLs.

/// Returns the percent-decoded last path segment of `url`.
///
/// Query string and fragment are ignored. Strings that do not parse as an
/// absolute URL are split on `/` after dropping any `?query` or `#fragment`.
/// Returns `None` when there is no non-empty segment.
pub fn url_basename(url: &str) -> Option<String> {
    let segment = match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(str::to_string),
        Err(_) => {
            let path = url.split(['?', '#']).next().unwrap_or_default();
            path.rsplit('/').find(|s| !s.is_empty()).map(str::to_string)
        }
    }?;
    let decoded = percent_decode(&segment);
    (!decoded.is_empty()).then_some(decoded)
}

/// Decodes `%XX` escapes; malformed escapes are kept verbatim and invalid
/// UTF-8 is replaced.
pub(super) fn percent_decode(input: &str) -> String {
    String::from_utf8_lossy(&percent_decode_bytes(input)).into_owned()
}

pub(super) fn percent_decode_bytes(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
