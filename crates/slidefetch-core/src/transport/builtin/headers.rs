//! Response header lines as libcurl hands them to the header callback.

/// Headers of the response currently being received. A new status line
/// (redirect, `100 Continue`) starts over.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(super) struct ResponseHeaders {
    pub status: Option<u32>,
    pub content_length: Option<u64>,
    pub content_disposition: Option<String>,
    pub accept_ranges: bool,
    /// First byte of a `Content-Range: bytes X-Y/Z` reply.
    pub content_range_start: Option<u64>,
}

impl ResponseHeaders {
    pub fn apply(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if let Some(code) = status_code(line) {
            *self = ResponseHeaders {
                status: Some(code),
                ..Default::default()
            };
            return;
        }
        let Some((name, value)) = line.split_once(':') else {
            return;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            self.content_length = value.parse::<u64>().ok();
        } else if name.eq_ignore_ascii_case("content-disposition") {
            self.content_disposition = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("accept-ranges") {
            self.accept_ranges = value.eq_ignore_ascii_case("bytes");
        } else if name.eq_ignore_ascii_case("content-range") {
            self.content_range_start = range_start(value);
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }
}

/// `X` from `bytes X-Y/Z`; `None` for `bytes */Z` or anything malformed.
fn range_start(value: &str) -> Option<u64> {
    let range = value.strip_prefix("bytes")?.trim_start();
    let (start, _) = range.split_once('-')?;
    start.trim().parse().ok()
}

/// Status code from an `HTTP/x.y NNN reason` line.
pub(super) fn status_code(line: &str) -> Option<u32> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(lines: &[&str]) -> ResponseHeaders {
        let mut h = ResponseHeaders::default();
        for line in lines {
            h.apply(line);
        }
        h
    }

    #[test]
    fn partial_content_response() {
        let h = collect(&[
            "HTTP/1.1 206 Partial Content\r\n",
            "Content-Length: 4096\r\n",
            "Accept-Ranges: bytes\r\n",
            "Content-Disposition: attachment; filename=\"GTEX-1.svs\"\r\n",
            "\r\n",
        ]);
        assert_eq!(h.status, Some(206));
        assert_eq!(h.content_length, Some(4096));
        assert!(h.accept_ranges);
        assert!(h.is_success());
        assert_eq!(
            h.content_disposition.as_deref(),
            Some("attachment; filename=\"GTEX-1.svs\"")
        );
    }

    #[test]
    fn redirect_headers_are_forgotten() {
        let h = collect(&[
            "HTTP/1.1 302 Found",
            "Content-Length: 0",
            "Content-Disposition: attachment; filename=wrong.bin",
            "HTTP/2 200",
            "content-length: 10",
        ]);
        assert_eq!(h.status, Some(200));
        assert_eq!(h.content_length, Some(10));
        assert!(h.content_disposition.is_none());
    }

    #[test]
    fn status_line_parsing() {
        assert_eq!(status_code("HTTP/1.1 416 Range Not Satisfiable"), Some(416));
        assert_eq!(status_code("HTTP/2 404"), Some(404));
        assert_eq!(status_code("Content-Length: 5"), None);
        assert_eq!(status_code("HTTP/1.1"), None);
    }

    #[test]
    fn content_range_start() {
        let h = collect(&["HTTP/1.1 206 Partial Content", "Content-Range: bytes 1000-4095/4096"]);
        assert_eq!(h.content_range_start, Some(1000));
        let h = collect(&["HTTP/1.1 416 Range Not Satisfiable", "Content-Range: bytes */4096"]);
        assert_eq!(h.content_range_start, None);
        let h = collect(&["HTTP/1.1 206 Partial Content", "content-range: items 0-1/2"]);
        assert_eq!(h.content_range_start, None);
        let h = collect(&["HTTP/1.1 206 Partial Content", "Content-Range: bytes 5-9/10", "HTTP/1.1 200 OK"]);
        assert_eq!(h.content_range_start, None);
    }

    #[test]
    fn error_status_is_not_success() {
        assert!(!collect(&["HTTP/1.1 503 Service Unavailable"]).is_success());
        assert!(!ResponseHeaders::default().is_success());
    }
}
