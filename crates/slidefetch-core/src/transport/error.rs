//! Per-task fetch errors and their classification for logs and summaries.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Coarse category of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect, stall, or the per-task limit).
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// Server error other than throttling.
    Http5xx(u16),
    /// Anything else: 4xx, disk errors, missing programs.
    Other,
}

/// Error from a single task. Never aborts sibling tasks.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Curl(#[from] curl::Error),
    #[error("HTTP {0}")]
    Http(u32),
    /// Server closed early; the `.part` file keeps what arrived.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// A 206 reply that does not continue where the `.part` file ends.
    #[error("asked for bytes from {requested}, server sent {}", range_label(.served))]
    UnexpectedRange { requested: u64, served: Option<u64> },
    #[error("storage: {0}")]
    Storage(#[from] io::Error),
    #[error("{program}: {source}")]
    Process {
        program: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {}", exit_label(.code))]
    ExitStatus {
        program: &'static str,
        code: Option<i32>,
    },
    #[error("{program} reported success but left no file in {}", .dir.display())]
    NothingStaged { program: &'static str, dir: PathBuf },
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("cancelled")]
    Cancelled,
}

fn range_label(start: &Option<u64>) -> String {
    match start {
        Some(s) => format!("bytes from {}", s),
        None => "no Content-Range".to_string(),
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "a signal".to_string(),
    }
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Curl(e) => classify_curl_error(e),
            FetchError::Http(code) => classify_http_status(*code),
            FetchError::PartialTransfer { .. } => ErrorKind::Connection,
            FetchError::ExitStatus {
                program,
                code: Some(code),
            } => classify_exit_code(program, *code),
            FetchError::Timeout(_) => ErrorKind::Timeout,
            FetchError::Storage(_)
            | FetchError::UnexpectedRange { .. }
            | FetchError::Process { .. }
            | FetchError::ExitStatus { code: None, .. }
            | FetchError::NothingStaged { .. }
            | FetchError::Cancelled => ErrorKind::Other,
        }
    }
}

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify the documented exit codes of the external downloaders.
pub fn classify_exit_code(program: &str, code: i32) -> ErrorKind {
    match (program, code) {
        // wget: 4 = network failure
        ("wget", 4) => ErrorKind::Connection,
        // aria2c: 2 = timeout, 6 = network problem
        ("aria2c", 2) => ErrorKind::Timeout,
        ("aria2c", 6) => ErrorKind::Connection,
        _ => ErrorKind::Other,
    }
}
