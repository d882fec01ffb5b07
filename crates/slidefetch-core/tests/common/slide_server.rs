//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of paths. GET honours `Range: bytes=X-` with 206 (or
//! 416 past the end) unless ranges are switched off, in which case the full
//! body comes back with 200. Every request is recorded so tests can check
//! what the client asked for.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Route {
    body: Vec<u8>,
    content_disposition: Option<String>,
    status: Option<u16>,
}

/// A request as the server saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub path: String,
    /// `(start, end_inclusive)`; open-ended ranges end at `u64::MAX`.
    pub range: Option<(u64, u64)>,
}

#[derive(Default)]
pub struct Builder {
    routes: HashMap<String, Route>,
    ignore_ranges: bool,
    ranges_from_zero: bool,
    delay: Duration,
    stall: Option<(usize, Duration)>,
}

impl Builder {
    /// Serves `body` at `/<name>`.
    pub fn file(mut self, name: &str, body: Vec<u8>) -> Self {
        self.routes.insert(
            format!("/{}", name),
            Route {
                body,
                content_disposition: None,
                status: None,
            },
        );
        self
    }

    /// Serves `body` at `/<name>` with `Content-Disposition: attachment; filename="<filename>"`.
    pub fn named(mut self, name: &str, body: Vec<u8>, filename: &str) -> Self {
        self.routes.insert(
            format!("/{}", name),
            Route {
                body,
                content_disposition: Some(format!("attachment; filename=\"{}\"", filename)),
                status: None,
            },
        );
        self
    }

    /// Answers `/<name>` with `status` and a short error page.
    pub fn failing(mut self, name: &str, status: u16) -> Self {
        self.routes.insert(
            format!("/{}", name),
            Route {
                body: b"<html>error</html>".to_vec(),
                content_disposition: None,
                status: Some(status),
            },
        );
        self
    }

    /// GET ignores Range and always returns 200 with the full body.
    pub fn ignore_ranges(mut self) -> Self {
        self.ignore_ranges = true;
        self
    }

    /// Answers range requests with 206 but always sends the body from byte 0.
    pub fn ranges_from_zero(mut self) -> Self {
        self.ranges_from_zero = true;
        self
    }

    /// The first successful response sends `after` body bytes, then pauses
    /// for `pause` before sending the rest.
    pub fn stall_first(mut self, after: usize, pause: Duration) -> Self {
        self.stall = Some((after, pause));
        self
    }

    /// Holds every response for `delay` before sending it.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Starts the server on a background thread. It runs until the process exits.
    pub fn start(self) -> SlideServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let shared = Arc::new(Shared {
            routes: self.routes,
            ignore_ranges: self.ignore_ranges,
            ranges_from_zero: self.ranges_from_zero,
            delay: self.delay,
            stall: self.stall,
            stalled: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let server_state = Arc::clone(&shared);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&server_state);
                thread::spawn(move || handle(stream, &state));
            }
        });
        SlideServer {
            base: format!("http://127.0.0.1:{}", port),
            shared,
        }
    }
}

struct Shared {
    routes: HashMap<String, Route>,
    ignore_ranges: bool,
    ranges_from_zero: bool,
    delay: Duration,
    stall: Option<(usize, Duration)>,
    stalled: AtomicBool,
    requests: Mutex<Vec<Recorded>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

pub struct SlideServer {
    base: String,
    shared: Arc<Shared>,
}

impl SlideServer {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base, name)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.requests.lock().unwrap().clone()
    }

    /// Highest number of requests handled at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::SeqCst)
    }
}

fn handle(mut stream: TcpStream, state: &Shared) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let request = String::from_utf8_lossy(&buf).into_owned();
    let (method, path, range) = parse_request(&request);
    state.requests.lock().unwrap().push(Recorded {
        path: path.clone(),
        range,
    });

    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(now, Ordering::SeqCst);
    thread::sleep(state.delay);
    respond(&mut stream, state, &method, &path, range);
    state.in_flight.fetch_sub(1, Ordering::SeqCst);
}

fn respond(stream: &mut TcpStream, state: &Shared, method: &str, path: &str, range: Option<(u64, u64)>) {
    let Some(route) = state.routes.get(path) else {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    };
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }
    if let Some(status) = route.status {
        let head = format!(
            "HTTP/1.1 {} Error\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            route.body.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&route.body);
        return;
    }

    let body = route.body.as_slice();
    let total = body.len() as u64;
    let (status, content_range, slice) = match range.filter(|_| !state.ignore_ranges) {
        Some((start, _)) if start >= total => ("416 Range Not Satisfiable", Some(format!("bytes */{}", total)), &body[0..0]),
        Some(_) if state.ranges_from_zero => (
            "206 Partial Content",
            Some(format!("bytes 0-{}/{}", total.saturating_sub(1), total)),
            body,
        ),
        Some((start, end_incl)) => {
            let end_excl = end_incl.saturating_add(1).min(total);
            let slice = &body[start as usize..end_excl as usize];
            (
                "206 Partial Content",
                Some(format!("bytes {}-{}/{}", start, end_excl - 1, total)),
                slice,
            )
        }
        None => ("200 OK", None, body),
    };

    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        slice.len()
    );
    if !state.ignore_ranges {
        head.push_str("Accept-Ranges: bytes\r\n");
    }
    if let Some(cr) = content_range {
        head.push_str(&format!("Content-Range: {}\r\n", cr));
    }
    if let Some(cd) = &route.content_disposition {
        head.push_str(&format!("Content-Disposition: {}\r\n", cd));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    if let Some((after, pause)) = state.stall {
        if after < slice.len() && !state.stalled.swap(true, Ordering::SeqCst) {
            let _ = stream.write_all(&slice[..after]);
            let _ = stream.flush();
            thread::sleep(pause);
            let _ = stream.write_all(&slice[after..]);
            return;
        }
    }
    let _ = stream.write_all(slice);
}

/// Returns (method, path, optional (start, end_inclusive) for `Range: bytes=X-Y`).
fn parse_request(request: &str) -> (String, String, Option<(u64, u64)>) {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let path = first.next().unwrap_or("/").to_string();
    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("range") {
            continue;
        }
        let Some(spec) = value.trim().strip_prefix("bytes=") else {
            continue;
        };
        if let Some((a, b)) = spec.split_once('-') {
            let start = a.trim().parse::<u64>().unwrap_or(0);
            let end = b.trim();
            let end_incl = if end.is_empty() {
                u64::MAX
            } else {
                end.parse::<u64>().unwrap_or(0)
            };
            range = Some((start, end_incl));
        }
    }
    (method, path, range)
}
