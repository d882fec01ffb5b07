//! In-process HTTP transport on libcurl.
//!
//! Streams the body into `<staging>/<name>.part`. When that file already holds
//! bytes from an interrupted run, the request asks for `Range: bytes=N-` and
//! appends. A server that ignores the range (plain 200) makes the file start
//! over; a 416 on a non-empty file means the previous run had already
//! received everything.

mod headers;

use std::cell::RefCell;
use std::io;

use headers::ResponseHeaders;

use super::{FetchContext, FetchError, Staged, Transport, TransportSettings};
use crate::storage::{self, PartWriter};
use crate::task::DownloadTask;
use crate::url_model;

pub struct CurlTransport {
    settings: TransportSettings,
}

impl CurlTransport {
    pub fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }

    fn configure(&self, easy: &mut curl::easy::Easy, url: &str, resume_from: u64) -> Result<(), curl::Error> {
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(self.settings.max_redirections)?;
        easy.connect_timeout(self.settings.connect_timeout)?;
        easy.low_speed_limit(self.settings.low_speed_limit)?;
        easy.low_speed_time(self.settings.low_speed_time)?;
        easy.timeout(self.settings.task_timeout)?;
        easy.progress(true)?;
        if resume_from > 0 {
            easy.range(&format!("{}-", resume_from))?;
        }
        Ok(())
    }
}

/// State shared between the header and body callbacks of one transfer.
struct Sink {
    writer: PartWriter,
    resume_from: u64,
    headers: ResponseHeaders,
    body_started: bool,
    io_error: Option<io::Error>,
    /// Set when a 206 does not start at `resume_from`.
    range_mismatch: Option<FetchError>,
}

impl Sink {
    fn on_header(&mut self, line: &[u8]) {
        let line = String::from_utf8_lossy(line);
        if headers::status_code(line.trim()).is_some() {
            self.body_started = false;
        }
        self.headers.apply(&line);
    }

    /// Returns the number of bytes consumed; anything short of `data.len()`
    /// aborts the transfer.
    fn on_body(&mut self, data: &[u8]) -> usize {
        if !self.headers.is_success() {
            // Error pages never reach the part file.
            return data.len();
        }
        if !self.body_started {
            self.body_started = true;
            if self.resume_from > 0 && self.headers.status == Some(200) {
                tracing::info!(
                    file = %self.writer.path().display(),
                    discarded = self.resume_from,
                    "server ignored range request, restarting from byte 0"
                );
                if let Err(e) = self.writer.restart() {
                    self.io_error = Some(e);
                    return 0;
                }
                self.resume_from = 0;
            } else if self.resume_from > 0 && self.headers.status == Some(206) {
                let served = self.headers.content_range_start;
                if served != Some(self.resume_from) {
                    tracing::warn!(
                        file = %self.writer.path().display(),
                        requested = self.resume_from,
                        served = ?served,
                        "partial content does not continue the part file"
                    );
                    self.range_mismatch = Some(FetchError::UnexpectedRange {
                        requested: self.resume_from,
                        served,
                    });
                    return 0;
                }
            }
        }
        match self.writer.write(data) {
            Ok(()) => data.len(),
            Err(e) => {
                tracing::warn!(file = %self.writer.path().display(), "write failed: {}", e);
                self.io_error = Some(e);
                0
            }
        }
    }
}

impl Transport for CurlTransport {
    fn name(&self) -> &'static str {
        "curl"
    }

    fn fetch(&self, task: &DownloadTask, ctx: &FetchContext<'_>) -> Result<Staged, FetchError> {
        if ctx.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let part_path = storage::temp_path(&ctx.staging_dir.join(&task.name));
        let (writer, resume_from) = PartWriter::open_resume(&part_path)?;
        if resume_from > 0 {
            tracing::info!(url = %task.url, offset = resume_from, "resuming partial download");
        }

        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, &task.url, resume_from)?;

        let sink = RefCell::new(Sink {
            writer,
            resume_from,
            headers: ResponseHeaders::default(),
            body_started: false,
            io_error: None,
            range_mismatch: None,
        });
        let performed = {
            let sink = &sink;
            let cancel = ctx.cancel;
            let mut transfer = easy.transfer();
            transfer.header_function(move |line| {
                sink.borrow_mut().on_header(line);
                true
            })?;
            transfer.write_function(move |data| Ok(sink.borrow_mut().on_body(data)))?;
            transfer.progress_function(move |_, _, _, _| !cancel.is_cancelled())?;
            transfer.perform()
        };
        let mut sink = sink.into_inner();

        if let Err(e) = performed {
            if e.is_aborted_by_callback() && ctx.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            if let Some(mismatch) = sink.range_mismatch.take() {
                return Err(mismatch);
            }
            if let Some(io_err) = sink.io_error {
                return Err(FetchError::Storage(io_err));
            }
            return Err(FetchError::Curl(e));
        }

        let code = easy.response_code()?;
        if code == 416 && resume_from > 0 {
            tracing::info!(url = %task.url, bytes = resume_from, "range not satisfiable, part file already complete");
        } else if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        } else if let Some(expected) = sink.headers.content_length {
            let received = sink.writer.written();
            if received != expected {
                return Err(FetchError::PartialTransfer { expected, received });
            }
        }
        sink.writer.sync()?;
        tracing::debug!(
            url = %task.url,
            status = code,
            accept_ranges = sink.headers.accept_ranges,
            "transfer finished"
        );

        let file_name = url_model::derive_filename(&task.url, sink.headers.content_disposition.as_deref());
        Ok(Staged {
            path: part_path,
            file_name,
        })
    }
}
