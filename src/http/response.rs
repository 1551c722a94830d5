//! Response capture.
//!
//! # Responsibilities
//! - Derive the response fields (status, bytes, elapsed)
//! - Tee the outgoing body into a bounded buffer for error diagnostics
//! - Flush the request's log entry exactly once, when the body is done
//!
//! # Design Decisions
//! - Only the first `RESPONSE_BUFFER_LIMIT` bytes are kept; the rest is dropped silently
//! - The flush is tied to `ResponseRecorder`'s destructor, so it also runs when
//!   the body is dropped early (client gone, cancellation, unwinding)
//! - The buffer is only read back for statuses >= 400

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;

use crate::http::entry::LogEntry;
use crate::observability::Field;

/// Capacity of the response body tee.
pub const RESPONSE_BUFFER_LIMIT: usize = 512;

/// Elapsed time in fractional milliseconds.
pub fn elapsed_millis(elapsed: Duration) -> f64 {
    elapsed.as_nanos() as f64 / 1_000_000.0
}

/// Build the response fields: status, bytes, elapsed (ms).
pub fn response_fields(status: i32, bytes: usize, elapsed: Duration) -> Vec<Field> {
    vec![
        Field::new("status", status),
        Field::new("bytes", bytes),
        Field::new("elapsed", elapsed_millis(elapsed)),
    ]
}

/// Byte sink that keeps at most `limit` bytes and discards the rest.
#[derive(Debug, Clone)]
pub struct LimitBuffer {
    buf: Vec<u8>,
    limit: usize,
}

impl LimitBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Append as much of `data` as still fits.
    pub fn push(&mut self, data: &[u8]) {
        let room = self.limit - self.buf.len();
        let take = room.min(data.len());
        self.buf.extend_from_slice(&data[..take]);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl io::Write for LimitBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.push(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Collects the final response state and writes the entry when dropped.
pub struct ResponseRecorder {
    entry: LogEntry,
    started: Instant,
    status: i32,
    headers: HeaderMap,
    buffer: LimitBuffer,
    bytes_written: usize,
    flushed: bool,
}

impl ResponseRecorder {
    /// Start the clock for `entry`. Until a response head is seen the status is 0.
    pub fn start(entry: LogEntry) -> Self {
        Self {
            entry,
            started: Instant::now(),
            status: 0,
            headers: HeaderMap::new(),
            buffer: LimitBuffer::new(RESPONSE_BUFFER_LIMIT),
            bytes_written: 0,
            flushed: false,
        }
    }

    /// Record the response head.
    pub fn observe_head(&mut self, status: StatusCode, headers: &HeaderMap) {
        self.status = i32::from(status.as_u16());
        self.headers = headers.clone();
    }

    /// Record a chunk of body data.
    pub fn observe_data(&mut self, data: &[u8]) {
        self.bytes_written += data.len();
        self.buffer.push(data);
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Write the entry now. Later calls do nothing.
    pub fn finish(&mut self) {
        if self.flushed {
            return;
        }
        self.flushed = true;

        let body = if self.status >= 400 {
            self.buffer.as_bytes()
        } else {
            &[]
        };
        self.entry.write(
            self.status,
            self.bytes_written,
            &self.headers,
            self.started.elapsed(),
            body,
        );
    }
}

impl Drop for ResponseRecorder {
    fn drop(&mut self) {
        self.finish();
    }
}

pin_project! {
    /// Response body that reports to a `ResponseRecorder`.
    pub struct LoggedBody<B> {
        #[pin]
        inner: B,
        recorder: Option<ResponseRecorder>,
    }
}

impl<B> LoggedBody<B> {
    pub fn new(inner: B, recorder: ResponseRecorder) -> Self {
        Self {
            inner,
            recorder: Some(recorder),
        }
    }
}

impl<B> Body for LoggedBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        let frame = ready!(this.inner.as_mut().poll_frame(cx));

        match &frame {
            Some(Ok(frame)) => {
                if let (Some(data), Some(recorder)) = (frame.data_ref(), this.recorder.as_mut()) {
                    recorder.observe_data(data);
                }
                if this.inner.is_end_stream() {
                    if let Some(mut recorder) = this.recorder.take() {
                        recorder.finish();
                    }
                }
            }
            Some(Err(_)) | None => {
                if let Some(mut recorder) = this.recorder.take() {
                    recorder.finish();
                }
            }
        }

        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
