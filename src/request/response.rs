//! Response materialization: buffering, streaming to disk, progress
//! reporting, and cookie extraction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, SET_COOKIE};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use super::error::RequestError;

/// Progress notification for an in-flight response body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressUpdate {
    /// The response declared a total length; emitted once per fragment.
    Determinate {
        total_bytes: u64,
        current_bytes: u64,
        percentage: f64,
    },
    /// No length header present; emitted exactly once.
    Unknown,
}

/// Best-effort progress callback. Invocations never block or fail the
/// transaction.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Normalized result of a completed transaction.
#[derive(Debug)]
pub struct Response {
    /// HTTP status code of the final hop.
    pub status: u16,
    /// Response headers of the final hop.
    pub headers: HeaderMap,
    /// Materialized body. Exactly one representation per transaction.
    pub body: ResponseBody,
    /// `name=value` cookies extracted from Set-Cookie, in header order.
    pub cookies: Vec<String>,
}

impl Response {
    /// The buffered body as text, when it was materialized as text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Parses the buffered text body as JSON.
    #[must_use]
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(self.text()?).ok()
    }
}

/// How a response body was materialized.
///
/// The enum guarantees the invariant that exactly one of buffered content
/// or a download location exists per transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// UTF-8 decoded text (lossy), the default for buffered bodies.
    Text(String),
    /// Raw bytes, when the `binary` option bypasses UTF-8 decoding.
    Binary(Vec<u8>),
    /// The body was streamed to this path; nothing was buffered.
    Saved(PathBuf),
    /// No body was materialized (HEAD requests).
    Empty,
}

impl ResponseBody {
    /// Buffered bytes, regardless of text/binary mode.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(text) => Some(text.as_bytes()),
            Self::Binary(bytes) => Some(bytes),
            Self::Saved(_) | Self::Empty => None,
        }
    }

    /// Destination path for a streamed body.
    #[must_use]
    pub fn saved_path(&self) -> Option<&Path> {
        match self {
            Self::Saved(path) => Some(path),
            _ => None,
        }
    }
}

/// Tracks body progress across fragments and drives the callback.
struct ProgressTracker {
    total: Option<u64>,
    current: u64,
    notified_unknown: bool,
}

impl ProgressTracker {
    fn new(total: Option<u64>) -> Self {
        Self {
            total,
            current: 0,
            notified_unknown: false,
        }
    }

    /// Records `fragment_len` received bytes and notifies the callback.
    ///
    /// With a known total, every fragment produces a determinate update;
    /// without one, a single Unknown notice is emitted on the first
    /// fragment. Either way the transaction is never affected.
    fn advance(&mut self, fragment_len: usize, callback: Option<&ProgressCallback>) {
        self.current += fragment_len as u64;
        let Some(callback) = callback else { return };

        match self.total {
            Some(total) if total > 0 => {
                #[allow(clippy::cast_precision_loss)]
                let percentage = (self.current as f64 / total as f64) * 100.0;
                callback(ProgressUpdate::Determinate {
                    total_bytes: total,
                    current_bytes: self.current,
                    percentage,
                });
            }
            _ => self.notify_unknown_once(callback),
        }
    }

    /// Marks end-of-body. A body that produced no fragments still owes its
    /// single Unknown notice when no length was declared.
    fn finish(&mut self, callback: Option<&ProgressCallback>) {
        let Some(callback) = callback else { return };
        if !matches!(self.total, Some(total) if total > 0) {
            self.notify_unknown_once(callback);
        }
    }

    fn notify_unknown_once(&mut self, callback: &ProgressCallback) {
        if !self.notified_unknown {
            self.notified_unknown = true;
            callback(ProgressUpdate::Unknown);
        }
    }
}

/// Extracts the declared body length, when the response carries one.
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

/// Classifies a mid-body stream error: a fired timer stays a timeout,
/// anything else means the connection ended before end-of-body.
fn classify_stream_error(url: &str, error: &reqwest::Error) -> RequestError {
    if error.is_timeout() {
        RequestError::timeout(url)
    } else {
        RequestError::aborted(url)
    }
}

/// Buffers the response body in memory, decoding UTF-8 unless `binary`.
///
/// # Errors
///
/// Returns [`RequestError::Timeout`] when the hop timer fires mid-body and
/// [`RequestError::Aborted`] when the connection closes early.
pub(crate) async fn buffer_body(
    response: reqwest::Response,
    url: &str,
    binary: bool,
    progress: Option<&ProgressCallback>,
) -> Result<ResponseBody, RequestError> {
    let mut tracker = ProgressTracker::new(declared_length(response.headers()));
    let mut accumulated: Vec<u8> = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| classify_stream_error(url, &e))?;
        tracker.advance(chunk.len(), progress);
        accumulated.extend_from_slice(&chunk);
    }
    tracker.finish(progress);

    debug!(bytes = accumulated.len(), binary, "buffered response body");

    if binary {
        Ok(ResponseBody::Binary(accumulated))
    } else {
        Ok(ResponseBody::Text(
            String::from_utf8_lossy(&accumulated).into_owned(),
        ))
    }
}

/// Streams the response body to `destination`, constant-memory, returning
/// the byte count written.
///
/// The destination file is exclusively owned by this transaction; a failed
/// stream leaves cleanup to the caller.
///
/// # Errors
///
/// Returns [`RequestError::Io`] for sink failures, and the same stream
/// classifications as [`buffer_body`] for transport failures.
pub(crate) async fn stream_body_to_file(
    response: reqwest::Response,
    url: &str,
    destination: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<u64, RequestError> {
    let mut tracker = ProgressTracker::new(declared_length(response.headers()));

    let file = File::create(destination)
        .await
        .map_err(|e| RequestError::io(destination, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| classify_stream_error(url, &e))?;
        tracker.advance(chunk.len(), progress);

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| RequestError::io(destination, e))?;
        bytes_written += chunk.len() as u64;
    }
    tracker.finish(progress);

    // Ensure all data is flushed to disk before reporting the path back.
    writer
        .flush()
        .await
        .map_err(|e| RequestError::io(destination, e))?;

    debug!(path = %destination.display(), bytes = bytes_written, "streamed body to disk");
    Ok(bytes_written)
}

/// Extracts `name=value` cookies from every Set-Cookie header, preserving
/// header order.
///
/// Each cookie keeps only the segment before its first `;`. Folded headers
/// (multiple cookies comma-joined into one value) are split too; fragments
/// without `=` (such as the weekday half of an Expires date) are dropped.
pub(crate) fn extract_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|cookie| {
            let pair = cookie.split(';').next()?.trim();
            (pair.contains('=') && !pair.is_empty()).then(|| pair.to_string())
        })
        .collect()
}
