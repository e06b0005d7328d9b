//! Error types for the request engine.
//!
//! Every error is terminal for its transaction: nothing is retried
//! internally, and each failure is surfaced exactly once to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while executing an HTTP transaction.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The target URL (or a redirect Location) could not be parsed into
    /// host and path.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The URL string that failed to parse.
        url: String,
    },

    /// An upload source file could not be read.
    ///
    /// Raised while assembling the multipart body, before any network I/O:
    /// if any file is unreadable, nothing is sent.
    #[error("failed to read upload file {path}: {source}")]
    FileRead {
        /// Path of the unreadable file.
        path: PathBuf,
        /// The underlying read error.
        #[source]
        source: std::io::Error,
    },

    /// The redirect chain exceeded the configured bound.
    #[error("too many redirects requesting {url} (limit {limit})")]
    TooManyRedirects {
        /// The URL of the hop that still wanted to redirect.
        url: String,
        /// The configured redirect limit.
        limit: u32,
    },

    /// The transaction's timer fired before the in-flight hop completed.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Transport-level connection failure (DNS, refused, TLS, protocol),
    /// passed through unmodified.
    #[error("transport error requesting {url}: {source}")]
    Transport {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The connection closed before the response body completed, with no
    /// explicit transport error available.
    #[error("request aborted: connection closed before {url} completed")]
    Aborted {
        /// The URL whose response ended early.
        url: String,
    },

    /// Writing a streamed response to the download destination failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The destination path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl RequestError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an upload file read error.
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a redirect limit error.
    pub fn too_many_redirects(url: impl Into<String>, limit: u32) -> Self {
        Self::TooManyRedirects {
            url: url.into(),
            limit,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a transport passthrough error.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Creates an aborted-connection error.
    pub fn aborted(url: impl Into<String>) -> Self {
        Self::Aborted { url: url.into() }
    }

    /// Creates an IO error for a download destination.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` or
// `From<std::io::Error>` because the variants require context (url, path)
// that the source errors don't carry, and because a reqwest error must be
// classified (Timeout vs Transport vs Aborted) at the call site where the
// transaction phase is known. The helper constructors are the pattern here.
