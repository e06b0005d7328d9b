//! HTTP(S) request engine: single transactions with redirect following,
//! multipart uploads, and streaming downloads.
//!
//! # Features
//!
//! - Typed, immutable request options (parameters, JSON, raw bodies,
//!   headers, cookies, files, proxy)
//! - Engine-owned redirect loop with a configurable bound
//! - Binary-safe multipart/form-data assembly for file uploads
//! - Response buffering (text or binary) or streaming straight to disk
//!   with progress callbacks
//! - Structured error taxonomy distinguishing timeouts, transport
//!   failures, and aborted connections
//!
//! # Example
//!
//! ```no_run
//! use httpreq::{HttpClient, RequestOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let response = client
//!     .post(
//!         "https://example.com/submit",
//!         RequestOptions::new()
//!             .parameter("name", "John")
//!             .cookie("token=abc"),
//!     )
//!     .await?;
//! println!("status {}", response.status);
//! # Ok(())
//! # }
//! ```

mod body;
mod client;
mod error;
mod options;
mod resolve;
mod response;
mod transaction;

pub use client::HttpClient;
pub use error::RequestError;
pub use options::{DEFAULT_MAX_REDIRECTS, Method, Proxy, ProxyProtocol, RequestOptions};
pub use response::{ProgressCallback, ProgressUpdate, Response, ResponseBody};

// Note: no module-local Result alias; signatures spell out
// `Result<T, RequestError>` explicitly.
