//! httpreq
//!
//! An HTTP(S) client request engine: given a target URL and structured
//! options, it constructs and executes a single HTTP transaction, follows
//! redirects up to a bound, optionally streams the response body straight
//! to disk with progress reporting, and returns a normalized response
//! (status, headers, body, cookies).
//!
//! # Architecture
//!
//! Everything lives in the [`request`](mod@crate::request) module:
//! - options and method types (the typed configuration surface)
//! - body construction (form-encoded, JSON, raw, multipart/form-data)
//! - the redirect-following transaction executor
//! - response materialization (buffering, streaming, cookies, progress)
//!
//! The most common types are re-exported at the crate root, and each
//! operation is also available as a module-level free function over a
//! shared default client:
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let response = httpreq::get(
//!     "https://example.com/get",
//!     httpreq::RequestOptions::new(),
//! )
//! .await?;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::OnceLock;

pub mod request;

// Re-export commonly used types
pub use request::{
    DEFAULT_MAX_REDIRECTS, HttpClient, Method, ProgressCallback, ProgressUpdate, Proxy,
    ProxyProtocol, RequestError, RequestOptions, Response, ResponseBody,
};

static DEFAULT_CLIENT: OnceLock<HttpClient> = OnceLock::new();

/// Shared default client backing the module-level functions.
fn default_client() -> &'static HttpClient {
    DEFAULT_CLIENT.get_or_init(HttpClient::new)
}

/// Issues a GET request with the shared default client.
///
/// # Errors
///
/// Returns [`RequestError`]; see [`HttpClient::request`].
pub async fn get(url: &str, options: RequestOptions) -> Result<Response, RequestError> {
    default_client().get(url, options).await
}

/// Issues a POST request with the shared default client.
///
/// # Errors
///
/// Returns [`RequestError`]; see [`HttpClient::request`].
pub async fn post(url: &str, options: RequestOptions) -> Result<Response, RequestError> {
    default_client().post(url, options).await
}

/// Issues a PUT request with the shared default client.
///
/// # Errors
///
/// Returns [`RequestError`]; see [`HttpClient::request`].
pub async fn put(url: &str, options: RequestOptions) -> Result<Response, RequestError> {
    default_client().put(url, options).await
}

/// Issues a PATCH request with the shared default client.
///
/// # Errors
///
/// Returns [`RequestError`]; see [`HttpClient::request`].
pub async fn patch(url: &str, options: RequestOptions) -> Result<Response, RequestError> {
    default_client().patch(url, options).await
}

/// Issues a DELETE request with the shared default client.
///
/// # Errors
///
/// Returns [`RequestError`]; see [`HttpClient::request`].
pub async fn delete(url: &str, options: RequestOptions) -> Result<Response, RequestError> {
    default_client().delete(url, options).await
}

/// Issues a HEAD request with the shared default client. No body is
/// materialized.
///
/// # Errors
///
/// Returns [`RequestError`]; see [`HttpClient::request`].
pub async fn head(url: &str, options: RequestOptions) -> Result<Response, RequestError> {
    default_client().head(url, options).await
}

/// Uploads files as multipart/form-data with the shared default client.
///
/// # Errors
///
/// Returns [`RequestError`]; see [`HttpClient::upload_files`].
pub async fn upload_files(url: &str, options: RequestOptions) -> Result<Response, RequestError> {
    default_client().upload_files(url, options).await
}

/// Streams `url` to `destination` with the shared default client.
///
/// # Errors
///
/// Returns [`RequestError`]; see [`HttpClient::download`].
pub async fn download(
    url: &str,
    destination: impl Into<PathBuf>,
    options: RequestOptions,
) -> Result<Response, RequestError> {
    default_client().download(url, destination, options).await
}

/// Executes a transaction with an arbitrary method on the shared default
/// client.
///
/// # Errors
///
/// Returns [`RequestError`]; see [`HttpClient::request`].
pub async fn request(
    method: Method,
    url: &str,
    options: RequestOptions,
) -> Result<Response, RequestError> {
    default_client().request(method, url, options).await
}
