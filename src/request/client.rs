//! Public request surface over the transaction executor.
//!
//! `HttpClient` wraps a reqwest client built with redirects disabled (the
//! executor owns the redirect loop) and exposes one typed entry point per
//! HTTP method, plus upload, download, and fire-and-forget adapters.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};

use super::error::RequestError;
use super::options::{Method, Proxy, RequestOptions};
use super::response::{self, Response, ResponseBody};
use super::transaction;

/// Default connect timeout for the underlying transport (30 seconds).
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent identifying the library.
fn default_user_agent() -> String {
    format!("httpreq/{}", env!("CARGO_PKG_VERSION"))
}

/// HTTP client executing single transactions with redirect following,
/// multipart uploads, and streaming downloads.
///
/// Designed to be created once and reused; cloning is cheap (the transport
/// is a shared handle), and concurrent transactions on one client are fine.
/// Each individual transaction remains strictly sequential: never two hops
/// in flight at once.
///
/// # Example
///
/// ```no_run
/// use httpreq::{HttpClient, RequestOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let response = client
///     .get("https://example.com/get", RequestOptions::new())
///     .await?;
/// println!("{} {:?}", response.status, response.text());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    transport: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with the default transport configuration:
    /// 30 second connect timeout, no overall timeout (per-request timers
    /// come from [`RequestOptions::timeout`]), redirects disabled so the
    /// engine's own loop decides every hop.
    ///
    /// # Panics
    ///
    /// Panics if the transport builder fails with the static configuration.
    /// This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let transport = base_transport_builder()
            .build()
            .expect("failed to build HTTP transport with static configuration");
        Self { transport }
    }

    /// Issues a GET request.
    ///
    /// `parameters` are appended to the query string; redirects are
    /// followed by default.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] as described on [`request`](Self::request).
    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<Response, RequestError> {
        self.request(Method::Get, url, options).await
    }

    /// Issues a POST request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] as described on [`request`](Self::request).
    pub async fn post(&self, url: &str, options: RequestOptions) -> Result<Response, RequestError> {
        self.request(Method::Post, url, options).await
    }

    /// Issues a PUT request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] as described on [`request`](Self::request).
    pub async fn put(&self, url: &str, options: RequestOptions) -> Result<Response, RequestError> {
        self.request(Method::Put, url, options).await
    }

    /// Issues a PATCH request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] as described on [`request`](Self::request).
    pub async fn patch(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response, RequestError> {
        self.request(Method::Patch, url, options).await
    }

    /// Issues a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] as described on [`request`](Self::request).
    pub async fn delete(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response, RequestError> {
        self.request(Method::Delete, url, options).await
    }

    /// Issues a HEAD request. No body is materialized.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] as described on [`request`](Self::request).
    pub async fn head(&self, url: &str, options: RequestOptions) -> Result<Response, RequestError> {
        self.request(Method::Head, url, options).await
    }

    /// Uploads files as a multipart/form-data POST.
    ///
    /// Parameters become form fields and every `files` entry becomes one
    /// part per path. For non-POST uploads use
    /// [`request`](Self::request) with the same options.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::FileRead`] before any network I/O when an
    /// upload source is unreadable, plus the usual transaction errors.
    pub async fn upload_files(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response, RequestError> {
        self.request(Method::Post, url, options).await
    }

    /// Downloads `url` to `destination`, streaming fragments straight to
    /// disk (constant memory). Progress is reported through
    /// [`RequestOptions::on_progress`] when configured.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Io`] for destination write failures, plus
    /// the usual transaction errors.
    pub async fn download(
        &self,
        url: &str,
        destination: impl Into<PathBuf>,
        options: RequestOptions,
    ) -> Result<Response, RequestError> {
        let options = options.download_to(destination);
        self.request(Method::Get, url, options).await
    }

    /// Executes one transaction with an arbitrary method.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidUrl`], [`RequestError::FileRead`],
    /// [`RequestError::TooManyRedirects`], [`RequestError::Timeout`],
    /// [`RequestError::Transport`], [`RequestError::Aborted`], or
    /// [`RequestError::Io`]; all terminal, surfaced once, never retried.
    #[instrument(skip(self, options), fields(method = %method, url = %url))]
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response, RequestError> {
        let transport = self.transport_for(&options)?;
        let hop = transaction::execute(&transport, method, url, &options).await?;

        let status = hop.status().as_u16();
        let final_url = hop.url().to_string();
        let headers = hop.headers().clone();
        let cookies = response::extract_cookies(&headers);

        let body = if method == Method::Head {
            ResponseBody::Empty
        } else if let Some(destination) = &options.download_to {
            let result = response::stream_body_to_file(
                hop,
                &final_url,
                destination,
                options.progress.as_ref(),
            )
            .await;
            if result.is_err() {
                // Do not leave incomplete data behind on a failed stream.
                debug!(path = %destination.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(destination).await;
            }
            result?;
            ResponseBody::Saved(destination.clone())
        } else {
            response::buffer_body(hop, &final_url, options.binary, options.progress.as_ref())
                .await?
        };

        info!(status, cookies = cookies.len(), "request complete");

        Ok(Response {
            status,
            headers,
            body,
            cookies,
        })
    }

    /// Spawns the transaction and drops its outcome, logging failures at
    /// debug level.
    ///
    /// This is the explicit opt-in replacement for the historical
    /// "no completion handler" calling style, where errors vanished
    /// silently by default.
    pub fn fire_and_forget(&self, method: Method, url: &str, options: RequestOptions) {
        let client = self.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            if let Err(error) = client.request(method, &url, options).await {
                debug!(%error, "fire-and-forget request failed");
            }
        });
    }

    /// Returns the transport for one transaction: the shared client, or a
    /// dedicated one when a proxy override is set (transport proxies are
    /// client-level configuration).
    fn transport_for(&self, options: &RequestOptions) -> Result<Client, RequestError> {
        match &options.proxy {
            None => Ok(self.transport.clone()),
            Some(proxy) => build_proxied_transport(proxy),
        }
    }
}

fn base_transport_builder() -> reqwest::ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(default_user_agent())
}

/// Builds a transport that tunnels every request through `proxy`.
fn build_proxied_transport(proxy: &Proxy) -> Result<Client, RequestError> {
    let proxy_url = proxy.url();
    let resolved = reqwest::Proxy::all(proxy_url.as_str())
        .map_err(|_| RequestError::invalid_url(&proxy_url))?;
    base_transport_builder()
        .proxy(resolved)
        .build()
        .map_err(|e| RequestError::transport(&proxy_url, e))
}
