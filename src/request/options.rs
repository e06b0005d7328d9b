//! Request configuration: method, proxy, and the options structure.
//!
//! `RequestOptions` is one explicit, typed configuration structure with
//! named optional fields. It is caller-constructed (builder-style setters)
//! and read-only inside the engine; per-transaction state such as the
//! redirect count never mutates it.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::response::ProgressCallback;

/// Default bound on the redirect chain.
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// HTTP method for a transaction.
///
/// The method is fixed for the transaction's lifetime: redirect hops reuse
/// it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Method {
    /// Returns whether this method follows redirects when the caller has
    /// not set an explicit preference (GET does, everything else does not).
    #[must_use]
    pub fn follows_redirects_by_default(self) -> bool {
        matches!(self, Self::Get)
    }

    /// Returns whether this method carries a form-encoded parameter body
    /// (as opposed to GET, which moves parameters into the query string).
    #[must_use]
    pub(crate) fn parameters_as_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
        }
    }

    /// Returns the method name in wire form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol spoken to an explicit proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyProtocol {
    Http,
    Https,
}

impl ProxyProtocol {
    pub(crate) fn scheme(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Explicit proxy override for a transaction.
///
/// When set, the connection goes to the proxy host/port and the request
/// path is the full target URL (proxy forwarding convention).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    /// Proxy host name or address.
    pub host: String,
    /// Proxy port.
    pub port: u16,
    /// Protocol spoken to the proxy.
    pub protocol: ProxyProtocol,
}

impl Proxy {
    /// Creates a proxy override.
    pub fn new(host: impl Into<String>, port: u16, protocol: ProxyProtocol) -> Self {
        Self {
            host: host.into(),
            port,
            protocol,
        }
    }

    /// The proxy endpoint as a URL, e.g. `http://proxy.local:8080`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }
}

/// Structured options for a single HTTP transaction.
///
/// At most one payload source applies per transaction; precedence is
/// `files` (multipart) over raw `body` over `json` over `parameters`.
/// GET moves `parameters` into the query string instead of a body.
#[derive(Clone)]
pub struct RequestOptions {
    /// Ordered name/value pairs: body for POST/PUT/PATCH, query for GET.
    pub parameters: Vec<(String, String)>,
    /// JSON payload; forces a compact JSON body and `application/json`.
    pub json: Option<serde_json::Value>,
    /// Raw body override, sent verbatim. Caller supplies Content-Type
    /// through `headers`.
    pub body: Option<Vec<u8>>,
    /// Extra request headers; applied last, so they override engine
    /// defaults such as the body-derived Content-Type.
    pub headers: Vec<(String, String)>,
    /// Cookies as `name=value` strings, joined with `"; "` into a single
    /// Cookie header.
    pub cookies: Vec<String>,
    /// Upload files: field name to one or more paths. Non-empty `files`
    /// forces a multipart/form-data body regardless of method.
    pub files: Vec<(String, Vec<PathBuf>)>,
    /// Explicit proxy override.
    pub proxy: Option<Proxy>,
    /// Per-hop timeout; a fired timer aborts the in-flight hop.
    pub timeout: Option<Duration>,
    /// Bound on the redirect chain.
    pub max_redirects: u32,
    /// Whether to follow redirects. Defaults per method: true for GET,
    /// false otherwise.
    pub allow_redirects: Option<bool>,
    /// Keep the buffered response body as raw bytes instead of decoding
    /// UTF-8 text.
    pub binary: bool,
    /// Stream the response body to this path instead of buffering.
    pub download_to: Option<PathBuf>,
    /// Progress callback, invoked per fragment when the response declares
    /// a total length. Best-effort: never fails the transaction.
    pub progress: Option<ProgressCallback>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestOptions {
    /// Creates empty options with the default redirect bound.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
            json: None,
            body: None,
            headers: Vec::new(),
            cookies: Vec::new(),
            files: Vec::new(),
            proxy: None,
            timeout: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            allow_redirects: None,
            binary: false,
            download_to: None,
            progress: None,
        }
    }

    /// Adds one parameter, preserving insertion order.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Adds parameters from an iterator of pairs, preserving order.
    #[must_use]
    pub fn parameters<N, V>(mut self, pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.parameters
            .extend(pairs.into_iter().map(|(n, v)| (n.into(), v.into())));
        self
    }

    /// Sets a JSON payload.
    #[must_use]
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.json = Some(value);
        self
    }

    /// Sets a raw body, sent verbatim. Wins over `json` and `parameters`.
    #[must_use]
    pub fn body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Some(bytes.into());
        self
    }

    /// Adds a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a cookie as a `name=value` string.
    #[must_use]
    pub fn cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookies.push(cookie.into());
        self
    }

    /// Adds one upload file under the given field name.
    #[must_use]
    pub fn file(mut self, field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.files.push((field.into(), vec![path.into()]));
        self
    }

    /// Adds several upload files under one field name (one multipart part
    /// per path, same field name repeated).
    #[must_use]
    pub fn files<P: Into<PathBuf>>(
        mut self,
        field: impl Into<String>,
        paths: impl IntoIterator<Item = P>,
    ) -> Self {
        self.files
            .push((field.into(), paths.into_iter().map(Into::into).collect()));
        self
    }

    /// Sets an explicit proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets the per-hop timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the redirect bound.
    #[must_use]
    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Sets an explicit redirect preference, overriding the per-method
    /// default.
    #[must_use]
    pub fn allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = Some(allow);
        self
    }

    /// Keeps the buffered response body as raw bytes.
    #[must_use]
    pub fn binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    /// Streams the response body to the given path instead of buffering.
    #[must_use]
    pub fn download_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.download_to = Some(path.into());
        self
    }

    /// Installs a progress callback.
    #[must_use]
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Resolves the effective redirect policy for the given method.
    #[must_use]
    pub(crate) fn effective_allow_redirects(&self, method: Method) -> bool {
        self.allow_redirects
            .unwrap_or_else(|| method.follows_redirects_by_default())
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("parameters", &self.parameters)
            .field("json", &self.json)
            .field("body", &self.body.as_ref().map(Vec::len))
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("files", &self.files)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .field("max_redirects", &self.max_redirects)
            .field("allow_redirects", &self.allow_redirects)
            .field("binary", &self.binary)
            .field("download_to", &self.download_to)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_redirect_bound() {
        let options = RequestOptions::new();
        assert_eq!(options.max_redirects, DEFAULT_MAX_REDIRECTS);
        assert!(options.allow_redirects.is_none());
    }

    #[test]
    fn test_redirects_default_per_method() {
        let options = RequestOptions::new();
        assert!(options.effective_allow_redirects(Method::Get));
        assert!(!options.effective_allow_redirects(Method::Post));
        assert!(!options.effective_allow_redirects(Method::Put));
        assert!(!options.effective_allow_redirects(Method::Head));
    }

    #[test]
    fn test_explicit_redirect_preference_wins() {
        let options = RequestOptions::new().allow_redirects(true);
        assert!(options.effective_allow_redirects(Method::Post));

        let options = RequestOptions::new().allow_redirects(false);
        assert!(!options.effective_allow_redirects(Method::Get));
    }

    #[test]
    fn test_parameters_preserve_insertion_order() {
        let options = RequestOptions::new()
            .parameter("first", "1")
            .parameters([("second", "2"), ("third", "3")]);
        let names: Vec<&str> = options
            .parameters
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_file_and_files_builders() {
        let options = RequestOptions::new()
            .file("single", "/tmp/a.bin")
            .files("many", ["/tmp/b.bin", "/tmp/c.bin"]);
        assert_eq!(options.files.len(), 2);
        assert_eq!(options.files[0].1.len(), 1);
        assert_eq!(options.files[1].1.len(), 2);
        assert_eq!(options.files[1].0, "many");
    }

    #[test]
    fn test_method_as_str() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Patch.as_str(), "PATCH");
        assert_eq!(Method::Head.to_string(), "HEAD");
    }

    #[test]
    fn test_proxy_url() {
        let proxy = Proxy::new("proxy.local", 8080, ProxyProtocol::Http);
        assert_eq!(proxy.url(), "http://proxy.local:8080");
    }
}
