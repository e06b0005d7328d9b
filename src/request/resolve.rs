//! URL and proxy resolution.
//!
//! Derives the transport endpoint (host, port, path, TLS flag) for a hop.
//! With a proxy override the connection targets the proxy and the request
//! path is the full target URL (proxy forwarding convention); otherwise the
//! target URL itself is parsed, with default ports 443 (https) and 80 (http).

use url::Url;

use super::error::RequestError;
use super::options::{Proxy, ProxyProtocol};

/// Transport endpoint for one hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Request path including the query string; the full target URL when
    /// going through a proxy.
    pub path: String,
    pub is_https: bool,
}

/// Resolves the endpoint for `url`, honoring an optional proxy override.
///
/// # Errors
///
/// Returns [`RequestError::InvalidUrl`] when the URL cannot be parsed into
/// an http(s) host and path.
pub(crate) fn resolve(url: &str, proxy: Option<&Proxy>) -> Result<Endpoint, RequestError> {
    let parsed = parse_http_url(url)?;

    if let Some(proxy) = proxy {
        return Ok(Endpoint {
            host: proxy.host.clone(),
            port: proxy.port,
            path: url.to_string(),
            is_https: proxy.protocol == ProxyProtocol::Https,
        });
    }

    let is_https = parsed.scheme() == "https";
    let host = parsed
        .host_str()
        .ok_or_else(|| RequestError::invalid_url(url))?
        .to_string();
    let port = parsed
        .port()
        .unwrap_or(if is_https { 443 } else { 80 });
    let mut path = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        path.push('?');
        path.push_str(query);
    }

    Ok(Endpoint {
        host,
        port,
        path,
        is_https,
    })
}

/// Parses `url` and requires an http(s) scheme with a host.
pub(crate) fn parse_http_url(url: &str) -> Result<Url, RequestError> {
    let parsed = Url::parse(url).map_err(|_| RequestError::invalid_url(url))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(RequestError::invalid_url(url));
    }
    Ok(parsed)
}

/// Resolves a redirect Location against the current hop URL.
///
/// Relative Locations join against the current URL; absolute ones replace
/// it wholesale.
///
/// # Errors
///
/// Returns [`RequestError::InvalidUrl`] when the joined result is not a
/// valid http(s) URL.
pub(crate) fn resolve_location(current: &str, location: &str) -> Result<String, RequestError> {
    let base = parse_http_url(current)?;
    let joined = base
        .join(location)
        .map_err(|_| RequestError::invalid_url(location))?;
    if !matches!(joined.scheme(), "http" | "https") {
        return Err(RequestError::invalid_url(location));
    }
    Ok(joined.into())
}
