//! Redirect-following transaction executor.
//!
//! One transport call per hop, strictly sequential: issue, inspect,
//! maybe redirect. The redirect count and current URL are loop state owned
//! here, never written back into the caller's options. The transport is a
//! reqwest client built with redirects disabled, so every hop decision is
//! made in this loop.

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION};
use tracing::debug;

use super::body::{self, RequestBody};
use super::error::RequestError;
use super::options::{Method, RequestOptions};
use super::resolve;

/// Executes the redirect loop and returns the final hop's response, ready
/// for materialization.
///
/// The payload is built once, before any network I/O (upload file reads are
/// atomic), and attached only to the first hop: redirect hops re-issue with
/// the same method, headers, and cookies, but never re-send a body.
///
/// # Errors
///
/// Returns [`RequestError::InvalidUrl`] for an unparsable target or
/// Location, [`RequestError::FileRead`] for unreadable upload sources,
/// [`RequestError::TooManyRedirects`] when the chain exceeds the bound,
/// [`RequestError::Timeout`] when the hop timer fires, and
/// [`RequestError::Transport`] for connection failures.
pub(crate) async fn execute(
    transport: &reqwest::Client,
    method: Method,
    url: &str,
    options: &RequestOptions,
) -> Result<reqwest::Response, RequestError> {
    let allow_redirects = options.effective_allow_redirects(method);
    let mut payload = body::build_body(method, options)?;

    // GET parameters travel in the query string, applied to the initial
    // target only; Location URLs arrive complete. With files present the
    // parameters become multipart fields instead.
    let mut current_url = if method == Method::Get
        && !options.parameters.is_empty()
        && options.files.is_empty()
    {
        body::append_query(url, &options.parameters)?
    } else {
        resolve::parse_http_url(url)?.into()
    };
    let mut redirect_count: u32 = 0;

    loop {
        let endpoint = resolve::resolve(&current_url, options.proxy.as_ref())?;
        debug!(
            method = %method,
            host = %endpoint.host,
            port = endpoint.port,
            https = endpoint.is_https,
            path = %endpoint.path,
            redirect = redirect_count,
            "issuing hop"
        );

        let request = assemble_hop(
            transport,
            method,
            &current_url,
            options,
            payload.take(),
        );

        let response = request
            .send()
            .await
            .map_err(|e| classify_send_error(&current_url, e, options.timeout.is_some()))?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match location {
            Some(location) if allow_redirects => {
                if redirect_count >= options.max_redirects {
                    return Err(RequestError::too_many_redirects(
                        &current_url,
                        options.max_redirects,
                    ));
                }
                let next = resolve::resolve_location(&current_url, &location)?;
                debug!(from = %current_url, to = %next, "following redirect");
                current_url = next;
                redirect_count += 1;
            }
            _ => return Ok(response),
        }
    }
}

/// Classifies a send-phase failure. Only a timer the caller armed maps to
/// `Timeout`: the transport's built-in connect timeout also satisfies
/// `is_timeout`, and with no caller timer that stall is a plain transport
/// failure.
fn classify_send_error(url: &str, error: reqwest::Error, timer_armed: bool) -> RequestError {
    if timer_armed && error.is_timeout() {
        RequestError::timeout(url)
    } else {
        RequestError::transport(url, error)
    }
}

/// Assembles one transport-level request: body-derived headers first, then
/// the Cookie header, then caller headers last so the caller overrides the
/// engine's defaults. The payload is present only on the first hop.
fn assemble_hop(
    transport: &reqwest::Client,
    method: Method,
    url: &str,
    options: &RequestOptions,
    payload: Option<RequestBody>,
) -> reqwest::RequestBuilder {
    let mut request = transport.request(method.as_reqwest(), url);

    if let Some(timeout) = options.timeout {
        request = request.timeout(timeout);
    }

    if let Some(payload) = payload {
        if let Some(content_type) = &payload.content_type {
            request = request.header(CONTENT_TYPE, content_type.as_str());
        }
        request = request
            .header(CONTENT_LENGTH, payload.bytes.len())
            .body(payload.bytes);
    }

    if !options.cookies.is_empty() {
        request = request.header(COOKIE, options.cookies.join("; "));
    }

    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    request
}
