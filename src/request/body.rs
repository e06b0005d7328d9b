//! Request body construction.
//!
//! Two mutually exclusive strategies, selected by the options shape:
//! scalar bodies (form-urlencoded parameters, JSON, raw override) and
//! multipart/form-data for uploads. Multipart assembly is binary-safe
//! byte concatenation, and every upload file is read synchronously before
//! any network I/O so a read failure aborts the build with nothing sent.

use std::path::Path;

use tracing::debug;
use url::form_urlencoded;

use super::error::RequestError;
use super::options::{Method, RequestOptions};

/// Fixed multipart boundary token, shared process-wide.
///
/// Deliberately non-random for wire compatibility with the historical
/// implementation; see DESIGN.md for the collision discussion.
pub(crate) const MULTIPART_BOUNDARY: &str =
    "---------------------------10102754414578508781458777923";

const CRLF: &str = "\r\n";

/// A wire-ready payload plus its body-derived Content-Type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestBody {
    pub bytes: Vec<u8>,
    /// None for raw bodies: the caller supplies Content-Type via headers.
    pub content_type: Option<String>,
}

/// One serialized unit of a multipart body.
///
/// Ordering is insertion order of parameters, then files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MultipartPart {
    Field {
        name: String,
        value: String,
    },
    FileField {
        field_name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// Builds the payload for a transaction, or `None` when the request has no
/// body (GET parameters go to the query string instead, see
/// [`append_query`]).
///
/// Precedence: non-empty `files` forces multipart regardless of method;
/// then the raw `body` override; then `json`; then form-encoded
/// `parameters` for POST/PUT/PATCH.
///
/// # Errors
///
/// Returns [`RequestError::FileRead`] when any upload file is unreadable.
pub(crate) fn build_body(
    method: Method,
    options: &RequestOptions,
) -> Result<Option<RequestBody>, RequestError> {
    if !options.files.is_empty() {
        return build_multipart(options).map(Some);
    }

    if let Some(raw) = &options.body {
        return Ok(Some(RequestBody {
            bytes: raw.clone(),
            content_type: None,
        }));
    }

    if let Some(json) = &options.json {
        // serde_json::to_vec only fails on non-serializable map keys, which
        // Value cannot contain.
        let bytes = serde_json::to_vec(json).unwrap_or_default();
        return Ok(Some(RequestBody {
            bytes,
            content_type: Some("application/json".to_string()),
        }));
    }

    if method.parameters_as_body() && !options.parameters.is_empty() {
        let encoded = encode_parameters(&options.parameters);
        return Ok(Some(RequestBody {
            bytes: encoded.into_bytes(),
            content_type: Some("application/x-www-form-urlencoded; charset=UTF-8".to_string()),
        }));
    }

    Ok(None)
}

/// URL-encodes ordered parameter pairs into `a=1&b=2` form.
pub(crate) fn encode_parameters(parameters: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(parameters.iter().map(|(n, v)| (n.as_str(), v.as_str())))
        .finish()
}

/// Appends GET parameters to the URL's query string.
///
/// # Errors
///
/// Returns [`RequestError::InvalidUrl`] when the URL does not parse.
pub(crate) fn append_query(
    url: &str,
    parameters: &[(String, String)],
) -> Result<String, RequestError> {
    let mut parsed = super::resolve::parse_http_url(url)?;
    parsed
        .query_pairs_mut()
        .extend_pairs(parameters.iter().map(|(n, v)| (n.as_str(), v.as_str())));
    Ok(parsed.into())
}

/// Assembles the multipart/form-data body: one part per parameter, then
/// one part per file path (array-valued fields repeat the field name).
fn build_multipart(options: &RequestOptions) -> Result<RequestBody, RequestError> {
    let parts = gather_parts(options)?;
    let bytes = encode_parts(&parts);
    debug!(
        parts = parts.len(),
        bytes = bytes.len(),
        "assembled multipart body"
    );
    Ok(RequestBody {
        bytes,
        content_type: Some(format!(
            "multipart/form-data; boundary={MULTIPART_BOUNDARY}"
        )),
    })
}

/// Collects parts in wire order, reading every file up front so that an
/// unreadable file fails the whole build before anything is sent.
fn gather_parts(options: &RequestOptions) -> Result<Vec<MultipartPart>, RequestError> {
    let mut parts = Vec::new();

    for (name, value) in &options.parameters {
        parts.push(MultipartPart::Field {
            name: name.clone(),
            value: value.clone(),
        });
    }

    for (field_name, paths) in &options.files {
        for path in paths {
            let bytes =
                std::fs::read(path).map_err(|e| RequestError::file_read(path.clone(), e))?;
            parts.push(MultipartPart::FileField {
                field_name: field_name.clone(),
                file_name: file_name_of(path),
                bytes,
            });
        }
    }

    Ok(parts)
}

/// Serializes parts between boundary delimiters.
///
/// Byte-level (not string) concatenation: file content is inserted
/// unmodified, so multi-byte and non-UTF-8 payloads survive intact.
fn encode_parts(parts: &[MultipartPart]) -> Vec<u8> {
    let separator = format!("--{MULTIPART_BOUNDARY}");
    let mut body = Vec::new();

    for part in parts {
        match part {
            MultipartPart::Field { name, value } => {
                let header = format!(
                    "{separator}{CRLF}Content-Disposition: form-data; name=\"{}\"{CRLF}{CRLF}",
                    urlencoding::encode(name)
                );
                body.extend_from_slice(header.as_bytes());
                body.extend_from_slice(urlencoding::encode(value).as_bytes());
                body.extend_from_slice(CRLF.as_bytes());
            }
            MultipartPart::FileField {
                field_name,
                file_name,
                bytes,
            } => {
                let header = format!(
                    "{separator}{CRLF}Content-Disposition: file; name=\"{field_name}\"; \
                     filename=\"{file_name}\"{CRLF}Content-Type: application/octet-stream\
                     {CRLF}{CRLF}"
                );
                body.extend_from_slice(header.as_bytes());
                body.extend_from_slice(bytes);
                body.extend_from_slice(CRLF.as_bytes());
            }
        }
    }

    body.extend_from_slice(format!("{separator}--{CRLF}").as_bytes());
    body
}

/// Last path component, with backslashes normalized so Windows-style paths
/// yield the bare file name.
fn file_name_of(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    normalized
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
