//! Request inspection: where the target URL comes from.
//!
//! # Responsibilities
//! - Find the `url` parameter in the query string or the body
//! - Parse it into a `Url` and enforce the http/https allow-list
//!
//! # Precedence
//! The query value wins whenever it is present and non-empty. A repeated
//! `url` key, or a bracketed one (`url[]`, `url[k]`), also wins, and is then
//! rejected because it is not a single string. Only otherwise is the body
//! consulted, as JSON or as a form depending on `content-type`.

use axum::http::{header::CONTENT_TYPE, HeaderMap};
use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::http::response::ProxyError;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Name of the parameter holding the target URL.
const URL_PARAM: &str = "url";

/// The `url` parameter as found in one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlParam {
    /// Not supplied at all.
    Absent,
    /// A single string value (possibly empty).
    Text(String),
    /// Supplied, but not as a single string (array, number, object...).
    NotText,
}

impl UrlParam {
    /// Whether this value takes precedence over later sources.
    fn is_set(&self) -> bool {
        match self {
            UrlParam::Absent => false,
            UrlParam::Text(s) => !s.is_empty(),
            UrlParam::NotText => true,
        }
    }
}

/// Extract `url`, query first, then body.
pub fn extract_url(query: Option<&str>, headers: &HeaderMap, body: &[u8]) -> UrlParam {
    let from_query = query.map_or(UrlParam::Absent, from_form);
    if from_query.is_set() {
        return from_query;
    }
    from_body(headers, body)
}

/// Turn the extracted parameter into an allowed target.
pub fn resolve_target(param: UrlParam) -> Result<Url, ProxyError> {
    let raw = match param {
        UrlParam::Text(raw) if !raw.is_empty() => raw,
        _ => return Err(ProxyError::MissingUrl),
    };

    let target = Url::parse(&raw).map_err(ProxyError::InvalidUrl)?;

    match target.scheme() {
        "http" | "https" => Ok(target),
        other => Err(ProxyError::UnsupportedScheme(other.to_string())),
    }
}

fn from_form(encoded: &str) -> UrlParam {
    let mut values = Vec::new();
    for (key, value) in form_urlencoded::parse(encoded.as_bytes()) {
        if key == URL_PARAM {
            values.push(value.into_owned());
        } else if key.strip_prefix(URL_PARAM).is_some_and(|rest| rest.starts_with('[')) {
            // `url[]=..` and `url[k]=..` build an array or object.
            return UrlParam::NotText;
        }
    }

    match values.len() {
        0 => UrlParam::Absent,
        1 => UrlParam::Text(values.remove(0)),
        _ => UrlParam::NotText,
    }
}

fn from_body(headers: &HeaderMap, body: &[u8]) -> UrlParam {
    if body.is_empty() {
        return UrlParam::Absent;
    }

    match body_kind(headers) {
        Some(BodyKind::Json) => match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => match fields.get(URL_PARAM) {
                None | Some(Value::Null) => UrlParam::Absent,
                Some(Value::String(value)) => UrlParam::Text(value.clone()),
                Some(_) => UrlParam::NotText,
            },
            _ => UrlParam::Absent,
        },
        Some(BodyKind::Form) => match std::str::from_utf8(body) {
            Ok(encoded) => from_form(encoded),
            Err(_) => UrlParam::Absent,
        },
        None => UrlParam::Absent,
    }
}

enum BodyKind {
    Json,
    Form,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "application/json" || essence.ends_with("+json") {
        Some(BodyKind::Json)
    } else if essence == "application/x-www-form-urlencoded" {
        Some(BodyKind::Form)
    } else {
        None
    }
}
