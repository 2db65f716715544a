//! Canned error responses.
//!
//! # Responsibilities
//! - Serve a configured override file with its optional status code
//! - Fall back to a built-in HTML page with a canned message
//!
//! # Design Decisions
//! - Override files are read on every response, never cached
//! - An unreadable override is logged and never changes the status code
//! - Producing a response cannot fail
//! - Override pages always carry a Content-Type (extension, then body sniffing)

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;

use crate::config::ErrorOverride;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

const NOT_FOUND_MESSAGE: &str = "Hmmm, there's nothing here matching that URL :-(

Maybe a typo in the URL?";

const INTERNAL_ERROR_MESSAGE: &str = "Dang it, something broke :-(

Our hackers are working on it...

Please try again later";

/// Canned message shown for `status`, empty for unlisted codes.
pub fn error_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => NOT_FOUND_MESSAGE,
        StatusCode::INTERNAL_SERVER_ERROR => INTERNAL_ERROR_MESSAGE,
        _ => "",
    }
}

/// Build an error response for `status`, preferring the override file.
pub async fn respond(status: StatusCode, over: Option<&ErrorOverride>) -> Response {
    if let Some(over) = over {
        match tokio::fs::read(&over.file).await {
            Ok(body) => return override_response(status, over, body),
            Err(e) => {
                tracing::warn!(
                    file = %over.file.display(),
                    error = %e,
                    "Failed to read error override, using built-in page"
                );
            }
        }
    }

    default_response(status)
}

fn override_response(fallback: StatusCode, over: &ErrorOverride, body: Vec<u8>) -> Response {
    let status = match over.status_override() {
        Some(code) => StatusCode::from_u16(code).unwrap_or_else(|_| {
            tracing::warn!(status_code = code, "Invalid override status code, ignoring");
            fallback
        }),
        None => fallback,
    };

    let content_type = override_content_type(over, &body);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Content type of an override page: by extension, then by sniffing the body.
fn override_content_type(over: &ErrorOverride, body: &[u8]) -> &'static str {
    let by_extension = over
        .file
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
    if by_extension || looks_like_html(body) {
        HTML_CONTENT_TYPE
    } else if std::str::from_utf8(body).is_ok() {
        TEXT_CONTENT_TYPE
    } else {
        BINARY_CONTENT_TYPE
    }
}

fn looks_like_html(body: &[u8]) -> bool {
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    let head = &body[start..body.len().min(start + 14)];

    ["<!doctype html", "<html", "<head", "<body"]
        .iter()
        .any(|tag| head.len() >= tag.len() && head[..tag.len()].eq_ignore_ascii_case(tag.as_bytes()))
}

/// The built-in page for `status`.
pub fn default_response(status: StatusCode) -> Response {
    let mut response = Response::new(Body::from(render_page(status)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    response
}

/// Render the built-in HTML page for `status`.
pub fn render_page(status: StatusCode) -> String {
    let reason = escape_html(status.canonical_reason().unwrap_or(""));
    let message = escape_html(error_message(status));
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>{code} {reason}</title>
<meta http-equiv="Content-Type" content="text/html; charset=utf-8" />
</head>
<body>
<h1>{reason}</h1>
<pre>
{message}
</pre>
</body>
</html>
"#,
        code = status.as_u16(),
        reason = reason,
        message = message,
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
