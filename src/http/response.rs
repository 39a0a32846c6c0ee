//! HTTP response building module
//!
//! Every builder takes the header set computed for the request, so
//! configured security headers are present on success and error responses
//! alike.

use crate::headers::HeaderSet;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Response, StatusCode};

const NOT_FOUND_BODY: &str = "<h1>404 Not Found</h1>";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Build 200 OK response carrying file content
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    headers: &HeaderSet,
    is_head: bool,
) -> Response<Full<Bytes>> {
    build_response(StatusCode::OK, content_type, data, headers, is_head)
}

/// Build 400 Bad Request response
pub fn build_400_response(headers: &HeaderSet, is_head: bool) -> Response<Full<Bytes>> {
    build_text_response(StatusCode::BAD_REQUEST, "Bad Request", headers, is_head)
}

/// Build 403 Forbidden response
pub fn build_403_response(headers: &HeaderSet, is_head: bool) -> Response<Full<Bytes>> {
    build_text_response(StatusCode::FORBIDDEN, "Forbidden", headers, is_head)
}

/// Build 404 Not Found response
pub fn build_404_response(headers: &HeaderSet, is_head: bool) -> Response<Full<Bytes>> {
    build_response(
        StatusCode::NOT_FOUND,
        HTML_CONTENT_TYPE,
        Bytes::from_static(NOT_FOUND_BODY.as_bytes()),
        headers,
        is_head,
    )
}

/// Build 500 Internal Server Error response
pub fn build_500_response(headers: &HeaderSet, is_head: bool) -> Response<Full<Bytes>> {
    build_text_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        headers,
        is_head,
    )
}

fn build_text_response(
    status: StatusCode,
    body: &'static str,
    headers: &HeaderSet,
    is_head: bool,
) -> Response<Full<Bytes>> {
    build_response(
        status,
        TEXT_CONTENT_TYPE,
        Bytes::from_static(body.as_bytes()),
        headers,
        is_head,
    )
}

fn build_response(
    status: StatusCode,
    content_type: &str,
    data: Bytes,
    headers: &HeaderSet,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut response = Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = status;
            fallback
        });

    apply_headers(&mut response, headers);
    response
}

/// Write configured headers onto a response
///
/// Configured values replace any header of the same name already set.
/// Pairs that are not valid HTTP headers are skipped; they were reported
/// when the rules were loaded.
pub fn apply_headers<B>(response: &mut Response<B>, headers: &HeaderSet) {
    let target = response.headers_mut();
    for (name, value) in headers.iter() {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            target.insert(name, value);
        }
    }
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn security_headers() -> HeaderSet {
        let mut headers = HeaderSet::new();
        headers.insert("X-Frame-Options", "DENY");
        headers.insert("X-Content-Type-Options", "nosniff");
        headers
    }

    async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_file_response() {
        let response = build_file_response(
            Bytes::from_static(b"body{}"),
            "text/css",
            &security_headers(),
            false,
        );
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-type"], "text/css");
        assert_eq!(response.headers()["content-length"], "6");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(body_of(response).await, "body{}");
    }

    #[tokio::test]
    async fn test_error_responses_carry_headers() {
        let headers = security_headers();
        let cases = [
            (build_400_response(&headers, false), 400, "Bad Request"),
            (build_403_response(&headers, false), 403, "Forbidden"),
            (build_404_response(&headers, false), 404, "<h1>404 Not Found</h1>"),
            (build_500_response(&headers, false), 500, "Internal Server Error"),
        ];
        for (response, status, body) in cases {
            assert_eq!(response.status(), status);
            assert_eq!(response.headers()["x-frame-options"], "DENY");
            assert_eq!(response.headers()["x-content-type-options"], "nosniff");
            assert_eq!(body_of(response).await, body);
        }
    }

    #[test]
    fn test_404_is_html() {
        let response = build_404_response(&HeaderSet::new(), false);
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_head_has_length_but_no_body() {
        let response = build_file_response(
            Bytes::from_static(b"12345"),
            "text/plain",
            &HeaderSet::new(),
            true,
        );
        assert_eq!(response.headers()["content-length"], "5");
        assert!(body_of(response).await.is_empty());
    }

    #[test]
    fn test_configured_content_type_wins() {
        let mut headers = HeaderSet::new();
        headers.insert("Content-Type", "text/plain");
        let response = build_file_response(Bytes::new(), "text/html", &headers, false);
        let values: Vec<_> = response.headers().get_all("content-type").iter().collect();
        assert_eq!(values, vec!["text/plain"]);
    }

    #[test]
    fn test_invalid_configured_headers_are_skipped() {
        let mut headers = HeaderSet::new();
        headers.insert("Bad Header", "x");
        headers.insert("X-Newline", "a\nb");
        headers.insert("X-Good", "ok");
        let response = build_403_response(&headers, false);
        assert_eq!(response.status(), 403);
        assert_eq!(response.headers()["x-good"], "ok");
        assert!(response.headers().get("x-newline").is_none());
    }
}
