//! HTTP response building module
//!
//! Builders for the status responses produced by dispatch and static serving.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Build a response with no headers and an empty body
fn build_empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = status;
    resp
}

/// Build 301 redirect response (directory without trailing slash)
pub fn build_301_response(location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header("Location", location)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            build_empty_response(StatusCode::MOVED_PERMANENTLY)
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", etag)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            build_empty_response(StatusCode::NOT_MODIFIED)
        })
}

/// Build 400 Bad Request response carrying a plain-text explanation
pub fn build_400_response(message: &str) -> Response<Full<Bytes>> {
    let body = format!("400 Bad Request: {message}");
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", body.len())
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("400", &e);
            build_empty_response(StatusCode::BAD_REQUEST)
        })
}

/// Build 404 Not Found response (empty body)
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_empty_response(StatusCode::NOT_FOUND)
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::PAYLOAD_TOO_LARGE)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("413 Payload Too Large")))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            build_empty_response(StatusCode::PAYLOAD_TOO_LARGE)
        })
}

/// Build 500 Internal Server Error response (empty body)
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_empty_response(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Build 501 Not Implemented response (empty body)
pub fn build_501_response() -> Response<Full<Bytes>> {
    build_empty_response(StatusCode::NOT_IMPLEMENTED)
}

/// Build generated HTML response (directory listings)
pub fn build_html_response(content: String) -> Response<Full<Bytes>> {
    let content_length = content.len();
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(Bytes::from(content)))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            build_500_response()
        })
}

/// Build static file response with `ETag`
pub fn build_file_response(data: Bytes, content_type: &str, etag: &str) -> Response<Full<Bytes>> {
    let content_length = data.len();
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("ETag", etag)
        .header("Cache-Control", "public, max-age=3600")
        .body(Full::new(data))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            build_500_response()
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_empty_status_responses() {
        for (resp, status) in [
            (build_404_response(), 404),
            (build_500_response(), 500),
            (build_501_response(), 501),
        ] {
            assert_eq!(resp.status(), status);
            assert!(resp.headers().is_empty());
        }
    }

    #[tokio::test]
    async fn test_400_carries_message() {
        let resp = build_400_response("query parameter 'n' is invalid");
        assert_eq!(resp.status(), 400);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(
            body,
            Bytes::from("400 Bad Request: query parameter 'n' is invalid")
        );
    }

    #[test]
    fn test_301_location() {
        let resp = build_301_response("/files/docs/");
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["location"], "/files/docs/");
    }

    #[test]
    fn test_file_response_headers() {
        let resp = build_file_response(Bytes::from("hi"), "text/plain", "\"abc\"");
        assert_eq!(resp.headers()["content-length"], "2");
        assert_eq!(resp.headers()["etag"], "\"abc\"");
        assert_eq!(resp.headers()["content-type"], "text/plain");
    }
}
