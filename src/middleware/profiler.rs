use std::sync::Arc;

use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use crate::error::ProfilerError;
use crate::profiler::{capture, Profiler};

/// Axum middleware that profiles one request and appends the toolbar to
/// interactive HTML responses.
///
/// The handler runs with a fresh session as its task's current session, so
/// `tracing` events and `record_query` calls made while handling it land in
/// the toolbar. Profiler failures are logged and the handler's response is
/// returned unchanged.
pub async fn profile_request(
    State(profiler): State<Arc<Profiler>>,
    req: Request,
    next: Next,
) -> Response {
    if !profiler.enabled() {
        return next.run(req).await;
    }

    // HEAD responses carry no body to append to.
    let skip = is_ajax(req.headers()) || req.method() == Method::HEAD;
    let session = profiler.start_session();
    let span = tracing::info_span!(
        "request",
        id = %session.short_id(),
        method = %req.method(),
        path = %req.uri().path(),
    );

    capture::scope(session, async move {
        let response = next.run(req).await;
        let interactive = !skip && is_interactive(response.status(), response.headers());

        let rendered = capture::with_current(|session| {
            let out = profiler.render(session, interactive);
            (out, session.logs().len(), session.queries().len())
        });

        match rendered {
            Some((Ok(Some(toolbar)), logs, queries)) => {
                tracing::debug!(
                    status = response.status().as_u16(),
                    logs,
                    queries,
                    "toolbar rendered"
                );
                inject_toolbar(response, &toolbar).await
            }
            Some((Err(e), _, _)) => {
                tracing::warn!(error = %e, "toolbar render failed");
                response
            }
            Some((Ok(None), _, _)) | None => response,
        }
    })
    .instrument(span)
    .await
}

/// `X-Requested-With: XMLHttpRequest` marks a background call.
pub fn is_ajax(request: &HeaderMap) -> bool {
    request
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
}

/// Whether a response body can take the toolbar: a complete, uncompressed
/// HTML page. Informational, empty, not-modified and partial responses are
/// left alone, as is anything carrying `Content-Range`.
pub fn is_interactive(status: StatusCode, headers: &HeaderMap) -> bool {
    if status.is_informational()
        || matches!(
            status,
            StatusCode::NO_CONTENT | StatusCode::PARTIAL_CONTENT | StatusCode::NOT_MODIFIED
        )
    {
        return false;
    }
    if headers.contains_key(header::CONTENT_ENCODING) || headers.contains_key(header::CONTENT_RANGE) {
        return false;
    }
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.split(';')
                .next()
                .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/html"))
        })
}

/// Buffer the body and insert `toolbar` before its last `</body>`, or at the
/// end when there is none. A body that fails mid-stream cannot be passed on
/// intact, so it becomes a 500 carrying the error.
pub async fn inject_toolbar(response: Response, toolbar: &str) -> Response {
    let (mut parts, body) = response.into_parts();
    let bytes = match body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let e = ProfilerError::Body(e.to_string());
            tracing::warn!(error = %e, "toolbar not injected");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let at = rfind_ignore_ascii_case(&bytes, b"</body>").unwrap_or(bytes.len());
    let mut out = Vec::with_capacity(bytes.len() + toolbar.len());
    out.extend_from_slice(&bytes[..at]);
    out.extend_from_slice(toolbar.as_bytes());
    out.extend_from_slice(&bytes[at..]);

    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(out))
}

fn rfind_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .rposition(|w| w.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use std::io;

    use axum::{body::Bytes, http::HeaderValue};
    use futures_util::stream;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn ajax_detection() {
        assert!(is_ajax(&headers(&[("x-requested-with", "XMLHttpRequest")])));
        assert!(!is_ajax(&headers(&[("accept", "text/html")])));
    }

    #[test]
    fn only_plain_html_is_interactive() {
        let ok = StatusCode::OK;
        assert!(is_interactive(ok, &headers(&[("content-type", "text/html; charset=utf-8")])));
        assert!(!is_interactive(ok, &headers(&[("content-type", "application/json")])));
        assert!(!is_interactive(ok, &headers(&[])));
        assert!(!is_interactive(ok, &headers(&[
            ("content-type", "text/html"),
            ("content-encoding", "gzip"),
        ])));
    }

    #[test]
    fn error_pages_are_interactive() {
        let html = headers(&[("content-type", "text/html")]);
        assert!(is_interactive(StatusCode::NOT_FOUND, &html));
        assert!(is_interactive(StatusCode::INTERNAL_SERVER_ERROR, &html));
    }

    #[test]
    fn partial_and_bodiless_statuses_are_not_interactive() {
        let html = headers(&[("content-type", "text/html")]);
        for status in [
            StatusCode::CONTINUE,
            StatusCode::NO_CONTENT,
            StatusCode::PARTIAL_CONTENT,
            StatusCode::NOT_MODIFIED,
        ] {
            assert!(!is_interactive(status, &html), "{status}");
        }

        let ranged = headers(&[("content-type", "text/html"), ("content-range", "bytes 0-9/263")]);
        assert!(!is_interactive(StatusCode::OK, &ranged));
    }

    #[tokio::test]
    async fn toolbar_goes_before_closing_body() {
        let response = Response::builder()
            .header(header::CONTENT_LENGTH, "26")
            .body(Body::from("<html><BODY>hi</BODY></html>"))
            .expect("response");

        let response = inject_toolbar(response, "[tb]").await;
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());

        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&bytes[..], b"<html><BODY>hi[tb]</BODY></html>");
    }

    #[tokio::test]
    async fn toolbar_is_appended_without_body_tag() {
        let response = Response::new(Body::from("<p>fragment</p>"));
        let response = inject_toolbar(response, "[tb]").await;
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&bytes[..], b"<p>fragment</p>[tb]");
    }

    #[tokio::test]
    async fn failing_body_becomes_server_error() {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"<p>")),
            Err(io::Error::new(io::ErrorKind::Other, "connection reset")),
        ];
        let response = Response::builder()
            .header(header::CONTENT_TYPE, "text/html")
            .header(header::CONTENT_LENGTH, "2048")
            .body(Body::from_stream(stream::iter(chunks)))
            .expect("response");

        let response = inject_toolbar(response, "[tb]").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_ne!(
            response.headers().get(header::CONTENT_LENGTH).map(|v| v.as_bytes()),
            Some(&b"2048"[..])
        );

        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let text = String::from_utf8(bytes.to_vec()).expect("utf-8");
        assert!(text.contains("response body"), "{text}");
        assert!(text.contains("connection reset"), "{text}");
        assert!(!text.contains("[tb]"));
    }
}
