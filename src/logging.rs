//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::internal_server_error::ServerErrorPage;

/// The number of bytes of a request or response body that is logged at the
/// `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Headers whose values are secrets and must never reach the logs.
const REDACTED_HEADERS: [&str; 4] = ["cookie", "set-cookie", "apikey", "authorization"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level.
/// The values of headers that carry credentials are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read request body: {error}");
            return ServerErrorPage::default().into_response();
        }
    };

    let headers = redact_headers(&parts.headers);
    let body_text = String::from_utf8_lossy(&body_bytes);
    log_body(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &headers,
        &body_text,
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return ServerErrorPage::default().into_response();
        }
    };

    let headers = redact_headers(&parts.headers);
    let body_text = String::from_utf8_lossy(&body_bytes);
    log_body(
        &format!("Sending response: {}", parts.status),
        &headers,
        &body_text,
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Result<Bytes, axum::Error> {
    axum::body::to_bytes(body, usize::MAX).await
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    for name in REDACTED_HEADERS {
        if let header::Entry::Occupied(mut entry) = headers.entry(name) {
            entry.insert(HeaderValue::from_static("********"));
        }
    }

    headers
}

/// The longest prefix of `text` that is at most `limit` bytes long and does
/// not split a character.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_body(summary: &str, headers: &HeaderMap, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "{summary}\nheaders: {headers:#?}\nbody: {:}...",
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{summary}\nheaders: {headers:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        http::{HeaderMap, HeaderValue},
        middleware,
        routing::post,
    };
    use axum_test::TestServer;

    use super::{logging_middleware, redact_headers, truncate};

    #[test]
    fn redacts_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("session_id=secret"));
        headers.insert("apikey", HeaderValue::from_static("anon-key"));
        headers.insert("authorization", HeaderValue::from_static("Bearer anon-key"));
        headers.insert("content-type", HeaderValue::from_static("text/html"));

        let redacted = redact_headers(&headers);

        assert_eq!(redacted["cookie"], "********");
        assert_eq!(redacted["apikey"], "********");
        assert_eq!(redacted["authorization"], "********");
        assert_eq!(redacted["content-type"], "text/html");
    }

    #[test]
    fn redacts_every_set_cookie() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));

        let redacted = redact_headers(&headers);

        let values: Vec<_> = redacted.get_all("set-cookie").iter().collect();
        assert_eq!(values, ["********"]);
    }

    #[test]
    fn truncation_does_not_split_characters() {
        let text = "ab€cd";

        assert_eq!(truncate(text, 3), "ab");
        assert_eq!(truncate(text, 5), "ab€");
        assert_eq!(truncate(text, 64), text);
    }

    #[tokio::test]
    async fn passes_body_through() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let body = "item=Coffee&price=5".repeat(10);

        let response = server.post("/echo").text(&body).await;

        response.assert_status_ok();
        response.assert_text(body);
    }
}
