use std::net::SocketAddr;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

const SLOW_REQUEST_THRESHOLD: std::time::Duration = std::time::Duration::from_secs(1);
const MAX_BODY_PEEK: usize = 64 * 1024;

/// Logs every request: method, path, query, user, status, duration,
/// client IP, user agent, and a generated request id. Requests slower
/// than one second are logged at `warn` instead of `info`.
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();
    let client_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let user_agent = req
        .headers()
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (req, user) = extract_user(req, &path).await;

    let start = Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed();
    let status = response.status().as_u16();

    if duration > SLOW_REQUEST_THRESHOLD {
        tracing::warn!(%request_id, %method, path, query, user, status, duration_ms = duration.as_millis() as u64, client_ip, user_agent, "slow request");
    } else {
        tracing::info!(%request_id, %method, path, query, user, status, duration_ms = duration.as_millis() as u64, client_ip, user_agent, "request");
    }

    response
}

/// Best-effort user identifier for the log line: a `user_id` query
/// parameter, a `/users/{id}` path segment, or a `user_id` field in a
/// JSON body — in that order, none of which require route-specific
/// cooperation from the handler. Falls back to "anonymous". The body is
/// peeked, not consumed: it's re-buffered onto the returned request so
/// the handler downstream still sees the full bytes.
async fn extract_user(req: Request<Body>, path: &str) -> (Request<Body>, String) {
    if let Some(user) = req.uri().query().and_then(query_user_id) {
        return (req, user);
    }

    if let Some(user) = path_user_id(path) {
        return (req, user);
    }

    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_PEEK).await {
        Ok(bytes) => bytes,
        Err(_) => return (Request::from_parts(parts, Body::empty()), "anonymous".to_string()),
    };

    let user = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|v| v.get("user_id").and_then(|u| u.as_str().map(|s| s.to_string())))
        .unwrap_or_else(|| "anonymous".to_string());

    (Request::from_parts(parts, Body::from(bytes)), user)
}

fn query_user_id(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?;
        let value = parts.next()?;
        (key == "user_id").then(|| value.to_string())
    })
}

fn path_user_id(path: &str) -> Option<String> {
    let mut segments = path.split('/');
    while let Some(segment) = segments.next() {
        if segment == "users" {
            return segments.next().map(|s| s.to_string());
        }
    }
    None
}
