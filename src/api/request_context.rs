use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::HeaderMap;

use crate::services::audit::RequestContext;

/// Pulls the client IP (from the connection the server accepted, not a
/// spoofable header) and user agent out of a request, for attaching to
/// an audit entry.
pub fn extract(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> RequestContext {
    RequestContext {
        ip_address: connect_info.map(|info| info.0.ip().to_string()),
        user_agent: headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
    }
}
