//! Rate limiting middleware

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use super::rate_limit::RateLimiter;

/// Remote address of the connection that sent `req`
///
/// Requests without connection info (e.g. served in-process) share the
/// unspecified address bucket.
pub fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Reject requests over the per-client limit before they reach the handler
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&req);

    match limiter.check(ip).await {
        Ok(()) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}
