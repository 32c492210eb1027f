use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{request::Parts, StatusCode};
use std::{
    fmt::{self, Formatter},
    net::SocketAddr,
};

pub struct ClientIp(String);

impl ClientIp {
    pub fn new(ip: String) -> Self {
        ClientIp(ip)
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Try to get IP from common proxy headers
        for header in ["x-forwarded-for", "x-real-ip"] {
            if let Some(value) = parts.headers.get(header) {
                if let Ok(ip) = value.to_str() {
                    // X-Forwarded-For can carry a comma-separated chain
                    let first_ip = ip.split(',').next().unwrap_or(ip).trim();
                    return Ok(ClientIp(first_ip.to_string()));
                }
            }
        }

        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Ok(ClientIp(addr.ip().to_string()));
        }

        Ok(ClientIp("*:*".to_string()))
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
