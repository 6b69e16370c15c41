// Keep-alive HTTP endpoint for external uptime monitors

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tracing::{error, info};

pub const ALIVE_MESSAGE: &str = "O Mago está online.";

pub fn router() -> Router {
    Router::new().route("/", get(|| async { ALIVE_MESSAGE }))
}

/// Serve the endpoint on `0.0.0.0:port` until the process exits.
/// Failures are logged; the bot keeps running without it.
pub async fn serve(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind keep-alive server on {}: {:?}", addr, e);
            return;
        }
    };

    info!("Keep-alive server listening on {}", addr);
    if let Err(e) = axum::serve(listener, router()).await {
        error!("Keep-alive server stopped: {:?}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root_is_always_ok() {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], ALIVE_MESSAGE.as_bytes());
    }
}
