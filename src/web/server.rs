//! HTTP(S) server for the admin console

use axum::{response::Redirect, routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::admin::{admin_router, AdminState};
use crate::config::{ConsoleConfig, TlsConfig};

/// How often expired sessions and confirmations are swept
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// The full console application: health check plus the `/admin` tree
pub fn build_app(state: AdminState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/admin") }))
        .route("/health", get(health))
        .nest("/admin", admin_router(state))
        .layer(TraceLayer::new_for_http())
}

/// Start the console, over TLS when a certificate is configured
pub async fn start_server(config: &ConsoleConfig, state: AdminState) -> anyhow::Result<()> {
    spawn_cleanup(state.clone());
    let app = build_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    match &config.tls {
        Some(tls) => serve_tls(addr, tls, app).await,
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
            info!("Admin console listening on http://{}/admin", addr);
            axum::serve(listener, app).await?;
            Ok(())
        }
    }
}

async fn serve_tls(addr: SocketAddr, tls: &TlsConfig, app: Router) -> anyhow::Result<()> {
    info!("Loading TLS certificates:");
    info!("  Certificate: {}", tls.cert_path.display());
    info!("  Private key: {}", tls.key_path.display());

    if !tls.cert_path.exists() {
        return Err(anyhow::anyhow!(
            "Certificate file not found: {}",
            tls.cert_path.display()
        ));
    }
    if !tls.key_path.exists() {
        return Err(anyhow::anyhow!(
            "Private key file not found: {}",
            tls.key_path.display()
        ));
    }

    let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load TLS certificates: {}\n\nHint: the private key must be PKCS#8 PEM. Convert an RSA key with:\n  openssl pkcs8 -topk8 -inform PEM -outform PEM -nocrypt -in private.key -out key.pem",
                e
            )
        })?;

    info!("Admin console listening on https://{}/admin", addr);
    axum_server::bind_rustls(addr, tls_config)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

/// Periodically drop expired sessions and stale confirmations
fn spawn_cleanup(state: AdminState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        // The first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let sessions = state.session_store.cleanup_expired().await;
            let confirmations = state.confirmations.cleanup_expired();
            if sessions + confirmations > 0 {
                debug!(
                    sessions,
                    confirmations, "Removed expired sessions and confirmations"
                );
            }
        }
    });
}

/// Health check endpoint
async fn health() -> &'static str {
    "TaraG admin console running"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::web::admin::tests::test_state;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health() {
        let app = build_app(test_state(Arc::new(FakeBackend::new())));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_tree_is_nested() {
        let app = build_app(test_state(Arc::new(FakeBackend::new())));
        let req = Request::builder()
            .uri("/admin/users")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/admin/login");
    }
}
