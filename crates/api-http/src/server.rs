//! HTTP Server

use crate::routes::{router, AppState};
use dispatch_core::application::{shutdown_channel, ServiceHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

pub struct HttpServer {
    config: HttpServerConfig,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until the returned handle is stopped
    ///
    /// In-flight requests finish before the task exits.
    pub async fn start(self) -> std::io::Result<(SocketAddr, ServiceHandle<()>)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        let (tx, mut token) = shutdown_channel();
        let app = router(self.state);
        let join = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.wait().await })
                .await;
            match result {
                Ok(()) => info!("HTTP server stopped"),
                Err(e) => error!(error = %e, "HTTP server failed"),
            }
        });

        info!(addr = %local_addr, "HTTP server started");
        Ok((local_addr, ServiceHandle::new(tx, join)))
    }
}
