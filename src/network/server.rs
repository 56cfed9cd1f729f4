//! HTTP Server
//!
//! Binds the listen address and serves the router until shutdown.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::Result;

/// HTTP server for crudstore
pub struct Server {
    listener: TcpListener,
    app: Router,
}

impl Server {
    /// Bind to `config.listen_addr`
    pub async fn bind(config: &Config, app: Router) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).await?;
        Ok(Self { listener, app })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Listening on {}", self.local_addr()?);

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
