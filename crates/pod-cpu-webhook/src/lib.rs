pub mod admission_review;
pub mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod errors;
pub mod mutation;
pub mod patch;
pub mod tracing;

#[cfg(test)]
mod test_utils;

use ::tracing::info;
use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use axum_server::tls_rustls::RustlsConfig;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::{self, TraceLayer};

use crate::api::{
    handlers::{health_handler, webhook_handler},
    state::ApiServerState,
};
use crate::certs::create_tls_config;
use crate::config::Config;
use crate::mutation::{DefaultCpuRequest, MutationPolicy};

pub struct WebhookServer {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<RustlsConfig>,
}

impl WebhookServer {
    /// Build the server with the policy described by the configuration.
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let policy = Arc::new(DefaultCpuRequest::new(config.cpu_request.clone()));
        Self::new_with_policy(config, policy).await
    }

    pub async fn new_with_policy(
        config: Config,
        policy: Arc<dyn MutationPolicy>,
    ) -> Result<Self> {
        // certificates are loaded once, before binding
        let tls_config = match config.tls_config {
            Some(ref tls_config) => Some(create_tls_config(tls_config).await?),
            None => None,
        };

        info!(policy = policy.name(), "mutation policy ready");
        let state = Arc::new(ApiServerState { policy });

        let router = Router::new()
            .route("/webhook", post(webhook_handler))
            .route("/health", get(health_handler))
            .layer(
                TraceLayer::new_for_http()
                    .on_request(trace::DefaultOnRequest::new().level(::tracing::Level::DEBUG))
                    .on_response(trace::DefaultOnResponse::new().level(::tracing::Level::DEBUG)),
            )
            .with_state(state);

        Ok(Self {
            router,
            addr: config.addr,
            tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve requests until the process is killed.
    pub async fn run(self) -> Result<()> {
        match self.tls_config {
            Some(tls_config) => {
                info!(address = %self.addr, "started HTTPS server");
                axum_server::bind_rustls(self.addr, tls_config)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = %self.addr, "started HTTP server");
                axum_server::bind(self.addr)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        Ok(())
    }
}
