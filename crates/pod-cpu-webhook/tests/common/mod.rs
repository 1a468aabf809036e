use axum::Router;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use pod_cpu_webhook::{WebhookServer, config::Config};
use std::net::SocketAddr;

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        tls_config: None,
        cpu_request: Quantity("10m".to_owned()),
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) async fn app(config: Config) -> Router {
    let server = WebhookServer::new_from_config(config).await.unwrap();

    server.router()
}
