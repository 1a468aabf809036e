use anyhow::{Result, anyhow};
use tracing::debug;

use pod_cpu_webhook::{WebhookServer, cli, config::Config, tracing::setup_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    if matches.subcommand_name() == Some("docs") {
        println!("{}", clap_markdown::help_markdown_command(&cli::build_cli()));
        return Ok(());
    }

    // Only ring is compiled in, make it the process-wide provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Cannot install the rustls crypto provider"))?;

    let config = Config::from_args(&matches)?;

    setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;
    debug!("tracing system ready");

    let server = WebhookServer::new_from_config(config).await?;
    server.run().await
}
