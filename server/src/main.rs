// bazaar/server/src/main.rs

use anyhow::Context;
use bazaar_server::config::AppConfig;
use std::net::TcpListener;
use tracing::Level;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

fn init_tracing(json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str()));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = AppConfig::from_env().context("Failed to load application configuration")?;
  init_tracing(app_config.log_json);
  tracing::info!("Starting Bazaar server...");

  let server_address = app_config.bind_address();
  let app_state = bazaar_server::build_state(app_config)
    .await
    .context("Failed to initialise application state")?;

  let listener = TcpListener::bind(&server_address).with_context(|| format!("Failed to bind {}", server_address))?;
  tracing::info!("Listening on {}", server_address);
  bazaar_server::run_server(app_state, listener)?.await?;
  Ok(())
}
