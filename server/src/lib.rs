// bazaar/server/src/lib.rs

//! HTTP service for the Bazaar marketplace: actix-web handlers over a SQLite store,
//! with hosted checkout through a [`payments::PaymentProvider`].

pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod payments;
pub mod services;
pub mod state;
pub mod web;

use actix_web::{dev::Server, web as actix_data, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::state::AppState;

pub use crate::client::HttpMarketplaceClient;

/// Connects and migrates the database, seeds it if configured and selects the payment provider.
pub async fn build_state(config: AppConfig) -> Result<AppState> {
  let db_pool = db::connect(&config).await?;
  if config.seed_db {
    db::seed::seed_demo_data(&db_pool).await?;
  }
  let payments = payments::provider_from_config(&config)?;
  Ok(AppState {
    db_pool,
    payments,
    config: Arc::new(config),
  })
}

/// Starts serving on an already-bound listener. The returned server must be awaited or spawned.
pub fn run_server(app_state: AppState, listener: TcpListener) -> std::io::Result<Server> {
  let server = HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .listen(listener)?
  .run();
  Ok(server)
}
