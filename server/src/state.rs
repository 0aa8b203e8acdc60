// bazaar/server/src/state.rs
use crate::config::AppConfig;
use crate::payments::PaymentProvider;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: SqlitePool,
  pub payments: Arc<dyn PaymentProvider>,
  pub config: Arc<AppConfig>, // Share loaded config
}
