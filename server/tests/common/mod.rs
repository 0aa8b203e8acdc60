// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every helper

use bazaar::{NewProduct, Product, Role, User};
use bazaar_server::config::{AppConfig, Secret};
use bazaar_server::db::{self, products, users};
use bazaar_server::payments::MockPaymentGateway;
use bazaar_server::services::auth_service;
use bazaar_server::state::AppState;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::Level;

pub const WEBHOOK_SECRET: &str = "whsec_integration";
pub const PASSWORD: &str = "hunter22";

/// A migrated database in a temporary directory, removed on drop.
pub struct TestDb {
  pub pool: SqlitePool,
  _dir: TempDir,
}

impl TestDb {
  pub async fn new() -> TestDb {
    setup_tracing();
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("bazaar.db").display());
    let pool = db::new_pool(&url, 8).await.expect("pool");
    db::migrate(&pool).await.expect("migrations");
    TestDb { pool, _dir: dir }
  }

  pub async fn user(&self, email: &str, role: Role) -> User {
    let hash = auth_service::hash_password(PASSWORD).expect("hash");
    let mut conn = self.pool.acquire().await.expect("conn");
    users::insert_user(email, email, &hash, role, &mut conn).await.expect("insert user")
  }

  pub async fn product(&self, seller: &User, name: &str, price: i64, stock: i32) -> Product {
    let mut conn = self.pool.acquire().await.expect("conn");
    let new = NewProduct {
      name: name.to_string(),
      price,
      description: String::new(),
      image_url: None,
      stock_amount: stock,
    };
    products::insert_product(seller.id, &new, &mut conn).await.expect("insert product")
  }

  pub async fn stock_of(&self, product: &Product) -> i32 {
    let mut conn = self.pool.acquire().await.expect("conn");
    products::fetch_product(product.id, &mut conn)
      .await
      .expect("fetch")
      .map(|p| p.stock_amount)
      .expect("product exists")
  }

  pub async fn order_count(&self) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders")
      .fetch_one(&self.pool)
      .await
      .expect("count orders")
  }

  pub async fn order_item_count(&self) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
      .fetch_one(&self.pool)
      .await
      .expect("count order items")
  }
}

pub fn test_config() -> AppConfig {
  AppConfig {
    app_base_url: "http://shop.test".to_string(),
    payment_webhook_secret: Secret::new(WEBHOOK_SECRET.to_string()),
    ..AppConfig::default()
  }
}

/// App state backed by `db` and a mock gateway the test keeps a handle on.
pub fn app_state(db: &TestDb) -> (AppState, Arc<MockPaymentGateway>) {
  let gateway = Arc::new(MockPaymentGateway::new(Secret::new(WEBHOOK_SECRET.to_string())));
  let state = AppState {
    db_pool: db.pool.clone(),
    payments: gateway.clone(),
    config: Arc::new(test_config()),
  };
  (state, gateway)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
