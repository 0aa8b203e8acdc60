// bazaar/server/src/db/seed.rs

//! Demo data for local development, enabled with `SEED_DB=true`.

use bazaar::{NewProduct, Role};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::db::{products, users};
use crate::errors::Result;
use crate::services::auth_service;

pub const DEMO_BUYER_EMAIL: &str = "buyer@bazaar.test";
pub const DEMO_SELLER_EMAIL: &str = "seller@bazaar.test";
pub const DEMO_PASSWORD: &str = "bazaar-demo";

fn demo_products() -> Vec<NewProduct> {
  vec![
    NewProduct {
      name: "Jamdani Scarf".to_string(),
      price: 185000,
      description: "Hand-woven cotton scarf.".to_string(),
      image_url: None,
      stock_amount: 12,
    },
    NewProduct {
      name: "Clay Tea Set".to_string(),
      price: 92000,
      description: "Four cups and a pot.".to_string(),
      image_url: None,
      stock_amount: 5,
    },
    NewProduct {
      name: "Nakshi Kantha Cushion".to_string(),
      price: 64000,
      description: String::new(),
      image_url: None,
      stock_amount: 1,
    },
  ]
}

/// Creates the demo buyer, seller and catalogue. Does nothing if the seller already exists.
#[instrument(name = "db::seed", skip(pool))]
pub async fn seed_demo_data(pool: &SqlitePool) -> Result<()> {
  let mut tx = pool.begin().await?;
  if users::fetch_by_email(DEMO_SELLER_EMAIL, &mut tx).await?.is_some() {
    info!("Demo data already present; skipping seed.");
    return Ok(());
  }
  let password_hash = auth_service::hash_password(DEMO_PASSWORD)?;
  users::insert_user(DEMO_BUYER_EMAIL, "Demo Buyer", &password_hash, Role::Buyer, &mut tx).await?;
  let seller = users::insert_user(DEMO_SELLER_EMAIL, "Demo Seller", &password_hash, Role::Seller, &mut tx).await?;
  let catalogue = demo_products();
  for product in &catalogue {
    products::insert_product(seller.id, product, &mut tx).await?;
  }
  tx.commit().await?;
  info!("Seeded demo buyer, seller and {} products.", catalogue.len());
  Ok(())
}
