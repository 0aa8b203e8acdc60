// bazaar/server/src/services/catalog_service.rs

//! Seller-owned product management.

use bazaar::{NewProduct, Product, ProductPatch, Role, StockUpdate};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::{products, users};
use crate::errors::{AppError, Result};

fn validate_price(price: i64) -> Result<()> {
  if price < 0 {
    return Err(AppError::Validation("Price cannot be negative.".to_string()));
  }
  Ok(())
}

fn validate_stock(stock_amount: i32) -> Result<()> {
  if stock_amount < 0 {
    return Err(AppError::Validation("Stock amount cannot be negative.".to_string()));
  }
  Ok(())
}

async fn owned_product(actor: Uuid, product_id: Uuid, conn: &mut SqliteConnection) -> Result<Product> {
  let product = products::fetch_product(product_id, conn)
    .await?
    .ok_or(AppError::ProductNotFound(product_id))?;
  if product.seller_id != actor {
    return Err(AppError::Auth(format!("Product {} belongs to another seller", product_id)));
  }
  Ok(product)
}

/// Lists products, optionally only those of one seller.
///
/// # Arguments
/// * `pool`: The database pool.
/// * `seller_id`: When set, restricts the listing to this seller's products.
///
/// # Returns
/// The matching products, or an `AppError` if the query fails.
pub async fn list_products(pool: &SqlitePool, seller_id: Option<Uuid>) -> Result<Vec<Product>> {
  let mut conn = pool.acquire().await?;
  products::list_products(seller_id, &mut conn).await
}

/// Fetches a single product.
///
/// # Returns
/// The product, or `AppError::ProductNotFound` if no product has this id.
pub async fn get_product(pool: &SqlitePool, product_id: Uuid) -> Result<Product> {
  let mut conn = pool.acquire().await?;
  products::fetch_product(product_id, &mut conn)
    .await?
    .ok_or(AppError::ProductNotFound(product_id))
}

/// Creates a product owned by `actor`.
///
/// # Arguments
/// * `pool`: The database pool.
/// * `actor`: The calling user; must have the seller role.
/// * `new`: Name, description, price, image and initial stock.
///
/// # Returns
/// The stored product. A blank name or a negative price or stock is an `AppError::Validation`;
/// a caller who is not a seller gets `AppError::Auth`.
#[instrument(name = "catalog_service::create_product", skip(pool, new), fields(name = %new.name))]
pub async fn create_product(pool: &SqlitePool, actor: Uuid, new: &NewProduct) -> Result<Product> {
  if new.name.trim().is_empty() {
    return Err(AppError::Validation("Product name is required.".to_string()));
  }
  validate_price(new.price)?;
  validate_stock(new.stock_amount)?;
  let mut conn = pool.acquire().await?;
  users::require_role(actor, Role::Seller, &mut conn).await?;
  let product = products::insert_product(actor, new, &mut conn).await?;
  info!("Product {} created by seller {}.", product.id, actor);
  Ok(product)
}

/// Applies `patch` to a product the actor owns. Fields left out of the patch are unchanged.
#[instrument(name = "catalog_service::update_product", skip(pool, patch))]
pub async fn update_product(pool: &SqlitePool, actor: Uuid, product_id: Uuid, patch: &ProductPatch) -> Result<Product> {
  if let Some(price) = patch.price {
    validate_price(price)?;
  }
  if patch.name.as_deref().map_or(false, |n| n.trim().is_empty()) {
    return Err(AppError::Validation("Product name cannot be blank.".to_string()));
  }
  let mut conn = pool.acquire().await?;
  owned_product(actor, product_id, &mut conn).await?;
  products::update_product(product_id, patch, &mut conn)
    .await?
    .ok_or(AppError::ProductNotFound(product_id))
}

/// Sets the stock of a product the actor owns.
///
/// # Returns
/// The updated product, `AppError::Validation` for a negative amount, `AppError::ProductNotFound`
/// for an unknown product, or `AppError::Auth` when the product belongs to another seller.
#[instrument(name = "catalog_service::update_stock", skip(pool, update), fields(product_id = %update.product_id, stock = update.stock_amount))]
pub async fn update_stock(pool: &SqlitePool, actor: Uuid, update: &StockUpdate) -> Result<Product> {
  validate_stock(update.stock_amount)?;
  let mut conn = pool.acquire().await?;
  owned_product(actor, update.product_id, &mut conn).await?;
  let product = products::set_stock(update.product_id, update.stock_amount, &mut conn)
    .await?
    .ok_or(AppError::ProductNotFound(update.product_id))?;
  info!("Stock of product {} set to {}.", product.id, product.stock_amount);
  Ok(product)
}

#[instrument(name = "catalog_service::delete_product", skip(pool))]
pub async fn delete_product(pool: &SqlitePool, actor: Uuid, product_id: Uuid) -> Result<()> {
  let mut conn = pool.acquire().await?;
  owned_product(actor, product_id, &mut conn).await?;
  if !products::delete_product(product_id, &mut conn).await? {
    return Err(AppError::ProductNotFound(product_id));
  }
  info!("Product {} deleted by seller {}.", product_id, actor);
  Ok(())
}
