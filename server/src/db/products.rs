// bazaar/server/src/db/products.rs
use bazaar::{NewProduct, Product, ProductPatch};
use chrono::Utc;
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::errors::Result;

const PRODUCT_COLUMNS: &str =
  "id, seller_id, name, description, price, image_url, stock_amount, created_at, updated_at";

pub async fn list_products(seller_id: Option<Uuid>, conn: &mut SqliteConnection) -> Result<Vec<Product>> {
  let products = match seller_id {
    Some(seller_id) => {
      sqlx::query_as(&format!(
        "SELECT {} FROM products WHERE seller_id = $1 ORDER BY name ASC",
        PRODUCT_COLUMNS
      ))
      .bind(seller_id)
      .fetch_all(conn)
      .await?
    }
    None => {
      sqlx::query_as(&format!("SELECT {} FROM products ORDER BY name ASC", PRODUCT_COLUMNS))
        .fetch_all(conn)
        .await?
    }
  };
  Ok(products)
}

pub async fn fetch_product(id: Uuid, conn: &mut SqliteConnection) -> Result<Option<Product>> {
  let product = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
    .bind(id)
    .fetch_optional(conn)
    .await?;
  Ok(product)
}

pub async fn insert_product(seller_id: Uuid, new: &NewProduct, conn: &mut SqliteConnection) -> Result<Product> {
  let now = Utc::now();
  let product = sqlx::query_as(&format!(
    "INSERT INTO products (id, seller_id, name, description, price, image_url, stock_amount, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {}",
    PRODUCT_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(seller_id)
  .bind(&new.name)
  .bind(&new.description)
  .bind(new.price)
  .bind(&new.image_url)
  .bind(new.stock_amount)
  .bind(now)
  .fetch_one(conn)
  .await?;
  Ok(product)
}

/// Applies the fields present in `patch`. Returns `None` if the product does not exist.
pub async fn update_product(id: Uuid, patch: &ProductPatch, conn: &mut SqliteConnection) -> Result<Option<Product>> {
  let product = sqlx::query_as(&format!(
    "UPDATE products SET \
       name = COALESCE($1, name), \
       price = COALESCE($2, price), \
       description = COALESCE($3, description), \
       image_url = COALESCE($4, image_url), \
       updated_at = $5 \
     WHERE id = $6 RETURNING {}",
    PRODUCT_COLUMNS
  ))
  .bind(&patch.name)
  .bind(patch.price)
  .bind(&patch.description)
  .bind(&patch.image_url)
  .bind(Utc::now())
  .bind(id)
  .fetch_optional(conn)
  .await?;
  Ok(product)
}

pub async fn set_stock(id: Uuid, stock_amount: i32, conn: &mut SqliteConnection) -> Result<Option<Product>> {
  let product = sqlx::query_as(&format!(
    "UPDATE products SET stock_amount = $1, updated_at = $2 WHERE id = $3 RETURNING {}",
    PRODUCT_COLUMNS
  ))
  .bind(stock_amount)
  .bind(Utc::now())
  .bind(id)
  .fetch_optional(conn)
  .await?;
  Ok(product)
}

pub async fn delete_product(id: Uuid, conn: &mut SqliteConnection) -> Result<bool> {
  let result = sqlx::query("DELETE FROM products WHERE id = $1")
    .bind(id)
    .execute(conn)
    .await?;
  Ok(result.rows_affected() > 0)
}

/// What a successful reservation saw of the product at the time of the decrement.
#[derive(Debug, Clone, FromRow)]
pub struct ReservedStock {
  pub id: Uuid,
  pub seller_id: Uuid,
  pub name: String,
  pub price: i64,
  pub stock_amount: i32,
}

/// Decrements stock by `quantity` only if enough is available. `None` means nothing was
/// changed, either because the product is missing or because stock is short.
pub async fn reserve_stock(
  product_id: Uuid,
  quantity: i32,
  conn: &mut SqliteConnection,
) -> Result<Option<ReservedStock>> {
  let reserved = sqlx::query_as(
    "UPDATE products SET stock_amount = stock_amount - $1, updated_at = $2 \
     WHERE id = $3 AND stock_amount >= $1 \
     RETURNING id, seller_id, name, price, stock_amount",
  )
  .bind(quantity)
  .bind(Utc::now())
  .bind(product_id)
  .fetch_optional(conn)
  .await?;
  Ok(reserved)
}
