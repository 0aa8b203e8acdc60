// bazaar/server/src/services/order_service.rs

//! Order creation with stock reservation, status updates and payment confirmation.

use bazaar::{merge_line_items, order_total, CreateOrderRequest, Order, OrderFilter, OrderLine, OrderStatus, Role};
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::{orders, products, users};
use crate::errors::{AppError, Result};

/// Creates one order and reserves its stock in a single transaction.
///
/// # Arguments
/// * `pool`: The database pool.
/// * `req`: Buyer, seller and the requested lines. Repeated products are merged.
///
/// # Returns
/// The created order with the prices captured at reservation time. Fails with
/// `AppError::ProductNotFound` or `AppError::InsufficientStock` for the first line that
/// cannot be reserved, leaving every product's stock untouched.
///
/// Each line is reserved with a conditional decrement, which is also the first statement
/// of the transaction, so concurrent orders for the same product queue on the database
/// write lock and the later one sees the reduced stock. Any failure drops the transaction
/// and nothing is committed.
#[instrument(
  name = "order_service::place_order",
  skip(pool, req),
  fields(buyer_id = %req.buyer_id, seller_id = %req.seller_id, lines = req.items.len())
)]
pub async fn place_order(pool: &SqlitePool, req: &CreateOrderRequest) -> Result<Order> {
  if req.items.is_empty() {
    return Err(AppError::Validation("An order needs at least one item.".to_string()));
  }
  if let Some(bad) = req.items.iter().find(|item| item.quantity <= 0) {
    return Err(AppError::Validation(format!(
      "Quantity for product {} must be positive, got {}.",
      bad.product_id, bad.quantity
    )));
  }
  let items = merge_line_items(&req.items);

  {
    let mut conn = pool.acquire().await?;
    users::require_role(req.buyer_id, Role::Buyer, &mut conn)
      .await
      .map_err(|e| match e {
        AppError::Auth(msg) => AppError::Validation(msg),
        other => other,
      })?;
  }

  let mut tx = pool.begin().await?;
  let mut lines = Vec::with_capacity(items.len());
  for item in &items {
    let reserved = match products::reserve_stock(item.product_id, item.quantity, &mut tx).await? {
      Some(reserved) => reserved,
      None => {
        let err = match products::fetch_product(item.product_id, &mut tx).await? {
          None => AppError::ProductNotFound(item.product_id),
          Some(product) => AppError::InsufficientStock {
            product_id: item.product_id,
            requested: item.quantity,
            available: product.stock_amount,
          },
        };
        warn!("Order rejected: {}", err);
        return Err(err);
      }
    };
    if reserved.seller_id != req.seller_id {
      warn!(
        "Order rejected: product {} belongs to seller {}, not {}.",
        reserved.id, reserved.seller_id, req.seller_id
      );
      return Err(AppError::Validation(format!(
        "Product {} is not sold by seller {}.",
        reserved.id, req.seller_id
      )));
    }
    lines.push(OrderLine {
      product_id: reserved.id,
      product_name: reserved.name,
      unit_price: reserved.price,
      quantity: item.quantity,
    });
  }

  let total =
    order_total(&lines).ok_or_else(|| AppError::Validation("Order total is too large.".to_string()))?;
  let order = orders::insert_order(req.buyer_id, req.seller_id, lines, total, &mut tx).await?;
  tx.commit().await?;

  info!("Order {} created with total {}.", order.id, order.total);
  Ok(order)
}

/// Orders matching `filter`, newest first, with their lines.
pub async fn list_orders(pool: &SqlitePool, filter: &OrderFilter) -> Result<Vec<Order>> {
  let mut conn = pool.acquire().await?;
  orders::list_orders(filter, &mut conn).await
}

pub async fn get_order(pool: &SqlitePool, order_id: Uuid) -> Result<Order> {
  let mut conn = pool.acquire().await?;
  orders::fetch_order(order_id, &mut conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
}

/// Moves the order to `status` from whatever state it is in. Only the order's seller may do so.
#[instrument(name = "order_service::update_status", skip(pool), fields(status = %status))]
pub async fn update_status(pool: &SqlitePool, actor: Uuid, order_id: Uuid, status: OrderStatus) -> Result<Order> {
  let mut conn = pool.acquire().await?;
  let order = orders::fetch_order(order_id, &mut conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
  if order.seller_id != actor {
    return Err(AppError::Auth(format!(
      "Only the seller of order {} may change its status",
      order_id
    )));
  }
  if !orders::update_status(order_id, status, &mut conn).await? {
    return Err(AppError::NotFound(format!("Order {} not found", order_id)));
  }
  info!("Order {} moved from {} to {}.", order_id, order.status, status);
  orders::fetch_order(order_id, &mut conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
}

/// Bulk confirmation for all of a buyer's pending, unpaid orders.
#[instrument(name = "order_service::confirm_payment_for_buyer", skip(pool))]
pub async fn confirm_payment_for_buyer(pool: &SqlitePool, buyer_id: Uuid, reference: Option<&str>) -> Result<u64> {
  let mut conn = pool.acquire().await?;
  if users::fetch_by_id(buyer_id, &mut conn).await?.is_none() {
    return Err(AppError::NotFound(format!("User {} not found", buyer_id)));
  }
  let updated = orders::confirm_payment_for_buyer(buyer_id, reference, &mut conn).await?;
  info!("Marked {} orders of buyer {} as paid.", updated, buyer_id);
  Ok(updated)
}

/// Records the payment of a completed checkout session.
///
/// # Arguments
/// * `pool`: The database pool.
/// * `buyer_id`: The buyer the session was opened for.
/// * `order_ids`: The orders the session paid for.
/// * `reference`: The provider's payment reference, stored on each order.
///
/// # Returns
/// How many orders changed from unpaid to paid. Orders already paid, or not the buyer's,
/// are skipped and logged. Fulfilment status is not consulted.
#[instrument(name = "order_service::confirm_payment_for_orders", skip(pool, order_ids), fields(orders = order_ids.len()))]
pub async fn confirm_payment_for_orders(
  pool: &SqlitePool,
  buyer_id: Uuid,
  order_ids: &[Uuid],
  reference: Option<&str>,
) -> Result<u64> {
  let mut tx = pool.begin().await?;
  let updated = orders::confirm_payment_for_orders(buyer_id, order_ids, reference, &mut tx).await?;
  tx.commit().await?;
  if updated < order_ids.len() as u64 {
    warn!(
      "Only {} of {} orders of buyer {} were marked paid; the rest were already paid or are not the buyer's.",
      updated,
      order_ids.len(),
      buyer_id
    );
  } else {
    info!("Marked {} orders of buyer {} as paid.", updated, buyer_id);
  }
  Ok(updated)
}

/// The named orders, checked to belong to `buyer_id` and to be awaiting payment.
pub async fn payable_orders(pool: &SqlitePool, buyer_id: Uuid, order_ids: &[Uuid]) -> Result<Vec<Order>> {
  if order_ids.is_empty() {
    return Err(AppError::Validation("No orders selected for checkout.".to_string()));
  }
  let mut conn = pool.acquire().await?;
  let mut payable = Vec::with_capacity(order_ids.len());
  for order_id in order_ids {
    let order = orders::fetch_order(*order_id, &mut conn)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
    if order.buyer_id != buyer_id {
      return Err(AppError::Auth(format!("Order {} belongs to another buyer", order_id)));
    }
    if !order.is_awaiting_payment() {
      return Err(AppError::Validation(format!(
        "Order {} is not awaiting payment",
        order_id
      )));
    }
    if !payable.iter().any(|o: &Order| o.id == order.id) {
      payable.push(order);
    }
  }
  Ok(payable)
}
