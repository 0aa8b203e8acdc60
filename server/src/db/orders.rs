// bazaar/server/src/db/orders.rs
use bazaar::{Order, OrderFilter, OrderLine, OrderParty, OrderStatus, PaymentStatus};
use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::errors::Result;

const ORDER_COLUMNS: &str =
  "id, buyer_id, seller_id, status, payment_status, payment_reference, total, created_at, updated_at";

/// Inserts the order row and its lines. Call inside the transaction that reserved the stock.
pub async fn insert_order(
  buyer_id: Uuid,
  seller_id: Uuid,
  lines: Vec<OrderLine>,
  total: i64,
  conn: &mut SqliteConnection,
) -> Result<Order> {
  let now = Utc::now();
  let mut order: Order = sqlx::query_as(&format!(
    "INSERT INTO orders (id, buyer_id, seller_id, status, payment_status, total, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(buyer_id)
  .bind(seller_id)
  .bind(OrderStatus::Pending)
  .bind(PaymentStatus::Unpaid)
  .bind(total)
  .bind(now)
  .fetch_one(&mut *conn)
  .await?;

  for line in &lines {
    sqlx::query(
      "INSERT INTO order_items (order_id, product_id, product_name, unit_price, quantity) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(order.id)
    .bind(line.product_id)
    .bind(&line.product_name)
    .bind(line.unit_price)
    .bind(line.quantity)
    .execute(&mut *conn)
    .await?;
  }
  order.items = lines;
  Ok(order)
}

const ORDER_WITH_PARTIES: &str = "SELECT o.id, o.buyer_id, o.seller_id, o.status, o.payment_status, \
   o.payment_reference, o.total, o.created_at, o.updated_at, \
   b.name AS buyer_name, b.email AS buyer_email, s.name AS seller_name, s.email AS seller_email \
   FROM orders o LEFT JOIN users b ON b.id = o.buyer_id LEFT JOIN users s ON s.id = o.seller_id";

#[derive(sqlx::FromRow)]
struct OrderRow {
  #[sqlx(flatten)]
  order: Order,
  buyer_name: Option<String>,
  buyer_email: Option<String>,
  seller_name: Option<String>,
  seller_email: Option<String>,
}

fn party(name: Option<String>, email: Option<String>) -> Option<OrderParty> {
  Some(OrderParty {
    name: name?,
    email: email?,
  })
}

impl From<OrderRow> for Order {
  fn from(row: OrderRow) -> Self {
    Order {
      buyer: party(row.buyer_name, row.buyer_email),
      seller: party(row.seller_name, row.seller_email),
      ..row.order
    }
  }
}

async fn load_items(order: &mut Order, conn: &mut SqliteConnection) -> Result<()> {
  order.items = sqlx::query_as(
    "SELECT product_id, product_name, unit_price, quantity FROM order_items WHERE order_id = $1 ORDER BY rowid",
  )
  .bind(order.id)
  .fetch_all(conn)
  .await?;
  Ok(())
}

/// The order with its lines and the buyer's and seller's contact details.
pub async fn fetch_order(id: Uuid, conn: &mut SqliteConnection) -> Result<Option<Order>> {
  let row: Option<OrderRow> = sqlx::query_as(&format!("{} WHERE o.id = $1", ORDER_WITH_PARTIES))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
  match row.map(Order::from) {
    Some(mut order) => {
      load_items(&mut order, conn).await?;
      Ok(Some(order))
    }
    None => Ok(None),
  }
}

/// Orders matching the filter, newest first, each with its lines.
pub async fn list_orders(filter: &OrderFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>> {
  let rows: Vec<OrderRow> = sqlx::query_as(&format!(
    "{} WHERE ($1 IS NULL OR o.buyer_id = $1) AND ($2 IS NULL OR o.seller_id = $2) \
     ORDER BY o.created_at DESC, o.rowid DESC",
    ORDER_WITH_PARTIES
  ))
  .bind(filter.buyer_id)
  .bind(filter.seller_id)
  .fetch_all(&mut *conn)
  .await?;
  let mut orders: Vec<Order> = rows.into_iter().map(Order::from).collect();
  for order in orders.iter_mut() {
    load_items(order, &mut *conn).await?;
  }
  Ok(orders)
}

pub async fn update_status(id: Uuid, status: OrderStatus, conn: &mut SqliteConnection) -> Result<bool> {
  let result = sqlx::query("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3")
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .execute(conn)
    .await?;
  Ok(result.rows_affected() > 0)
}

/// Marks every pending, unpaid order of the buyer as paid. Returns how many changed.
pub async fn confirm_payment_for_buyer(
  buyer_id: Uuid,
  reference: Option<&str>,
  conn: &mut SqliteConnection,
) -> Result<u64> {
  let result = sqlx::query(
    "UPDATE orders SET payment_status = $1, payment_reference = COALESCE($2, payment_reference), updated_at = $3 \
     WHERE buyer_id = $4 AND status = $5 AND payment_status = $6",
  )
  .bind(PaymentStatus::Paid)
  .bind(reference)
  .bind(Utc::now())
  .bind(buyer_id)
  .bind(OrderStatus::Pending)
  .bind(PaymentStatus::Unpaid)
  .execute(conn)
  .await?;
  Ok(result.rows_affected())
}

/// Marks the named orders paid, provided they belong to the buyer and are unpaid. Fulfilment status is
/// not checked: the orders were payable when the session was opened and the seller may have moved
/// them on since.
pub async fn confirm_payment_for_orders(
  buyer_id: Uuid,
  order_ids: &[Uuid],
  reference: Option<&str>,
  conn: &mut SqliteConnection,
) -> Result<u64> {
  let now = Utc::now();
  let mut updated = 0;
  for order_id in order_ids {
    let result = sqlx::query(
      "UPDATE orders SET payment_status = $1, payment_reference = COALESCE($2, payment_reference), updated_at = $3 \
       WHERE id = $4 AND buyer_id = $5 AND payment_status = $6",
    )
    .bind(PaymentStatus::Paid)
    .bind(reference)
    .bind(now)
    .bind(order_id)
    .bind(buyer_id)
    .bind(PaymentStatus::Unpaid)
    .execute(&mut *conn)
    .await?;
    updated += result.rows_affected();
  }
  Ok(updated)
}
