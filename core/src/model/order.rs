// bazaar/core/src/model/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::BazaarError;

/// Fulfilment state of an order.
///
/// The nominal flow is `Pending -> Accepted -> Shipping -> Delivered`, but a status
/// update may name any of the four states regardless of the current one. Payment is
/// tracked separately in [`PaymentStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Accepted,
  Shipping,
  Delivered,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Accepted,
    OrderStatus::Shipping,
    OrderStatus::Delivered,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Accepted => "accepted",
      OrderStatus::Shipping => "shipping",
      OrderStatus::Delivered => "delivered",
    }
  }

  /// The linear successor, or `None` once delivered.
  pub fn next(&self) -> Option<OrderStatus> {
    match self {
      OrderStatus::Pending => Some(OrderStatus::Accepted),
      OrderStatus::Accepted => Some(OrderStatus::Shipping),
      OrderStatus::Shipping => Some(OrderStatus::Delivered),
      OrderStatus::Delivered => None,
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = BazaarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| BazaarError::InvalidStatus(s.to_string()))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Unpaid,
  Paid,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Unpaid => "unpaid",
      PaymentStatus::Paid => "paid",
    }
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentStatus {
  type Err = BazaarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "unpaid" => Ok(PaymentStatus::Unpaid),
      "paid" => Ok(PaymentStatus::Paid),
      other => Err(BazaarError::InvalidStatus(other.to_string())),
    }
  }
}

/// A requested (product, quantity) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
  pub product_id: Uuid,
  pub quantity: i32,
}

impl LineItem {
  pub fn new(product_id: Uuid, quantity: i32) -> Self {
    Self { product_id, quantity }
  }
}

/// An order line as stored: name and unit price are captured when the order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  pub product_id: Uuid,
  pub product_name: String,
  pub unit_price: i64,
  pub quantity: i32,
}

impl OrderLine {
  pub fn subtotal(&self) -> Option<i64> {
    self.unit_price.checked_mul(i64::from(self.quantity))
  }
}

/// Contact details of a buyer or seller, attached to orders read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParty {
  pub name: String,
  pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub buyer_id: Uuid,
  pub seller_id: Uuid,
  pub status: OrderStatus,
  pub payment_status: PaymentStatus,
  pub payment_reference: Option<String>,
  pub total: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[cfg_attr(feature = "sqlx", sqlx(skip))]
  #[serde(default)]
  pub items: Vec<OrderLine>,
  #[cfg_attr(feature = "sqlx", sqlx(skip))]
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub buyer: Option<OrderParty>,
  #[cfg_attr(feature = "sqlx", sqlx(skip))]
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub seller: Option<OrderParty>,
}

impl Order {
  pub fn is_awaiting_payment(&self) -> bool {
    self.status == OrderStatus::Pending && self.payment_status == PaymentStatus::Unpaid
  }
}

/// Sum of `unit_price * quantity` over the lines. `None` on overflow.
pub fn order_total(lines: &[OrderLine]) -> Option<i64> {
  lines
    .iter()
    .try_fold(0i64, |acc, line| line.subtotal().and_then(|sub| acc.checked_add(sub)))
}

/// Collapses repeated product ids into one line, summing quantities and keeping first-seen order.
pub fn merge_line_items(items: &[LineItem]) -> Vec<LineItem> {
  let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
  for item in items {
    match merged.iter_mut().find(|m| m.product_id == item.product_id) {
      Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
      None => merged.push(*item),
    }
  }
  merged
}
