// bazaar/core/src/api.rs

//! Wire types for the marketplace HTTP API and the [`MarketplaceApi`] seam the
//! [`Storefront`](crate::storefront::Storefront) talks through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BazaarResult;
use crate::model::{LineItem, Order, OrderStatus, Product, Role, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
  pub email: String,
  pub name: String,
  pub password: String,
  pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
  pub name: String,
  pub price: i64,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub stock_amount: i32,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub price: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
  pub product_id: Uuid,
  pub stock_amount: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
  pub buyer_id: Uuid,
  pub seller_id: Uuid,
  pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub buyer_id: Option<Uuid>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub seller_id: Option<Uuid>,
}

impl OrderFilter {
  pub fn for_buyer(buyer_id: Uuid) -> Self {
    Self {
      buyer_id: Some(buyer_id),
      seller_id: None,
    }
  }

  pub fn for_seller(seller_id: Uuid) -> Self {
    Self {
      buyer_id: None,
      seller_id: Some(seller_id),
    }
  }
}

/// `status` stays a string on the wire so that unknown values reach the handler and
/// are rejected with a descriptive error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
  pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdateRequest {
  pub user_id: Uuid,
  pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdateResponse {
  pub success: bool,
  pub message: String,
  pub updated_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  pub buyer_id: Uuid,
  pub order_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
  pub session_id: String,
  pub url: Option<String>,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
  pub error: String,
}

/// The server operations the client-side state needs.
///
/// `actor` is the id of the signed-in user on whose behalf an owner-gated
/// call is made.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
  async fn signup(&self, req: &SignupRequest) -> BazaarResult<User>;

  async fn login(&self, req: &LoginRequest) -> BazaarResult<User>;

  async fn list_products(&self, seller_id: Option<Uuid>) -> BazaarResult<Vec<Product>>;

  async fn create_product(&self, actor: Uuid, product: &NewProduct) -> BazaarResult<Product>;

  async fn update_product(&self, actor: Uuid, product_id: Uuid, patch: &ProductPatch) -> BazaarResult<Product>;

  async fn update_stock(&self, actor: Uuid, update: &StockUpdate) -> BazaarResult<Product>;

  async fn delete_product(&self, actor: Uuid, product_id: Uuid) -> BazaarResult<()>;

  async fn list_orders(&self, filter: &OrderFilter) -> BazaarResult<Vec<Order>>;

  async fn create_order(&self, req: &CreateOrderRequest) -> BazaarResult<Order>;

  async fn update_order_status(&self, actor: Uuid, order_id: Uuid, status: OrderStatus) -> BazaarResult<Order>;

  async fn create_checkout(&self, req: &CheckoutRequest) -> BazaarResult<CheckoutSession>;
}
