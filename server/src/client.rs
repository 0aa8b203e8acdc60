// bazaar/server/src/client.rs

//! [`MarketplaceApi`] over HTTP, for driving a [`bazaar::Storefront`] against a running server.

use anyhow::Context;
use async_trait::async_trait;
use bazaar::{
  BazaarError, BazaarResult, CheckoutRequest, CheckoutSession, CreateOrderRequest, ErrorBody, LoginRequest,
  MarketplaceApi, NewProduct, Order, OrderFilter, OrderStatus, PaymentStatus, PaymentUpdateRequest, PaymentUpdateResponse,
  Product, ProductPatch, SignupRequest, StatusUpdate, StockUpdate, User,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::web::extractors::USER_ID_HEADER;

#[derive(Debug, Clone)]
pub struct HttpMarketplaceClient {
  http: reqwest::Client,
  base_url: String,
}

impl HttpMarketplaceClient {
  /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`.
  pub fn new(base_url: impl Into<String>) -> BazaarResult<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("building HTTP client")?;
    Ok(Self {
      http,
      base_url: base_url.into().trim_end_matches('/').to_string(),
    })
  }

  fn request(&self, method: Method, path: &str, actor: Option<Uuid>) -> RequestBuilder {
    let builder = self.http.request(method, format!("{}/api{}", self.base_url, path));
    match actor {
      Some(user_id) => builder.header(USER_ID_HEADER, user_id.to_string()),
      None => builder,
    }
  }

  async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> BazaarResult<T> {
    let response = builder.send().await.context("sending request")?;
    let response = check_status(response).await?;
    let body = response.json::<T>().await.context("decoding response body")?;
    Ok(body)
  }
}

/// Non-2xx responses become [`BazaarError::Api`] carrying the server's error message.
async fn check_status(response: Response) -> BazaarResult<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let text = response.text().await.unwrap_or_default();
  let message = serde_json::from_str::<ErrorBody>(&text)
    .map(|body| body.error)
    .unwrap_or(text);
  debug!(status = status.as_u16(), "Server returned an error: {}", message);
  Err(BazaarError::Api {
    status: status.as_u16(),
    message,
  })
}

#[async_trait]
impl MarketplaceApi for HttpMarketplaceClient {
  async fn signup(&self, req: &SignupRequest) -> BazaarResult<User> {
    self.send(self.request(Method::POST, "/auth/signup", None).json(req)).await
  }

  async fn login(&self, req: &LoginRequest) -> BazaarResult<User> {
    self.send(self.request(Method::POST, "/auth/login", None).json(req)).await
  }

  async fn list_products(&self, seller_id: Option<Uuid>) -> BazaarResult<Vec<Product>> {
    let mut builder = self.request(Method::GET, "/products", None);
    if let Some(seller_id) = seller_id {
      builder = builder.query(&[("sellerId", seller_id.to_string())]);
    }
    self.send(builder).await
  }

  async fn create_product(&self, actor: Uuid, product: &NewProduct) -> BazaarResult<Product> {
    self.send(self.request(Method::POST, "/products", Some(actor)).json(product)).await
  }

  async fn update_product(&self, actor: Uuid, product_id: Uuid, patch: &ProductPatch) -> BazaarResult<Product> {
    let path = format!("/products/{}", product_id);
    self.send(self.request(Method::PATCH, &path, Some(actor)).json(patch)).await
  }

  async fn update_stock(&self, actor: Uuid, update: &StockUpdate) -> BazaarResult<Product> {
    self.send(self.request(Method::PATCH, "/products/stock", Some(actor)).json(update)).await
  }

  async fn delete_product(&self, actor: Uuid, product_id: Uuid) -> BazaarResult<()> {
    let path = format!("/products/{}", product_id);
    let _: serde_json::Value = self.send(self.request(Method::DELETE, &path, Some(actor))).await?;
    Ok(())
  }

  async fn list_orders(&self, filter: &OrderFilter) -> BazaarResult<Vec<Order>> {
    self.send(self.request(Method::GET, "/orders", None).query(filter)).await
  }

  async fn create_order(&self, req: &CreateOrderRequest) -> BazaarResult<Order> {
    self.send(self.request(Method::POST, "/orders", None).json(req)).await
  }

  async fn update_order_status(&self, actor: Uuid, order_id: Uuid, status: OrderStatus) -> BazaarResult<Order> {
    let path = format!("/orders/{}", order_id);
    let body = StatusUpdate {
      status: status.to_string(),
    };
    self.send(self.request(Method::PATCH, &path, Some(actor)).json(&body)).await
  }

  async fn create_checkout(&self, req: &CheckoutRequest) -> BazaarResult<CheckoutSession> {
    self.send(self.request(Method::POST, "/checkout", None).json(req)).await
  }
}

impl HttpMarketplaceClient {
  /// Bulk-confirms a buyer's pending orders through `POST /orders/payment`.
  pub async fn confirm_payment(&self, buyer_id: Uuid) -> BazaarResult<PaymentUpdateResponse> {
    let body = PaymentUpdateRequest {
      user_id: buyer_id,
      status: PaymentStatus::Paid.as_str().to_string(),
    };
    self.send(self.request(Method::POST, "/orders/payment", None).json(&body)).await
  }
}
