// bazaar/server/src/payments/mod.rs

//! Hosted checkout and webhook handling behind the [`PaymentProvider`] seam.

pub mod mock;
pub mod signature;
pub mod stripe;

use async_trait::async_trait;
use bazaar::{CheckoutSession, Order};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{AppConfig, PaymentProviderKind};
use crate::errors::{AppError, Result};

pub use mock::MockPaymentGateway;
pub use stripe::StripeGateway;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
  pub name: String,
  pub unit_amount: i64,
  pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
  pub buyer_id: Uuid,
  pub order_ids: Vec<Uuid>,
  pub currency: String,
  pub lines: Vec<CheckoutLine>,
  pub success_url: String,
  pub cancel_url: String,
}

impl CheckoutSessionRequest {
  /// One checkout line per order line across all `orders`.
  pub fn for_orders(buyer_id: Uuid, orders: &[Order], config: &AppConfig) -> Self {
    let base = config.app_base_url.trim_end_matches('/');
    CheckoutSessionRequest {
      buyer_id,
      order_ids: orders.iter().map(|o| o.id).collect(),
      currency: config.checkout_currency.clone(),
      lines: orders
        .iter()
        .flat_map(|o| o.items.iter())
        .map(|line| CheckoutLine {
          name: line.product_name.clone(),
          unit_amount: line.unit_price,
          quantity: line.quantity,
        })
        .collect(),
      success_url: format!("{}/payment/success?session_id={{CHECKOUT_SESSION_ID}}", base),
      cancel_url: format!("{}/payment/cancel", base),
    }
  }

  pub fn amount(&self) -> i64 {
    self
      .lines
      .iter()
      .map(|l| l.unit_amount.saturating_mul(i64::from(l.quantity)))
      .fold(0, i64::saturating_add)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
  CheckoutCompleted {
    session_id: String,
    buyer_id: Uuid,
    order_ids: Vec<Uuid>,
    payment_reference: Option<String>,
  },
  /// Any event type the service does not act on.
  Ignored(String),
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
  async fn create_checkout_session(&self, req: &CheckoutSessionRequest) -> Result<CheckoutSession>;

  /// Verifies the signature and decodes the event.
  fn parse_webhook(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent>;
}

pub fn provider_from_config(config: &AppConfig) -> Result<Arc<dyn PaymentProvider>> {
  let secret = config.payment_webhook_secret.clone();
  let provider: Arc<dyn PaymentProvider> = match config.payment_provider {
    PaymentProviderKind::Mock => Arc::new(MockPaymentGateway::new(secret)),
    PaymentProviderKind::Stripe => Arc::new(StripeGateway::new(
      config.stripe_api_base.clone(),
      config.stripe_secret_key.clone(),
      secret,
    )?),
  };
  Ok(provider)
}

/// Decodes a `checkout.session.completed` (or any other) event body whose signature has
/// already been checked.
pub(crate) fn decode_event(payload: &[u8]) -> Result<PaymentEvent> {
  let event: serde_json::Value = serde_json::from_slice(payload)
    .map_err(|e| AppError::Validation(format!("Webhook payload is not valid JSON: {}", e)))?;
  let event_type = event["type"]
    .as_str()
    .ok_or_else(|| AppError::Validation("Webhook event has no type".to_string()))?;
  if event_type != CHECKOUT_COMPLETED {
    return Ok(PaymentEvent::Ignored(event_type.to_string()));
  }

  let session = &event["data"]["object"];
  let session_id = session["id"]
    .as_str()
    .ok_or_else(|| AppError::Validation("Checkout session has no id".to_string()))?
    .to_string();
  let buyer = session["metadata"]["buyerId"]
    .as_str()
    .or_else(|| session["client_reference_id"].as_str())
    .ok_or_else(|| AppError::Validation("Checkout session names no buyer".to_string()))?;
  let buyer_id = Uuid::parse_str(buyer).map_err(|e| AppError::Validation(format!("Invalid buyer id: {}", e)))?;
  let order_ids = session["metadata"]["orderIds"]
    .as_str()
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(Uuid::parse_str)
    .collect::<std::result::Result<Vec<_>, _>>()
    .map_err(|e| AppError::Validation(format!("Invalid order id in session metadata: {}", e)))?;
  let payment_reference = session["payment_intent"].as_str().map(String::from);

  Ok(PaymentEvent::CheckoutCompleted {
    session_id,
    buyer_id,
    order_ids,
    payment_reference,
  })
}
