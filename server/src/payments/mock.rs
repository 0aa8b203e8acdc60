// bazaar/server/src/payments/mock.rs

//! In-process payment gateway for development and tests. Sessions are recorded in memory
//! and webhooks are verified with the same signature scheme as the real provider.

use async_trait::async_trait;
use bazaar::CheckoutSession;
use parking_lot::Mutex;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{decode_event, signature, CheckoutSessionRequest, PaymentEvent, PaymentProvider, CHECKOUT_COMPLETED};
use crate::config::Secret;
use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct MockCheckoutSession {
  pub id: String,
  pub request: CheckoutSessionRequest,
}

pub struct MockPaymentGateway {
  webhook_secret: Secret<String>,
  sessions: Mutex<Vec<MockCheckoutSession>>,
}

impl MockPaymentGateway {
  pub fn new(webhook_secret: Secret<String>) -> Self {
    Self {
      webhook_secret,
      sessions: Mutex::new(Vec::new()),
    }
  }

  pub fn sessions(&self) -> Vec<MockCheckoutSession> {
    self.sessions.lock().clone()
  }

  /// The signed `checkout.session.completed` event the provider would deliver for `session_id`.
  pub fn completed_event(&self, session_id: &str, payment_reference: &str) -> Result<(Vec<u8>, String)> {
    let session = self
      .sessions
      .lock()
      .iter()
      .find(|s| s.id == session_id)
      .cloned()
      .ok_or_else(|| AppError::NotFound(format!("Checkout session {} not found", session_id)))?;
    let order_ids = session
      .request
      .order_ids
      .iter()
      .map(|id| id.to_string())
      .collect::<Vec<_>>()
      .join(",");
    let payload = json!({
      "id": format!("evt_{}", Uuid::new_v4().simple()),
      "type": CHECKOUT_COMPLETED,
      "data": { "object": {
        "id": session.id,
        "client_reference_id": session.request.buyer_id.to_string(),
        "payment_intent": payment_reference,
        "metadata": {
          "buyerId": session.request.buyer_id.to_string(),
          "orderIds": order_ids,
        },
      }},
    })
    .to_string()
    .into_bytes();
    let header = signature::sign_payload(&payload, self.webhook_secret.reveal(), chrono::Utc::now().timestamp())?;
    Ok((payload, header))
  }
}

#[async_trait]
impl PaymentProvider for MockPaymentGateway {
  #[instrument(name = "mock_payment::create_checkout_session", skip(self, req), fields(buyer_id = %req.buyer_id, amount = req.amount()))]
  async fn create_checkout_session(&self, req: &CheckoutSessionRequest) -> Result<CheckoutSession> {
    if req.amount() <= 0 {
      return Err(AppError::PaymentProvider("Amount must be greater than zero".to_string()));
    }
    let id = format!("mock_cs_{}", Uuid::new_v4().simple());
    self.sessions.lock().push(MockCheckoutSession {
      id: id.clone(),
      request: req.clone(),
    });
    info!("Simulated checkout session {} for {} orders.", id, req.order_ids.len());
    Ok(CheckoutSession {
      url: Some(format!("{}&mock=1", req.success_url.replace("{CHECKOUT_SESSION_ID}", &id))),
      session_id: id,
    })
  }

  fn parse_webhook(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent> {
    signature::verify(payload, signature_header, self.webhook_secret.reveal())?;
    decode_event(payload)
  }
}
