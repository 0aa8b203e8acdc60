// bazaar/server/src/payments/stripe.rs

//! Hosted checkout over the provider's REST API, form-encoded as it expects.

use async_trait::async_trait;
use bazaar::CheckoutSession;
use std::time::Duration;
use tracing::{error, info, instrument};

use super::{decode_event, signature, CheckoutSessionRequest, PaymentEvent, PaymentProvider};
use crate::config::Secret;
use crate::errors::{AppError, Result};

pub struct StripeGateway {
  client: reqwest::Client,
  api_base: String,
  secret_key: Secret<String>,
  webhook_secret: Secret<String>,
}

impl StripeGateway {
  pub fn new(api_base: String, secret_key: Secret<String>, webhook_secret: Secret<String>) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .map_err(|e| AppError::Config(format!("Cannot build HTTP client: {}", e)))?;
    Ok(Self {
      client,
      api_base: api_base.trim_end_matches('/').to_string(),
      secret_key,
      webhook_secret,
    })
  }

  /// Form fields for `POST /v1/checkout/sessions`.
  pub fn session_form(req: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
      ("mode".to_string(), "payment".to_string()),
      ("payment_method_types[0]".to_string(), "card".to_string()),
    ];
    for (i, line) in req.lines.iter().enumerate() {
      let prefix = format!("line_items[{}]", i);
      form.push((format!("{}[price_data][currency]", prefix), req.currency.clone()));
      form.push((format!("{}[price_data][product_data][name]", prefix), line.name.clone()));
      form.push((format!("{}[price_data][unit_amount]", prefix), line.unit_amount.to_string()));
      form.push((format!("{}[quantity]", prefix), line.quantity.to_string()));
    }
    let order_ids = req.order_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
    form.extend([
      ("success_url".to_string(), req.success_url.clone()),
      ("cancel_url".to_string(), req.cancel_url.clone()),
      ("client_reference_id".to_string(), req.buyer_id.to_string()),
      ("metadata[buyerId]".to_string(), req.buyer_id.to_string()),
      ("metadata[orderIds]".to_string(), order_ids),
    ]);
    form
  }
}

#[async_trait]
impl PaymentProvider for StripeGateway {
  #[instrument(name = "stripe::create_checkout_session", skip(self, req), fields(buyer_id = %req.buyer_id, orders = req.order_ids.len()))]
  async fn create_checkout_session(&self, req: &CheckoutSessionRequest) -> Result<CheckoutSession> {
    let response = self
      .client
      .post(format!("{}/v1/checkout/sessions", self.api_base))
      .basic_auth(self.secret_key.reveal(), None::<&str>)
      .form(&Self::session_form(req))
      .send()
      .await
      .map_err(|e| {
        error!("Checkout session request failed: {}", e);
        AppError::PaymentProvider(format!("Checkout session request failed: {}", e))
      })?;

    let status = response.status();
    let body: serde_json::Value = response
      .json()
      .await
      .map_err(|e| AppError::PaymentProvider(format!("Unreadable checkout session response: {}", e)))?;
    if !status.is_success() {
      let message = body["error"]["message"].as_str().unwrap_or("unknown error");
      error!(status = status.as_u16(), "Provider rejected checkout session: {}", message);
      return Err(AppError::PaymentProvider(format!(
        "Provider rejected checkout session ({}): {}",
        status.as_u16(),
        message
      )));
    }

    let session_id = body["id"]
      .as_str()
      .ok_or_else(|| AppError::PaymentProvider(format!("Checkout session response has no id: {}", body)))?
      .to_string();
    info!("Checkout session {} created.", session_id);
    Ok(CheckoutSession {
      session_id,
      url: body["url"].as_str().map(String::from),
    })
  }

  fn parse_webhook(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent> {
    signature::verify(payload, signature_header, self.webhook_secret.reveal())?;
    decode_event(payload)
  }
}
