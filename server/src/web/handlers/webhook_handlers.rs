// bazaar/server/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::payments::{PaymentEvent, SIGNATURE_HEADER};
use crate::services::order_service;
use crate::state::AppState;

/// Provider notifications. A bad signature is a 400; a store failure is a 500 so the
/// provider retries delivery.
#[instrument(name = "handler::payment_webhook", skip(app_state, req, body), fields(payload_len = body.len()))]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|h| h.to_str().ok())
    .ok_or_else(|| AppError::WebhookSignature(format!("missing {} header", SIGNATURE_HEADER)))?;

  let event = app_state.payments.parse_webhook(&body, signature_header).map_err(|e| {
    warn!("Rejected webhook: {}", e);
    e
  })?;

  match event {
    PaymentEvent::CheckoutCompleted {
      session_id,
      buyer_id,
      order_ids,
      payment_reference,
    } => {
      let reference = payment_reference.as_deref().or(Some(session_id.as_str()));
      let result = if order_ids.is_empty() {
        order_service::confirm_payment_for_buyer(&app_state.db_pool, buyer_id, reference).await
      } else {
        order_service::confirm_payment_for_orders(&app_state.db_pool, buyer_id, &order_ids, reference).await
      };
      let updated_count = result.map_err(|e| {
        error!("Failed to record payment for session {}: {}", session_id, e);
        e
      })?;
      info!("Checkout session {} completed; {} orders marked paid.", session_id, updated_count);
      Ok(HttpResponse::Ok().json(json!({ "received": true, "updatedCount": updated_count })))
    }
    PaymentEvent::Ignored(event_type) => {
      info!("Unhandled event type {}", event_type);
      Ok(HttpResponse::Ok().json(json!({ "received": true, "updatedCount": 0 })))
    }
  }
}
