// bazaar/server/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use bazaar::CheckoutRequest;
use tracing::{error, info, instrument};

use crate::errors::AppError;
use crate::payments::CheckoutSessionRequest;
use crate::services::order_service;
use crate::state::AppState;

#[instrument(
    name = "handler::start_checkout",
    skip(app_state, req_payload),
    fields(buyer_id = %req_payload.buyer_id, orders = req_payload.order_ids.len())
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let orders = order_service::payable_orders(&app_state.db_pool, req_payload.buyer_id, &req_payload.order_ids).await?;
  let session_req = CheckoutSessionRequest::for_orders(req_payload.buyer_id, &orders, &app_state.config);
  let session = app_state
    .payments
    .create_checkout_session(&session_req)
    .await
    .map_err(|e| {
      error!("Could not create checkout session: {}", e);
      e
    })?;
  info!("Checkout session {} created for {} orders.", session.session_id, orders.len());
  Ok(HttpResponse::Ok().json(session))
}
