// bazaar/server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use bazaar::{
  CreateOrderRequest, OrderFilter, OrderStatus, PaymentStatus, PaymentUpdateRequest, PaymentUpdateResponse, StatusUpdate,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::order_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_orders", skip(app_state, filter), fields(buyer_id = ?filter.buyer_id, seller_id = ?filter.seller_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  filter: web::Query<OrderFilter>,
) -> Result<HttpResponse, AppError> {
  let orders = order_service::list_orders(&app_state.db_pool, &filter).await?;
  info!("Fetched {} orders.", orders.len());
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(
    name = "handler::create_order",
    skip(app_state, req_payload),
    fields(buyer_id = %req_payload.buyer_id, seller_id = %req_payload.seller_id)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let order = order_service::place_order(&app_state.db_pool, &req_payload)
    .await
    .map_err(|e| {
      warn!("Order creation failed: {}", e);
      e
    })?;
  Ok(HttpResponse::Created().json(order))
}

#[instrument(name = "handler::get_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = order_service::get_order(&app_state.db_pool, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(
    name = "handler::update_order_status",
    skip(app_state, auth_user, path, req_payload),
    fields(user_id = %auth_user.user_id, order_id = %path.as_ref(), status = %req_payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<StatusUpdate>,
) -> Result<HttpResponse, AppError> {
  let status: OrderStatus = req_payload.status.trim().parse()?;
  let order = order_service::update_status(&app_state.db_pool, auth_user.user_id, path.into_inner(), status).await?;
  Ok(HttpResponse::Ok().json(order))
}

/// Bulk payment confirmation for a buyer. The only accepted status is `paid`.
#[instrument(name = "handler::update_payment", skip(app_state, req_payload), fields(user_id = %req_payload.user_id))]
pub async fn update_payment_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PaymentUpdateRequest>,
) -> Result<HttpResponse, AppError> {
  let status: PaymentStatus = req_payload.status.trim().parse()?;
  if status != PaymentStatus::Paid {
    return Err(AppError::InvalidStatus(req_payload.status.clone()));
  }
  let updated_count = order_service::confirm_payment_for_buyer(&app_state.db_pool, req_payload.user_id, None).await?;
  Ok(HttpResponse::Ok().json(PaymentUpdateResponse {
    success: true,
    message: format!("{} order(s) marked as paid", updated_count),
    updated_count,
  }))
}
