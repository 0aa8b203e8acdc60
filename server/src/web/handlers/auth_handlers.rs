// bazaar/server/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use bazaar::{LoginRequest, SignupRequest};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::services::auth_service;
use crate::state::AppState;

#[instrument(
    name = "handler::signup",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
  let user = auth_service::signup(&app_state.db_pool, &req_payload)
    .await
    .map_err(|e| {
      warn!("Signup failed for {}: {}", req_payload.email, e);
      e
    })?;
  info!("Signup successful. User ID: {}", user.id);
  Ok(HttpResponse::Created().json(user))
}

#[instrument(
    name = "handler::login",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
  let user = auth_service::login(&app_state.db_pool, &req_payload).await?;
  info!("Login successful. User ID: {}", user.id);
  Ok(HttpResponse::Ok().json(user))
}
