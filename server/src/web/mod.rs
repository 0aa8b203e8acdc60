// bazaar/server/src/web/mod.rs
pub mod extractors;
pub mod handlers;
pub mod routes;

use actix_web::{error::InternalError, web, HttpResponse, ResponseError};
use tracing::warn;

use crate::errors::AppError;

pub use routes::configure_app_routes;

fn bad_request(err: impl std::fmt::Display) -> actix_web::Error {
  warn!("Rejected malformed request: {}", err);
  let app_err = AppError::Validation(err.to_string());
  let response: HttpResponse = app_err.error_response();
  InternalError::from_response(app_err, response).into()
}

/// Body extraction errors answer with the same JSON error shape as handlers.
pub fn json_config() -> web::JsonConfig {
  web::JsonConfig::default()
    .limit(256 * 1024)
    .error_handler(|err, _req| bad_request(err))
}

pub fn query_config() -> web::QueryConfig {
  web::QueryConfig::default().error_handler(|err, _req| bad_request(err))
}

pub fn path_config() -> web::PathConfig {
  web::PathConfig::default().error_handler(|err, _req| bad_request(err))
}
