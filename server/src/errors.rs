// bazaar/server/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use bazaar::{BazaarError, ErrorBody};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Auth(String),

  #[error("{0}")]
  NotFound(String),

  #[error("Product {0} not found")]
  ProductNotFound(Uuid),

  #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
  InsufficientStock {
    product_id: Uuid,
    requested: i32,
    available: i32,
  },

  #[error("Invalid order status: '{0}'")]
  InvalidStatus(String),

  #[error("Webhook signature verification failed: {0}")]
  WebhookSignature(String),

  #[error("Payment provider error: {0}")]
  PaymentProvider(String),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Database error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal server error: {0}")]
  Internal(String),
}

impl From<sqlx::migrate::MigrateError> for AppError {
  fn from(err: sqlx::migrate::MigrateError) -> Self {
    AppError::Internal(format!("Database migration failed: {}", err))
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

/// Domain rule violations detected by the core crate keep their meaning over HTTP.
impl From<BazaarError> for AppError {
  fn from(err: BazaarError) -> Self {
    match err {
      BazaarError::InvalidStatus(s) => AppError::InvalidStatus(s),
      BazaarError::InsufficientStock {
        product_id,
        requested,
        available,
      } => AppError::InsufficientStock {
        product_id,
        requested,
        available,
      },
      BazaarError::UnknownProduct(id) => AppError::ProductNotFound(id),
      BazaarError::InvalidRole(_) | BazaarError::InvalidQuantity { .. } | BazaarError::EmptyCart => {
        AppError::Validation(err.to_string())
      }
      other => AppError::Internal(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_)
      | AppError::InsufficientStock { .. }
      | AppError::InvalidStatus(_)
      | AppError::WebhookSignature(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) | AppError::ProductNotFound(_) => StatusCode::NOT_FOUND,
      AppError::PaymentProvider(_) | AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    // Store details stay in the log, not in the response.
    let message = match self {
      AppError::Sqlx(_) => "Database operation failed".to_string(),
      AppError::Config(_) | AppError::Internal(_) => "An internal error occurred".to_string(),
      other => other.to_string(),
    };
    if status.is_server_error() {
      tracing::error!(application_error = %self, status = status.as_u16(), "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with error");
    }
    HttpResponse::build(status).json(ErrorBody { error: message })
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn statuses_follow_the_error_taxonomy() {
    let id = Uuid::new_v4();
    let cases = [
      (AppError::Validation("bad".into()), 400),
      (
        AppError::InsufficientStock {
          product_id: id,
          requested: 2,
          available: 1,
        },
        400,
      ),
      (AppError::InvalidStatus("paid".into()), 400),
      (AppError::WebhookSignature("nope".into()), 400),
      (AppError::Auth("who".into()), 401),
      (AppError::NotFound("gone".into()), 404),
      (AppError::ProductNotFound(id), 404),
      (AppError::PaymentProvider("down".into()), 500),
      (AppError::Sqlx(sqlx::Error::RowNotFound), 500),
      (AppError::Internal("oops".into()), 500),
    ];
    for (err, expected) in cases {
      assert_eq!(err.status_code().as_u16(), expected, "{}", err);
    }
  }

  #[test]
  fn insufficient_stock_names_the_product() {
    let id = Uuid::new_v4();
    let err = AppError::InsufficientStock {
      product_id: id,
      requested: 2,
      available: 1,
    };
    assert!(err.to_string().contains(&id.to_string()));
  }

  #[test]
  fn domain_errors_map_to_http_meaning() {
    assert!(matches!(
      AppError::from(BazaarError::InvalidStatus("paid".into())),
      AppError::InvalidStatus(_)
    ));
    assert!(matches!(
      AppError::from(BazaarError::InvalidRole("admin".into())),
      AppError::Validation(_)
    ));
  }
}
