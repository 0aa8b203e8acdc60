// bazaar/core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BazaarError {
  #[error("Invalid order status: '{0}'")]
  InvalidStatus(String),

  #[error("Invalid role: '{0}'")]
  InvalidRole(String),

  #[error("Invalid quantity {quantity} for product {product_id}")]
  InvalidQuantity { product_id: Uuid, quantity: i32 },

  #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
  InsufficientStock {
    product_id: Uuid,
    requested: i32,
    available: i32,
  },

  #[error("Product {0} is not in the local product list")]
  UnknownProduct(Uuid),

  #[error("Product {0} is not in the cart")]
  NotInCart(Uuid),

  #[error("The cart is empty")]
  EmptyCart,

  #[error("No user is signed in")]
  NotSignedIn,

  #[error("Operation requires the {required} role")]
  WrongRole { required: &'static str },

  #[error("Order {0} is not in the local order list")]
  UnknownOrder(Uuid),

  #[error("No pending orders are awaiting payment")]
  NothingToPay,

  #[error("Order {0} is already delivered")]
  FinalStatus(Uuid),

  #[error("Server rejected the request ({status}): {message}")]
  Api { status: u16, message: String },

  #[error("Transport error. Source: {source}")]
  Transport {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for BazaarError {
  fn from(err: AnyhowError) -> Self {
    BazaarError::Transport { source: err }
  }
}

pub type BazaarResult<T, E = BazaarError> = std::result::Result<T, E>;
