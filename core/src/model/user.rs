// bazaar/core/src/model/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::BazaarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Buyer,
  Seller,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Buyer => "buyer",
      Role::Seller => "seller",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = BazaarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "buyer" => Ok(Role::Buyer),
      "seller" => Ok(Role::Seller),
      other => Err(BazaarError::InvalidRole(other.to_string())),
    }
  }
}

/// Public view of an account. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: Uuid,
  pub email: String,
  pub name: String,
  pub role: Role,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn is_seller(&self) -> bool {
    self.role == Role::Seller
  }

  pub fn is_buyer(&self) -> bool {
    self.role == Role::Buyer
  }
}
