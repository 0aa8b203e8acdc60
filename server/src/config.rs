// bazaar/server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Wrapper that keeps a value out of `Debug`/`Display` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>
where
  T: Clone + Default,
{
  value: T,
}

impl<T: Clone + Default> Secret<T> {
  pub fn new(value: T) -> Self {
    Self { value }
  }

  pub fn reveal(&self) -> &T {
    &self.value
  }
}

impl<T: Clone + Default> fmt::Debug for Secret<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("****")
  }
}

impl<T: Clone + Default> fmt::Display for Secret<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("****")
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProviderKind {
  Mock,
  Stripe,
}

impl FromStr for PaymentProviderKind {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "mock" => Ok(PaymentProviderKind::Mock),
      "stripe" => Ok(PaymentProviderKind::Stripe),
      other => Err(AppError::Config(format!(
        "Invalid PAYMENT_PROVIDER '{}': expected 'mock' or 'stripe'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub db_max_connections: u32,
  /// Public URL of the storefront, used for checkout success/cancel redirects.
  pub app_base_url: String,

  pub payment_provider: PaymentProviderKind,
  pub stripe_secret_key: Secret<String>,
  pub stripe_api_base: String,
  pub payment_webhook_secret: Secret<String>,
  pub checkout_currency: String,

  pub seed_db: bool,
  pub log_json: bool,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: "sqlite://data/bazaar.db".to_string(),
      db_max_connections: 5,
      app_base_url: "http://127.0.0.1:8080".to_string(),
      payment_provider: PaymentProviderKind::Mock,
      stripe_secret_key: Secret::default(),
      stripe_api_base: "https://api.stripe.com".to_string(),
      payment_webhook_secret: Secret::new("whsec_local_dev".to_string()),
      checkout_currency: "bdt".to_string(),
      seed_db: false,
      log_json: false,
    }
  }
}

fn parse_var<T: FromStr>(name: &str, raw: String) -> Result<T>
where
  T::Err: fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e)))
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    let config = Self::from_lookup(|name| env::var(name).ok())?;
    tracing::info!(
      host = %config.server_host,
      port = config.server_port,
      provider = ?config.payment_provider,
      "Application configuration loaded."
    );
    Ok(config)
  }

  /// Builds the configuration from any variable source. Unset variables fall back to defaults.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let defaults = Self::default();
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let server_host = get("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = match get("SERVER_PORT") {
      Some(raw) => parse_var("SERVER_PORT", raw)?,
      None => defaults.server_port,
    };
    let database_url = get("DATABASE_URL").unwrap_or(defaults.database_url);
    let db_max_connections = match get("DB_MAX_CONNECTIONS") {
      Some(raw) => parse_var("DB_MAX_CONNECTIONS", raw)?,
      None => defaults.db_max_connections,
    };
    let app_base_url = get("APP_BASE_URL").unwrap_or_else(|| format!("http://{}:{}", server_host, server_port));

    let payment_provider = match get("PAYMENT_PROVIDER") {
      Some(raw) => raw.parse()?,
      None => defaults.payment_provider,
    };
    let stripe_secret_key = Secret::new(get("STRIPE_SECRET_KEY").unwrap_or_default());
    if payment_provider == PaymentProviderKind::Stripe && stripe_secret_key.reveal().is_empty() {
      return Err(AppError::Config(
        "STRIPE_SECRET_KEY must be set when PAYMENT_PROVIDER=stripe".to_string(),
      ));
    }
    let stripe_api_base = get("STRIPE_API_BASE").unwrap_or(defaults.stripe_api_base);
    let payment_webhook_secret = match get("PAYMENT_WEBHOOK_SECRET") {
      Some(secret) => Secret::new(secret),
      None if payment_provider == PaymentProviderKind::Stripe => {
        return Err(AppError::Config(
          "PAYMENT_WEBHOOK_SECRET must be set when PAYMENT_PROVIDER=stripe".to_string(),
        ))
      }
      None => defaults.payment_webhook_secret,
    };
    let checkout_currency = get("CHECKOUT_CURRENCY")
      .map(|c| c.to_ascii_lowercase())
      .unwrap_or(defaults.checkout_currency);

    let seed_db = match get("SEED_DB") {
      Some(raw) => parse_var("SEED_DB", raw)?,
      None => defaults.seed_db,
    };
    let log_json = get("LOG_FORMAT").map_or(false, |f| f.eq_ignore_ascii_case("json"));

    Ok(Self {
      server_host,
      server_port,
      database_url,
      db_max_connections,
      app_base_url,
      payment_provider,
      stripe_secret_key,
      stripe_api_base,
      payment_webhook_secret,
      checkout_currency,
      seed_db,
      log_json,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
