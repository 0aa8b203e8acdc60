// bazaar/server/src/payments/signature.rs

//! Webhook signatures in the `t=<unix>,v1=<hex>` scheme: HMAC-SHA256 over `"{t}.{body}"`.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age, in seconds, of a signed event.
pub const TOLERANCE_SECS: i64 = 300;

fn mac_for(secret: &str, timestamp: &str, payload: &[u8]) -> Result<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| AppError::Internal(format!("Invalid webhook secret: {}", e)))?;
  mac.update(timestamp.as_bytes());
  mac.update(b".");
  mac.update(payload);
  Ok(mac)
}

/// Builds a signature header for `payload`, as the provider would send it.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String> {
  let mac = mac_for(secret, &timestamp.to_string(), payload)?;
  Ok(format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes())))
}

pub fn verify(payload: &[u8], header: &str, secret: &str) -> Result<()> {
  verify_at(payload, header, secret, Utc::now().timestamp())
}

/// Accepts the header if any `v1` signature matches and the timestamp is within tolerance of `now`.
pub fn verify_at(payload: &[u8], header: &str, secret: &str, now: i64) -> Result<()> {
  let mut timestamp = None;
  let mut signatures = Vec::new();
  for part in header.split(',') {
    let part = part.trim();
    if let Some(t) = part.strip_prefix("t=") {
      timestamp = Some(t);
    } else if let Some(v) = part.strip_prefix("v1=") {
      signatures.push(v);
    }
  }
  let timestamp = timestamp.ok_or_else(|| AppError::WebhookSignature("missing timestamp".to_string()))?;
  if signatures.is_empty() {
    return Err(AppError::WebhookSignature("missing v1 signature".to_string()));
  }
  let ts: i64 = timestamp
    .parse()
    .map_err(|_| AppError::WebhookSignature("invalid timestamp".to_string()))?;
  if (now - ts).abs() > TOLERANCE_SECS {
    return Err(AppError::WebhookSignature("timestamp outside tolerance".to_string()));
  }

  for signature in signatures {
    let Ok(expected) = hex::decode(signature) else {
      continue;
    };
    // verify_slice compares in constant time.
    if mac_for(secret, timestamp, payload)?.verify_slice(&expected).is_ok() {
      return Ok(());
    }
  }
  Err(AppError::WebhookSignature("signature mismatch".to_string()))
}
