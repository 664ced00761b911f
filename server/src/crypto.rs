//! Webhook signature verification
//!
//! Payment webhooks carry a `Stripe-Signature` style header:
//! `t=<unix seconds>,v1=<hex hmac>[,v1=<hex hmac>...]` where each `v1` is
//! `HMAC-SHA256(secret, "{t}.{raw body}")`. Several `v1` entries appear while
//! a secret is being rolled; any one matching is enough.

use crate::error::{AppError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies that a webhook payload was sent by the payment processor
pub trait WebhookVerifier: Send + Sync {
    /// `now` is unix seconds; `Err(InvalidSignature)` on any mismatch
    fn verify(&self, payload: &[u8], header: &str, now: i64) -> Result<()>;
}

/// HMAC-SHA256 verifier for `t=...,v1=...` headers
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }
}

impl WebhookVerifier for SignatureVerifier {
    fn verify(&self, payload: &[u8], header: &str, now: i64) -> Result<()> {
        if self.secret.is_empty() {
            tracing::warn!("Webhook secret not configured; rejecting event");
            return Err(AppError::InvalidSignature);
        }

        let parsed = parse_header(header).ok_or(AppError::InvalidSignature)?;

        if now.abs_diff(parsed.timestamp) > self.tolerance_secs.unsigned_abs() {
            tracing::warn!(
                "Webhook timestamp {} outside tolerance (now {})",
                parsed.timestamp,
                now
            );
            return Err(AppError::InvalidSignature);
        }

        for candidate in &parsed.signatures {
            let Ok(expected) = hex::decode(candidate) else {
                continue;
            };
            let mut mac = new_mac(&self.secret)?;
            mac.update(parsed.timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            // verify_slice compares in constant time
            if mac.verify_slice(&expected).is_ok() {
                return Ok(());
            }
        }

        Err(AppError::InvalidSignature)
    }
}

/// Produce a header for `payload`; used by tests and local tooling
pub fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String> {
    let mut mac = new_mac(secret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let digest = mac.finalize().into_bytes();
    Ok(format!("t={},v1={}", timestamp, hex::encode(digest)))
}

fn new_mac(secret: &str) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Generic(format!("HMAC initialization failed: {}", e)))
}

struct ParsedHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_header(header: &str) -> Option<ParsedHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let (key, value) = part.trim().split_once('=')?;
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    if signatures.is_empty() {
        return None;
    }

    Some(ParsedHeader {
        timestamp: timestamp?,
        signatures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const NOW: i64 = 1_760_000_000;

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(SECRET, 300)
    }

    #[test]
    fn test_valid_signature() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(SECRET, NOW, payload).unwrap();
        assert!(verifier().verify(payload, &header, NOW + 10).is_ok());
    }

    #[test]
    fn test_tampered_payload() {
        let header = sign(SECRET, NOW, br#"{"id":"evt_1"}"#).unwrap();
        let result = verifier().verify(br#"{"id":"evt_2"}"#, &header, NOW);
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_secret() {
        let payload = b"{}";
        let header = sign("whsec_other", NOW, payload).unwrap();
        assert!(verifier().verify(payload, &header, NOW).is_err());
    }

    #[test]
    fn test_stale_timestamp() {
        let payload = b"{}";
        let header = sign(SECRET, NOW, payload).unwrap();
        assert!(verifier().verify(payload, &header, NOW + 301).is_err());
        assert!(verifier().verify(payload, &header, NOW - 301).is_err());
    }

    #[test]
    fn test_any_matching_v1_is_accepted() {
        let payload = b"{}";
        let good = sign(SECRET, NOW, payload).unwrap();
        let good_sig = good.split_once("v1=").unwrap().1;
        let header = format!("t={},v1={},v1={}", NOW, "00".repeat(32), good_sig);
        assert!(verifier().verify(payload, &header, NOW).is_ok());
    }

    #[test]
    fn test_malformed_headers() {
        let only_timestamp = format!("t={}", NOW);
        for header in ["", "garbage", "t=abc,v1=00", "v1=00", only_timestamp.as_str()] {
            assert!(verifier().verify(b"{}", header, NOW).is_err(), "{:?}", header);
        }
    }

    #[test]
    fn test_extreme_timestamps_are_rejected() {
        let sig = "00".repeat(32);
        for t in [i64::MIN, i64::MAX] {
            let header = format!("t={},v1={}", t, sig);
            let result = verifier().verify(b"{}", &header, NOW);
            assert!(matches!(result, Err(AppError::InvalidSignature)), "t={}", t);
        }

        let payload = b"{}";
        let header = sign(SECRET, i64::MIN, payload).unwrap();
        assert!(verifier().verify(payload, &header, i64::MAX).is_err());
    }

    #[test]
    fn test_empty_secret_rejects_everything() {
        let payload = b"{}";
        let header = sign("", NOW, payload).unwrap();
        let verifier = SignatureVerifier::new("", 300);
        assert!(verifier.verify(payload, &header, NOW).is_err());
    }
}
