//! PhonePe checksum verification and callback payload decoding.
//!
//! PhonePe callbacks carry a base64 JSON payload plus a checksum of the form
//! `sha256(base64_payload + status_path + salt_key) + "###" + salt_index`.
//! The checksum must verify before anything in the payload is believed.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::PhonepeConfig;

/// Errors that can occur when handling PhonePe payloads.
#[derive(Debug, Error)]
pub enum PhonepeError {
    /// Payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Decoded payload is not the expected JSON shape.
    #[error("invalid payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Decoded callback payload.
#[derive(Debug, Deserialize)]
pub struct PhonepeResponse {
    pub code: String,
    pub data: PhonepeResponseData,
}

/// Transaction details inside a callback payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonepeResponseData {
    #[serde(default)]
    pub merchant_transaction_id: Option<String>,
    pub transaction_id: String,
    #[serde(default)]
    pub payment_instrument: Option<serde_json::Value>,
}

impl PhonepeResponse {
    /// `true` when the gateway reports the payment went through.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == "PAYMENT_SUCCESS"
    }

    /// `true` when the gateway reports a definitive failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.code.as_str(), "PAYMENT_ERROR" | "PAYMENT_DECLINED")
    }
}

/// PhonePe merchant credentials and checksum logic.
#[derive(Clone)]
pub struct PhonepeClient {
    merchant_id: String,
    salt_key: SecretString,
    salt_index: u8,
}

impl PhonepeClient {
    /// Create a new PhonePe client.
    #[must_use]
    pub fn new(config: &PhonepeConfig) -> Self {
        Self {
            merchant_id: config.merchant_id.clone(),
            salt_key: config.salt_key.clone(),
            salt_index: config.salt_index,
        }
    }

    /// The configured merchant id. Callbacks naming a different merchant are
    /// rejected before checksum verification.
    #[must_use]
    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    /// Compute the checksum for a callback payload.
    #[must_use]
    pub fn callback_checksum(&self, base64_response: &str, merchant_transaction_id: &str) -> String {
        let path = format!(
            "/pg/v1/status/{}/{}",
            self.merchant_id, merchant_transaction_id
        );

        let mut hasher = Sha256::new();
        hasher.update(base64_response.as_bytes());
        hasher.update(path.as_bytes());
        hasher.update(self.salt_key.expose_secret().as_bytes());
        let digest = hex::encode(hasher.finalize());

        format!("{digest}###{}", self.salt_index)
    }

    /// Verify a callback checksum in constant time.
    #[must_use]
    pub fn verify_callback(
        &self,
        base64_response: &str,
        merchant_transaction_id: &str,
        provided: &str,
    ) -> bool {
        let expected = self.callback_checksum(base64_response, merchant_transaction_id);
        constant_time_eq(expected.as_bytes(), provided.as_bytes())
    }
}

/// Decode a base64 callback payload.
///
/// # Errors
///
/// Returns `PhonepeError` if the payload isn't base64 or isn't the expected
/// JSON shape.
pub fn decode_response(base64_response: &str) -> Result<PhonepeResponse, PhonepeError> {
    let bytes = BASE64.decode(base64_response)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Byte equality without early exit. Also used for the content webhook's
/// shared-secret check.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PhonepeClient {
        PhonepeClient::new(&PhonepeConfig {
            merchant_id: "MERCHANT1".to_string(),
            salt_key: SecretString::from("salt-key"),
            salt_index: 1,
        })
    }

    #[test]
    fn test_checksum_construction() {
        let payload = BASE64.encode(r#"{"code":"PAYMENT_SUCCESS"}"#);
        let checksum = client().callback_checksum(&payload, "TXN123");

        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hasher.update(b"/pg/v1/status/MERCHANT1/TXN123");
        hasher.update(b"salt-key");
        let expected = format!("{}###1", hex::encode(hasher.finalize()));

        assert_eq!(checksum, expected);
    }

    #[test]
    fn test_verify_accepts_matching_checksum() {
        let c = client();
        let payload = BASE64.encode(r#"{"code":"PAYMENT_SUCCESS"}"#);
        let checksum = c.callback_checksum(&payload, "TXN123");
        assert!(c.verify_callback(&payload, "TXN123", &checksum));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let c = client();
        let payload = BASE64.encode(r#"{"code":"PAYMENT_SUCCESS"}"#);
        let checksum = c.callback_checksum(&payload, "TXN123");

        let other = BASE64.encode(r#"{"code":"PAYMENT_ERROR"}"#);
        assert!(!c.verify_callback(&other, "TXN123", &checksum));
        assert!(!c.verify_callback(&payload, "TXN999", &checksum));
        assert!(!c.verify_callback(&payload, "TXN123", "garbage###1"));
    }

    #[test]
    fn test_decode_response() {
        let payload = BASE64.encode(
            r#"{"code":"PAYMENT_SUCCESS","data":{"merchantTransactionId":"TXN123","transactionId":"T999","paymentInstrument":{"type":"UPI","utr":"ABC"}}}"#,
        );

        let decoded = decode_response(&payload).expect("valid payload");
        assert!(decoded.is_success());
        assert!(!decoded.is_failure());
        assert_eq!(decoded.data.transaction_id, "T999");
        assert_eq!(decoded.data.merchant_transaction_id.as_deref(), Some("TXN123"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_response("not base64!!!").is_err());

        let not_json = BASE64.encode("plain text");
        assert!(decode_response(&not_json).is_err());
    }

    #[test]
    fn test_failure_codes() {
        for code in ["PAYMENT_ERROR", "PAYMENT_DECLINED"] {
            let payload = BASE64.encode(format!(
                r#"{{"code":"{code}","data":{{"transactionId":"T1"}}}}"#
            ));
            let decoded = decode_response(&payload).expect("valid payload");
            assert!(decoded.is_failure());
            assert!(!decoded.is_success());
        }
    }
}
