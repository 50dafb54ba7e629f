//! Razorpay Orders API client and payment signature verification.
//!
//! Checkout creates a gateway order here; after the shopper pays, the
//! client posts back `(order_id, payment_id, signature)` and
//! [`RazorpayClient::verify_payment_signature`] checks the signature before
//! the order is marked paid. Verification goes through `Mac::verify_slice`,
//! which compares in constant time.

use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use marigold_core::to_paise;

use crate::config::RazorpayConfig;

type HmacSha256 = Hmac<Sha256>;

/// Razorpay API base URL.
const BASE_URL: &str = "https://api.razorpay.com/v1";

/// Errors that can occur when interacting with the Razorpay API.
#[derive(Debug, Error)]
pub enum RazorpayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Amount is negative or doesn't fit in paise.
    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),
}

/// A gateway order, as returned by the Orders API.
#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

/// Razorpay Orders API client.
#[derive(Clone)]
pub struct RazorpayClient {
    client: reqwest::Client,
    key_id: String,
    key_secret: SecretString,
}

impl RazorpayClient {
    /// Create a new Razorpay client.
    #[must_use]
    pub fn new(config: &RazorpayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        }
    }

    /// The public key id, needed by the browser checkout widget.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a gateway order in INR.
    ///
    /// # Errors
    ///
    /// Returns `RazorpayError::InvalidAmount` if the amount can't be expressed
    /// in paise, or `RazorpayError::Api` if the gateway rejects the request.
    pub async fn create_order(
        &self,
        amount: Decimal,
        receipt: &str,
    ) -> Result<RazorpayOrder, RazorpayError> {
        let paise = to_paise(amount).ok_or(RazorpayError::InvalidAmount(amount))?;

        let body = serde_json::json!({
            "amount": paise,
            "currency": "INR",
            "receipt": receipt,
        });

        let response = self
            .client
            .post(format!("{BASE_URL}/orders"))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        Ok(response.json().await?)
    }

    /// Verify the checkout signature for a completed payment.
    ///
    /// The signature is HMAC-SHA256 over `"<order_id>|<payment_id>"` keyed
    /// with the API secret, hex-encoded. Malformed hex fails verification.
    #[must_use]
    pub fn verify_payment_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool {
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(self.key_secret.expose_secret().as_bytes())
        else {
            return false;
        };
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        mac.verify_slice(&signature).is_ok()
    }
}

async fn api_error(status: StatusCode, response: reqwest::Response) -> RazorpayError {
    let message = response.text().await.unwrap_or_default();
    RazorpayError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RazorpayClient {
        RazorpayClient::new(&RazorpayConfig {
            key_id: "rzp_test_key".to_string(),
            key_secret: SecretString::from("test_secret"),
        })
    }

    fn sign(secret: &str, payload: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let signature = sign("test_secret", "order_abc|pay_xyz");
        assert!(client().verify_payment_signature("order_abc", "pay_xyz", &signature));
    }

    #[test]
    fn test_tampered_payment_id_rejected() {
        let signature = sign("test_secret", "order_abc|pay_xyz");
        assert!(!client().verify_payment_signature("order_abc", "pay_other", &signature));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signature = sign("other_secret", "order_abc|pay_xyz");
        assert!(!client().verify_payment_signature("order_abc", "pay_xyz", &signature));
    }

    #[test]
    fn test_malformed_hex_rejected() {
        assert!(!client().verify_payment_signature("order_abc", "pay_xyz", "not-hex"));
        assert!(!client().verify_payment_signature("order_abc", "pay_xyz", ""));
    }
}
