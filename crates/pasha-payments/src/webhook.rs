//! Stripe Webhook Handling
//!
//! Verifies the `Stripe-Signature` header and decodes the event fields
//! the gateway consumes. The payload is deliberately decoded into an
//! explicit optional structure rather than walked as an untyped tree:
//! an absent or malformed path reads as "did not buy the add-on".

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::checkout::EBOOK_NAME;
use crate::error::{PaymentError, Result};

/// Event type announcing a completed checkout.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Maximum accepted age of a signature timestamp, in seconds. Matches
/// Stripe's own default tolerance.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// A verified webhook event, reduced to the fields the gateway reads.
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    /// Event type, e.g. `checkout.session.completed`
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event payload
    pub data: EventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventData {
    /// The object the event describes
    pub object: SessionObject,
}

/// Checkout-session fields consumed from the event payload. Everything
/// is optional; missing fields decode rather than fail.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SessionObject {
    /// Customer reference, if the session carries one
    #[serde(default)]
    pub customer: Option<String>,

    /// Line items as displayed on the checkout page
    #[serde(default)]
    pub display_items: Vec<DisplayItem>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DisplayItem {
    #[serde(default)]
    pub custom: Option<CustomProduct>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CustomProduct {
    #[serde(default)]
    pub name: Option<String>,
}

impl SessionObject {
    /// Whether the first displayed line item is the e-book add-on.
    /// Fails closed: any absent link in the path reads as `false`.
    pub fn bought_ebook(&self) -> bool {
        self.display_items
            .first()
            .and_then(|item| item.custom.as_ref())
            .and_then(|custom| custom.name.as_deref())
            == Some(EBOOK_NAME)
    }
}

/// Verify `payload` against `signature` and decode the event.
///
/// `signature` is the raw `Stripe-Signature` header value, of the form
/// `t=<unix ts>,v1=<hex hmac-sha256>`.
pub fn construct_event(payload: &str, signature: &str, secret: &str) -> Result<WebhookEvent> {
    verify_signature(
        payload,
        signature,
        secret,
        SIGNATURE_TOLERANCE_SECS,
        Utc::now().timestamp(),
    )?;

    let event: WebhookEvent =
        serde_json::from_str(payload).map_err(|e| PaymentError::WebhookParse(e.to_string()))?;
    tracing::debug!(event_type = %event.event_type, "Verified webhook event");
    Ok(event)
}

/// Sign `payload` the way Stripe does, returning a `Stripe-Signature`
/// header value. Intended for tests and local webhook replay.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

fn verify_signature(
    payload: &str,
    signature: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<()> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for element in signature.split(',') {
        let Some((key, value)) = element.trim().split_once('=') else {
            return Err(PaymentError::WebhookSignature(
                "Malformed Stripe-Signature header".into(),
            ));
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => candidates.push(value),
            // Unknown schemes (v0, future versions) are ignored
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::WebhookSignature("Missing timestamp in Stripe-Signature header".into())
    })?;
    if candidates.is_empty() {
        return Err(PaymentError::WebhookSignature(
            "No v1 signature in Stripe-Signature header".into(),
        ));
    }
    if (now - timestamp).abs() > tolerance_secs {
        return Err(PaymentError::WebhookSignature(
            "Signature timestamp outside of tolerance".into(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(format!("{timestamp}.{payload}").as_bytes());

    // verify_slice is constant-time; any matching candidate accepts
    for candidate in candidates {
        if let Ok(bytes) = hex::decode(candidate) {
            if mac.clone().verify_slice(&bytes).is_ok() {
                return Ok(());
            }
        }
    }

    Err(PaymentError::WebhookSignature(
        "No matching v1 signature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn completed_payload(display_items: &str) -> String {
        format!(
            r#"{{"type":"checkout.session.completed","data":{{"object":{{"customer":"cus_123","display_items":{display_items}}}}}}}"#
        )
    }

    #[test]
    fn signed_payload_verifies_and_decodes() {
        let payload = completed_payload("[]");
        let signature = sign_payload(SECRET, Utc::now().timestamp(), &payload);

        let event = construct_event(&payload, &signature, SECRET).unwrap();
        assert_eq!(event.event_type, CHECKOUT_SESSION_COMPLETED);
        assert_eq!(event.data.object.customer.as_deref(), Some("cus_123"));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let payload = completed_payload("[]");
        let signature = sign_payload(SECRET, Utc::now().timestamp(), &payload);

        let tampered = completed_payload(r#"[{"custom":{"name":"Pasha e-book"}}]"#);
        let err = construct_event(&tampered, &signature, SECRET).unwrap_err();
        assert!(matches!(err, PaymentError::WebhookSignature(_)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = completed_payload("[]");
        let signature = sign_payload("whsec_other", Utc::now().timestamp(), &payload);

        let err = construct_event(&payload, &signature, SECRET).unwrap_err();
        assert!(matches!(err, PaymentError::WebhookSignature(_)));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let payload = completed_payload("[]");
        let stale = Utc::now().timestamp() - SIGNATURE_TOLERANCE_SECS - 60;
        let signature = sign_payload(SECRET, stale, &payload);

        let err = verify_signature(
            &payload,
            &signature,
            SECRET,
            SIGNATURE_TOLERANCE_SECS,
            Utc::now().timestamp(),
        )
        .unwrap_err();
        assert!(matches!(err, PaymentError::WebhookSignature(_)));
    }

    #[test]
    fn malformed_header_is_rejected() {
        let payload = completed_payload("[]");
        for header in ["", "not a header", "t=123", "v1=abcd"] {
            let err = construct_event(&payload, header, SECRET).unwrap_err();
            assert!(matches!(err, PaymentError::WebhookSignature(_)), "{header:?}");
        }
    }

    #[test]
    fn extra_signature_schemes_are_ignored() {
        let payload = completed_payload("[]");
        let signature = sign_payload(SECRET, Utc::now().timestamp(), &payload);
        let header = format!("v0=deadbeef,{signature}");

        assert!(construct_event(&payload, &header, SECRET).is_ok());
    }

    #[test]
    fn unparseable_payload_fails_after_verification() {
        let payload = "not json";
        let signature = sign_payload(SECRET, Utc::now().timestamp(), payload);

        let err = construct_event(payload, &signature, SECRET).unwrap_err();
        assert!(matches!(err, PaymentError::WebhookParse(_)));
    }

    #[test]
    fn ebook_detected_by_first_item_name() {
        let payload = completed_payload(r#"[{"custom":{"name":"Pasha e-book"}}]"#);
        let event: WebhookEvent = serde_json::from_str(&payload).unwrap();
        assert!(event.data.object.bought_ebook());
    }

    #[test]
    fn other_product_is_not_an_ebook() {
        let payload = completed_payload(r#"[{"custom":{"name":"Pasha sticker"}}]"#);
        let event: WebhookEvent = serde_json::from_str(&payload).unwrap();
        assert!(!event.data.object.bought_ebook());
    }

    #[test]
    fn absent_path_fails_closed() {
        for display_items in ["[]", r#"[{}]"#, r#"[{"custom":{}}]"#, r#"[{"custom":null}]"#] {
            let payload = completed_payload(display_items);
            let event: WebhookEvent = serde_json::from_str(&payload).unwrap();
            assert!(!event.data.object.bought_ebook(), "{display_items}");
        }

        // No display_items field at all
        let payload = r#"{"type":"checkout.session.completed","data":{"object":{}}}"#;
        let event: WebhookEvent = serde_json::from_str(payload).unwrap();
        assert!(!event.data.object.bought_ebook());
        assert!(event.data.object.customer.is_none());
    }
}
