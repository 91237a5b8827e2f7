//! # pasha-payments
//!
//! Stripe integration for the Pasha checkout gateway.
//!
//! ## Flow: Stripe Checkout (Hosted)
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Your Site  │────▶│  Stripe Hosted  │────▶│  Your Site  │
//! │  (pricing)  │     │  Checkout Page  │     │  (success)  │
//! └─────────────┘     └─────────────────┘     └─────────────┘
//! ```
//!
//! The browser never touches card data: the gateway creates a Checkout
//! Session for a subscription (optionally with the e-book add-on), the
//! frontend redirects to Stripe's hosted page with the session id, and
//! Stripe reports the outcome back asynchronously through a signed webhook.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pasha_payments::{CheckoutRequest, StripeClient};
//!
//! let client = StripeClient::new("sk_test_xxx", "whsec_xxx");
//!
//! let session = client.create_checkout_session(CheckoutRequest {
//!     plan_id: "plan_xxx".into(),
//!     success_url: "https://yoursite.com/success.html?session_id={CHECKOUT_SESSION_ID}".into(),
//!     cancel_url: "https://yoursite.com/cancel.html".into(),
//!     include_ebook: true,
//! }).await?;
//!
//! // Hand session.id to the frontend for the redirect.
//! ```

mod checkout;
mod error;
mod webhook;

pub use checkout::{CheckoutRequest, StripeClient, EBOOK_AMOUNT_CENTS, EBOOK_NAME};
pub use error::{PaymentError, Result};
pub use webhook::{
    construct_event, sign_payload, CustomProduct, DisplayItem, EventData, SessionObject,
    WebhookEvent, CHECKOUT_SESSION_COMPLETED,
};
