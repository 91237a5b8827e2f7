//! Gateway Configuration
//!
//! Read once from the environment at startup and injected into the
//! router state, so handlers never touch ambient process state.

use anyhow::{Context, Result};

/// Immutable process-wide configuration. Every field is required; a
/// missing variable aborts startup.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Stripe secret API key (`sk_...`)
    pub secret_key: String,

    /// Stripe publishable key handed to the frontend (`pk_...`)
    pub publishable_key: String,

    /// Webhook signing secret (`whsec_...`)
    pub webhook_secret: String,

    /// Price/plan id of the Pasha subscription
    pub subscription_plan_id: String,

    /// Public origin used to build the success/cancel redirect URLs
    pub domain: String,

    /// Directory the static frontend is served from
    pub static_dir: String,
}

impl GatewayConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            secret_key: require("STRIPE_SECRET_KEY")?,
            publishable_key: require("STRIPE_PUBLISHABLE_KEY")?,
            webhook_secret: require("STRIPE_WEBHOOK_SECRET")?,
            subscription_plan_id: require("SUBSCRIPTION_PLAN_ID")?,
            domain: require("DOMAIN")?,
            static_dir: require("STATIC_DIR")?,
        })
    }

    /// Redirect target after a completed checkout. Stripe substitutes
    /// the `{CHECKOUT_SESSION_ID}` placeholder on redirect.
    pub fn success_url(&self) -> String {
        format!("{}/success.html?session_id={{CHECKOUT_SESSION_ID}}", self.domain)
    }

    /// Redirect target for an abandoned checkout
    pub fn cancel_url(&self) -> String {
        format!("{}/cancel.html", self.domain)
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}
