//! Application State

use std::sync::Arc;

use pasha_payments::StripeClient;

use crate::config::GatewayConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Immutable gateway configuration
    pub config: Arc<GatewayConfig>,

    /// Stripe client
    pub stripe: Arc<StripeClient>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let stripe = Arc::new(StripeClient::new(
            &config.secret_key,
            &config.webhook_secret,
        ));

        Self {
            config: Arc::new(config),
            stripe,
        }
    }
}
