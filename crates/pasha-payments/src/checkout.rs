//! Stripe Checkout Integration
//!
//! Builds and retrieves hosted Checkout Sessions for the Pasha
//! subscription, optionally with the fixed-price e-book add-on.

use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionId, CheckoutSessionMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems, CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, CreateCheckoutSessionPaymentMethodTypes,
    Currency, Customer, CustomerId,
};

use crate::error::{PaymentError, Result};
use crate::webhook::{self, WebhookEvent};

/// Product name of the e-book add-on, as it appears on the checkout page
/// and in webhook line-item metadata.
pub const EBOOK_NAME: &str = "Pasha e-book";

/// Price of the e-book add-on, in USD cents.
pub const EBOOK_AMOUNT_CENTS: i64 = 300;

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
    webhook_secret: String,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str, webhook_secret: &str) -> Self {
        Self {
            client: Client::new(secret_key),
            webhook_secret: webhook_secret.to_string(),
        }
    }

    /// Get the webhook secret
    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    /// Create a Stripe Checkout session (Hosted approach)
    ///
    /// The session always carries the subscription line item; the e-book
    /// add-on is appended only when requested.
    pub async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<StripeCheckoutSession> {
        let mut params = CreateCheckoutSession::new();
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.mode = Some(CheckoutSessionMode::Subscription);
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.line_items = Some(line_items(&request.plan_id, request.include_ebook));

        StripeCheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))
    }

    /// Fetch an existing Checkout Session by id
    pub async fn retrieve_checkout_session(&self, id: &str) -> Result<StripeCheckoutSession> {
        let id: CheckoutSessionId = id
            .parse()
            .map_err(|e| PaymentError::InvalidId(format!("{e}")))?;

        StripeCheckoutSession::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))
    }

    /// Fetch a Customer by id
    pub async fn retrieve_customer(&self, id: &str) -> Result<Customer> {
        let id: CustomerId = id
            .parse()
            .map_err(|e| PaymentError::InvalidId(format!("{e}")))?;

        Customer::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))
    }

    /// Verify a webhook payload against its `Stripe-Signature` header and
    /// decode the fields the gateway consumes.
    pub fn construct_webhook_event(&self, payload: &str, signature: &str) -> Result<WebhookEvent> {
        webhook::construct_event(payload, signature, &self.webhook_secret)
    }

    /// Get the underlying Stripe client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Request to create a checkout session
#[derive(Clone, Debug)]
pub struct CheckoutRequest {
    /// Subscription plan (price) identifier
    pub plan_id: String,

    /// URL to redirect after successful payment
    pub success_url: String,

    /// URL to redirect if checkout is cancelled
    pub cancel_url: String,

    /// Whether to add the one-off e-book line item
    pub include_ebook: bool,
}

/// Line items for the session: the subscription plan, plus the e-book
/// add-on when requested.
fn line_items(plan_id: &str, include_ebook: bool) -> Vec<CreateCheckoutSessionLineItems> {
    let mut items = vec![CreateCheckoutSessionLineItems {
        price: Some(plan_id.to_string()),
        quantity: Some(1),
        ..Default::default()
    }];

    if include_ebook {
        items.push(CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: Currency::USD,
                unit_amount: Some(EBOOK_AMOUNT_CENTS),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: EBOOK_NAME.to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_only_without_add_on() {
        let items = line_items("plan_123", false);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price.as_deref(), Some("plan_123"));
        assert_eq!(items[0].quantity, Some(1));
        assert!(items[0].price_data.is_none());
    }

    #[test]
    fn add_on_appends_exactly_one_ebook_item() {
        let items = line_items("plan_123", true);
        assert_eq!(items.len(), 2);

        let ebook = items[1].price_data.as_ref().expect("e-book has price data");
        assert_eq!(items[1].quantity, Some(1));
        assert_eq!(ebook.currency, Currency::USD);
        assert_eq!(ebook.unit_amount, Some(300));
        assert_eq!(
            ebook.product_data.as_ref().map(|p| p.name.as_str()),
            Some(EBOOK_NAME)
        );
    }
}
