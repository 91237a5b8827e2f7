//! HTTP Handlers

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use pasha_payments::{CheckoutRequest, CHECKOUT_SESSION_COMPLETED};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutSessionRequest {
    /// Absent reads as `false`: a bare `{}` buys the subscription only
    #[serde(default, rename = "isBuyingSticker")]
    pub is_buying_sticker: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateCheckoutSessionResponse {
    #[serde(rename = "checkoutSessionId")]
    pub checkout_session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn internal_error(message: String) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: message }),
    )
}

/// The generic 400 the session-retrieval endpoint answers with,
/// regardless of what went wrong.
fn bad_request() -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Bad Request".into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a Stripe Checkout session for the subscription, optionally
/// with the e-book add-on
pub async fn create_checkout_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateCheckoutSessionRequest>, JsonRejection>,
) -> Result<Json<CreateCheckoutSessionResponse>, HandlerError> {
    let Json(payload) = payload.map_err(|e| {
        tracing::error!("Request decode failed: {e}");
        internal_error(e.to_string())
    })?;

    let request = CheckoutRequest {
        plan_id: state.config.subscription_plan_id.clone(),
        success_url: state.config.success_url(),
        cancel_url: state.config.cancel_url(),
        include_ebook: payload.is_buying_sticker,
    };

    let session = state
        .stripe
        .create_checkout_session(request)
        .await
        .map_err(|e| {
            tracing::error!("Checkout session create failed: {e}");
            internal_error(e.to_string())
        })?;

    Ok(Json(CreateCheckoutSessionResponse {
        checkout_session_id: session.id.to_string(),
    }))
}

/// Fetch a Checkout Session so the success page can show order details
pub async fn checkout_session(
    State(state): State<AppState>,
    Query(query): Query<CheckoutSessionQuery>,
) -> Result<Json<serde_json::Value>, HandlerError> {
    let Some(id) = query.session_id.filter(|id| !id.is_empty()) else {
        tracing::warn!("sessionId missing from checkout-session request");
        return Err(bad_request());
    };

    let session = state.stripe.retrieve_checkout_session(&id).await.map_err(|e| {
        tracing::error!(session_id = %id, "Checkout session fetch failed: {e}");
        bad_request()
    })?;

    Ok(Json(serde_json::json!({ "CheckoutSession": session })))
}

/// Hand the publishable key to the frontend
pub async fn public_key(State(state): State<AppState>) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        public_key: state.config.publishable_key.clone(),
    })
}

/// Stripe webhook endpoint
///
/// Everything after signature verification is acknowledged with a 200,
/// even on failure: Stripe takes a non-2xx as "retry this event", and
/// there is nothing here worth retrying.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, HandlerError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let event = state
        .stripe
        .construct_webhook_event(&body, signature)
        .map_err(|e| {
            tracing::warn!("Webhook rejected: {e}");
            (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() }))
        })?;

    if event.event_type != CHECKOUT_SESSION_COMPLETED {
        return Ok(StatusCode::OK);
    }

    let session = event.data.object;
    let Some(customer_id) = session.customer.as_deref() else {
        tracing::warn!("Completed checkout session carries no customer reference");
        return Ok(StatusCode::OK);
    };

    let customer = match state.stripe.retrieve_customer(customer_id).await {
        Ok(customer) => customer,
        Err(e) => {
            tracing::error!(customer_id = %customer_id, "Customer fetch failed: {e}");
            return Ok(StatusCode::OK);
        }
    };

    if session.bought_ebook() {
        let email = customer.email.as_deref().unwrap_or("<no email on file>");
        tracing::info!("🔔 Customer is subscribed and bought an e-book! Send the e-book to {email}");
    } else {
        tracing::info!("🔔 Customer is subscribed but did not buy an e-book.");
    }

    Ok(StatusCode::OK)
}
