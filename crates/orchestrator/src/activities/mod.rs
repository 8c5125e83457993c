//! Activity adapters: the slow, fallible edges of the orchestration.
//!
//! The orchestrator never talks to a provider directly; it invokes the
//! activities registered here through the execution substrate, which
//! supplies retries and at-least-once delivery.

mod email;
mod notification;
mod payment;

use std::sync::Arc;

use domain::{Catalog, CartState, price_cart};
use runtime::{ActivityError, ActivityRegistry};
use thiserror::Error;

pub use email::{is_valid_email, normalize_email};
pub use notification::{EmailMessage, InMemoryMailClient, MailClient};
pub use payment::{ChargeReceipt, ChargeRequest, InMemoryPaymentClient, PaymentClient};

/// Activity name for the checkout charge.
pub const CHARGE_ACTIVITY: &str = "Charge";

/// Activity name for the abandonment notification.
pub const NOTIFY_ABANDONMENT_ACTIVITY: &str = "NotifyAbandonment";

/// Fixed currency for all charges; the system handles a single unit.
pub const CURRENCY: &str = "usd";

/// Demo payment source token. A non-demo deployment replaces this with
/// a payment method reference collected by a real tokenization flow.
pub const DEMO_SOURCE_TOKEN: &str = "tok_visa";

/// Subject line of the abandonment notification.
pub const ABANDONMENT_SUBJECT: &str = "You've abandoned your shopping cart!";

/// Errors at the provider boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider processed the request and said no.
    #[error("{provider} provider rejected the request: {detail}")]
    Rejected {
        provider: &'static str,
        detail: String,
    },

    /// The provider could not be reached.
    #[error("{provider} provider transport error: {detail}")]
    Transport {
        provider: &'static str,
        detail: String,
    },
}

/// Static configuration for the activity adapters.
#[derive(Debug, Clone)]
pub struct ActivityConfig {
    /// Sender address for outbound notifications.
    pub from_email: String,
    /// Fallback recipient substituted for invalid or empty addresses.
    pub fallback_email: String,
    /// Storefront link embedded in the abandonment notification.
    pub storefront_url: String,
}

/// The two terminal activities, bound to their provider clients and
/// the read-only catalog.
pub struct CartActivities<P, M> {
    payment: P,
    mail: M,
    catalog: Catalog,
    config: ActivityConfig,
}

impl<P: PaymentClient, M: MailClient> CartActivities<P, M> {
    /// Creates the activity adapters.
    pub fn new(payment: P, mail: M, catalog: Catalog, config: ActivityConfig) -> Self {
        Self {
            payment,
            mail,
            catalog,
            config,
        }
    }

    /// Prices the cart against the catalog and submits one charge.
    ///
    /// An invalid or missing recipient email falls back to the
    /// configured address rather than failing the charge. Provider
    /// errors are logged with their detail and returned for the
    /// substrate to retry.
    #[tracing::instrument(skip(self, cart), fields(items = cart.items.len()))]
    pub async fn charge(&self, cart: CartState) -> Result<ChargeReceipt, ActivityError> {
        let priced = price_cart(&self.catalog, &cart);
        if priced.unknown_products > 0 {
            tracing::warn!(
                unknown_products = priced.unknown_products,
                "cart references products missing from the catalog, priced as zero"
            );
        }

        let receipt_email = normalize_email(cart.email_or_empty(), &self.config.fallback_email);
        let request = ChargeRequest {
            amount: priced.total,
            currency: CURRENCY.to_string(),
            description: priced.description,
            source_token: DEMO_SOURCE_TOKEN.to_string(),
            receipt_email,
        };

        tracing::info!(amount = %request.amount, description = %request.description, "submitting charge");
        self.payment.create_charge(request).await.map_err(|e| {
            tracing::error!(error = %e, "charge failed");
            ActivityError::Provider(e.to_string())
        })
    }

    /// Sends the fixed-template abandonment notification.
    ///
    /// Applies the same email normalization as [`charge`](Self::charge).
    #[tracing::instrument(skip(self))]
    pub async fn notify_abandonment(&self, email: String) -> Result<(), ActivityError> {
        let to = normalize_email(&email, &self.config.fallback_email);
        let message = EmailMessage {
            from: self.config.from_email.clone(),
            to,
            subject: ABANDONMENT_SUBJECT.to_string(),
            html_body: format!(
                "<p>Go to <a href=\"{0}\">{0}</a> to finish checking out!</p>",
                self.config.storefront_url
            ),
        };

        tracing::info!(to = %message.to, "sending abandonment notification");
        self.mail.send(message).await.map_err(|e| {
            tracing::error!(error = %e, "abandonment notification failed");
            ActivityError::Provider(e.to_string())
        })
    }
}

/// Registers both cart activities with the substrate's registry under
/// their wire names.
pub fn register_cart_activities<P, M>(
    registry: &mut ActivityRegistry,
    activities: Arc<CartActivities<P, M>>,
) where
    P: PaymentClient + 'static,
    M: MailClient + 'static,
{
    let charge_activities = Arc::clone(&activities);
    registry.register(CHARGE_ACTIVITY, move |input| {
        let activities = Arc::clone(&charge_activities);
        async move {
            let cart: CartState = serde_json::from_value(input)?;
            let receipt = activities.charge(cart).await?;
            Ok(serde_json::to_value(receipt)?)
        }
    });

    registry.register(NOTIFY_ABANDONMENT_ACTIVITY, move |input| {
        let activities = Arc::clone(&activities);
        async move {
            let email: String = serde_json::from_value(input)?;
            activities.notify_abandonment(email).await?;
            Ok(serde_json::Value::Null)
        }
    });
}
