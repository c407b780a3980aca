//! Pricing page and checkout handoff.
//!
//! The page shows two fixed plans, "Base" and "Plus", priced from the
//! billing catalog when the catalog has them and from built-in defaults
//! otherwise. Subscribing posts the plan's price id; the handler asks the
//! billing API for a hosted checkout session and redirects the browser there.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{instrument, warn};

use astrolabe_core::{Amount, Price, PriceId, Product};

use crate::billing::BillingClient;
use crate::error::add_breadcrumb;
use crate::middleware::RequireAuth;
use crate::services::auth::AuthClient;
use crate::state::AppState;

/// Path of the pricing page.
pub const PRICING_PATH: &str = "/pricing";

// =============================================================================
// Plans
// =============================================================================

/// Built-in values for a plan card.
pub struct Plan {
    pub name: &'static str,
    pub default_amount: i64,
    pub features: &'static [&'static str],
}

pub const DEFAULT_INTERVAL: &str = "month";
pub const DEFAULT_TRIAL_DAYS: i64 = 7;

pub const BASE_PLAN: Plan = Plan {
    name: "Base",
    default_amount: 800,
    features: &[
        "Unlimited Usage",
        "Unlimited Workspace Members",
        "Email Support",
    ],
};

pub const PLUS_PLAN: Plan = Plan {
    name: "Plus",
    default_amount: 1200,
    features: &[
        "Everything in Base, and:",
        "Early Access to New Features",
        "24/7 Support + Slack Access",
    ],
};

/// View model for one pricing card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCard {
    pub name: String,
    pub amount: Amount,
    pub interval: String,
    pub trial_days: i64,
    pub features: Vec<&'static str>,
    pub price_id: Option<PriceId>,
}

impl PlanCard {
    /// Build a card for `plan` from the catalog.
    ///
    /// The product is matched by exact name and the price by product id.
    /// Missing, empty, or zero catalog values fall back to the plan's
    /// defaults.
    #[must_use]
    pub fn from_catalog(plan: &Plan, products: &[Product], prices: &[Price]) -> Self {
        let product = products.iter().find(|p| p.name == plan.name);
        let price = product.and_then(|product| prices.iter().find(|pr| pr.is_for(product)));

        let name = product
            .map(|p| p.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| plan.name.to_string());
        let amount = price
            .map(Price::amount)
            .filter(|a| !a.is_zero())
            .unwrap_or_else(|| Amount::from_cents(plan.default_amount));
        let interval = price
            .and_then(|p| p.interval.clone())
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| DEFAULT_INTERVAL.to_string());
        let trial_days = price
            .and_then(|p| p.trial_period_days)
            .filter(|d| *d != 0)
            .unwrap_or(DEFAULT_TRIAL_DAYS);
        let price_id = price.map(|p| p.id.clone()).filter(|id| !id.is_empty());

        Self {
            name,
            amount,
            interval,
            trial_days,
            features: plan.features.to_vec(),
            price_id,
        }
    }

    /// Value for the hidden `price_id` field.
    #[must_use]
    pub fn price_id_value(&self) -> &str {
        self.price_id.as_ref().map_or("", PriceId::as_str)
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.price_id.is_none()
    }

    #[must_use]
    pub const fn button_label(&self) -> &'static str {
        if self.price_id.is_some() {
            "Subscribe"
        } else {
            "Unavailable"
        }
    }
}

/// Cards in display order.
#[must_use]
pub fn build_cards(products: &[Product], prices: &[Price]) -> Vec<PlanCard> {
    [&BASE_PLAN, &PLUS_PLAN]
        .into_iter()
        .map(|plan| PlanCard::from_catalog(plan, products, prices))
        .collect()
}

// =============================================================================
// Pricing page
// =============================================================================

/// Pricing page template.
#[derive(Template, WebTemplate)]
#[template(path = "pricing.html")]
pub struct PricingTemplate {
    pub cards: Vec<PlanCard>,
}

/// Display the pricing page.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, _auth: RequireAuth) -> impl IntoResponse {
    let (products, prices) = state.billing().catalog().await;
    PricingTemplate {
        cards: build_cards(&products, &prices),
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Checkout form body.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub price_id: String,
}

/// Where the browser goes after a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Hosted checkout page.
    Redirect(String),
    /// Back to the pricing page with the card re-enabled.
    Reset,
}

/// Ask the billing API for a checkout session.
///
/// Any failure resets the page without telling the visitor; the failure is
/// logged.
pub async fn start_checkout(
    billing: &BillingClient,
    auth: Option<&AuthClient>,
    price_id: &str,
) -> CheckoutOutcome {
    if price_id.is_empty() {
        return CheckoutOutcome::Reset;
    }

    let token = match auth {
        Some(client) => match client.get_session().await {
            Ok(session) => session.map(|s| s.access_token),
            Err(e) => {
                warn!(error = %e, "Could not read session for checkout, continuing without token");
                None
            }
        },
        None => None,
    };

    let price_id = PriceId::new(price_id);
    match billing
        .create_checkout_session(&price_id, token.as_deref())
        .await
    {
        Ok(url) => {
            add_breadcrumb("checkout", "Checkout session created", &[("price_id", price_id.as_str())]);
            CheckoutOutcome::Redirect(url)
        }
        Err(e) => {
            warn!(error = %e, price_id = %price_id, "Checkout session creation failed");
            CheckoutOutcome::Reset
        }
    }
}

/// Handle a subscribe button press.
#[instrument(skip(state, auth, form))]
pub async fn checkout(
    State(state): State<AppState>,
    auth: RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Response {
    match start_checkout(state.billing(), auth.provider.client(), &form.price_id).await {
        CheckoutOutcome::Redirect(url) => Redirect::to(&url).into_response(),
        CheckoutOutcome::Reset => Redirect::to(PRICING_PATH).into_response(),
    }
}
