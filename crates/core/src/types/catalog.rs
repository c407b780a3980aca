//! Billing catalog records exchanged between the API and the web app.
//!
//! These are read-only projections of payment-provider objects. Field names
//! are camelCase on the wire.

use serde::{Deserialize, Serialize};

use super::id::{PriceId, ProductId};
use super::money::Amount;

/// A purchasable product (plan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_price_id: Option<PriceId>,
}

/// A recurring price attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub id: PriceId,
    pub product_id: ProductId,
    pub unit_amount: i64,
    pub currency: String,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub trial_period_days: Option<i64>,
}

impl Price {
    #[must_use]
    pub const fn amount(&self) -> Amount {
        Amount::from_cents(self.unit_amount)
    }

    /// Whether this price belongs to the given product.
    #[must_use]
    pub fn is_for(&self, product: &Product) -> bool {
        self.product_id == product.id
    }
}

/// Body of a checkout-session creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub price_id: PriceId,
}

/// Response of a checkout-session creation request.
///
/// `url` is the hosted checkout page the browser should be sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionResponse {
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_decodes_camel_case_with_optional_fields_missing() {
        let price: Price = serde_json::from_str(
            r#"{"id":"pr1","productId":"p1","unitAmount":800,"currency":"usd"}"#,
        )
        .unwrap();
        assert_eq!(price.product_id.as_str(), "p1");
        assert_eq!(price.interval, None);
        assert_eq!(price.trial_period_days, None);
    }

    #[test]
    fn test_product_encodes_nulls_like_the_api() {
        let product = Product {
            id: ProductId::new("p1"),
            name: "Base".to_string(),
            description: None,
            default_price_id: Some(PriceId::new("pr1")),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["defaultPriceId"], "pr1");
        assert!(json["description"].is_null());
    }

    #[test]
    fn test_price_matches_product_by_id() {
        let product = Product {
            id: ProductId::new("p1"),
            name: "Base".to_string(),
            description: None,
            default_price_id: None,
        };
        let price: Price = serde_json::from_str(
            r#"{"id":"pr1","productId":"p1","unitAmount":800,"currency":"usd","interval":"month","trialPeriodDays":7}"#,
        )
        .unwrap();
        assert!(price.is_for(&product));
        assert_eq!(price.amount().to_string(), "$8");
    }

    #[test]
    fn test_checkout_request_wire_name() {
        let body = CheckoutSessionRequest {
            price_id: PriceId::new("pr1"),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"priceId":"pr1"}"#
        );
    }
}
