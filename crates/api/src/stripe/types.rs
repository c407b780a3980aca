//! Stripe REST objects, as far as the catalog and checkout need them.
//!
//! Expandable references (`default_price`, `product`) arrive either as a
//! bare id or as the full object depending on the `expand[]` parameters.

use serde::Deserialize;

use astrolabe_core::{PriceId, Product, ProductId};

/// A page of a Stripe list endpoint.
#[derive(Debug, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct StripeProduct {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub default_price: Option<Expandable<StripePrice>>,
}

#[derive(Debug, Deserialize)]
pub struct StripePrice {
    pub id: String,
    pub product: Option<Expandable<StripeProduct>>,
    pub unit_amount: Option<i64>,
    pub currency: Option<String>,
    pub recurring: Option<StripeRecurring>,
}

#[derive(Debug, Deserialize)]
pub struct StripeRecurring {
    pub interval: Option<String>,
    pub trial_period_days: Option<i64>,
}

/// An expandable reference: a bare id or the expanded object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

trait HasId {
    fn id(&self) -> &str;
}

impl HasId for StripeProduct {
    fn id(&self) -> &str {
        &self.id
    }
}

impl HasId for StripePrice {
    fn id(&self) -> &str {
        &self.id
    }
}

impl<T: HasId> Expandable<T> {
    fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Object(object) => object.id(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

impl From<StripeProduct> for Product {
    fn from(product: StripeProduct) -> Self {
        Self {
            default_price_id: product
                .default_price
                .as_ref()
                .map(|price| PriceId::new(price.id())),
            id: ProductId::new(product.id),
            name: product.name,
            description: product.description,
        }
    }
}

impl From<StripePrice> for astrolabe_core::Price {
    fn from(price: StripePrice) -> Self {
        let product_id = price
            .product
            .as_ref()
            .map_or_else(String::new, |product| product.id().to_string());
        let (interval, trial_period_days) = price
            .recurring
            .map_or((None, None), |r| (r.interval, r.trial_period_days));

        Self {
            id: PriceId::new(price.id),
            product_id: ProductId::new(product_id),
            unit_amount: price.unit_amount.unwrap_or(0),
            currency: price.currency.unwrap_or_else(|| "usd".to_string()),
            interval,
            trial_period_days,
        }
    }
}
