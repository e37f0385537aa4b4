//! Credit packages and checkout

use serde::{Deserialize, Serialize};
use tracing::info;

use biocloud_common::{Error, Offer, Result, Route};

use crate::client::ApiClient;
use crate::transport::HttpMethod;

#[derive(Deserialize)]
struct ProductList {
    #[serde(default)]
    products: Vec<Offer>,
}

#[derive(Serialize)]
struct CheckoutRequest<'a> {
    price_id: &'a str,
    price: &'a str,
}

#[derive(Deserialize)]
struct CheckoutResponse {
    url: String,
}

pub struct CreditsService {
    api: ApiClient,
}

impl CreditsService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Current offers; never cached
    pub async fn offers(&self) -> Result<Vec<Offer>> {
        let list: ProductList = self.api.get("/stripe/products", false).await?;
        Ok(list.products)
    }

    /// Start a payment and return the URL the user must visit
    pub async fn checkout(&self, price_id: &str, price: &str) -> Result<String> {
        if price_id.trim().is_empty() {
            return Err(biocloud_common::ValidationErrors::single("Select an offer to buy.").into());
        }
        let resp: CheckoutResponse = self
            .api
            .send_json(
                HttpMethod::Post,
                "/stripe/create-checkout-session",
                &CheckoutRequest { price_id, price },
                true,
            )
            .await?;
        if resp.url.is_empty() {
            return Err(Error::RequestFailed {
                status: 200,
                message: "Checkout session has no URL".to_string(),
            });
        }
        info!(price_id, "Checkout session created");
        Ok(resp.url)
    }
}

/// View to show after the payment provider sends the user back
pub fn payment_return_route(url: &str) -> Option<Route> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);
    let flag = |name: &str| {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .any(|(k, v)| k == name && v == "true")
    };

    if flag("success") {
        Some(Route::Success)
    } else if flag("canceled") {
        Some(Route::Cancelled)
    } else {
        None
    }
}
