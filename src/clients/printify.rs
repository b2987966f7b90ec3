use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::instrument;

use super::VendorError;
use crate::config::PrintifyConfig;

const VENDOR: &str = "printify";

/// Product image as returned by the Printify shop API.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PrintifyImage {
    pub src: String,
    #[serde(default)]
    pub variant_ids: Vec<i64>,
}

/// Product variant; `price` is in integer minor units (cents).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PrintifyVariant {
    pub id: i64,
    pub title: String,
    pub price: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub is_enabled: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PrintifyProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<PrintifyImage>,
    #[serde(default)]
    pub variants: Vec<PrintifyVariant>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Paged listing envelope returned by `GET /shops/{id}/products.json`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PrintifyProductsResponse {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub data: Vec<PrintifyProduct>,
    #[serde(default)]
    pub last_page: u32,
    #[serde(default)]
    pub total: u64,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Client for the Printify shop API.
#[derive(Clone, Debug)]
pub struct PrintifyClient {
    client: Client,
    base_url: String,
    api_key: String,
    shop_id: String,
}

impl PrintifyClient {
    /// Build a client with a default reqwest client and the configured timeout.
    pub fn new(cfg: &PrintifyConfig) -> Result<Self, VendorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|source| VendorError::Transport {
                vendor: VENDOR,
                source,
            })?;
        Ok(Self::with_client(client, cfg))
    }

    /// Build a client from an existing reqwest client (useful for testing).
    pub fn with_client(client: Client, cfg: &PrintifyConfig) -> Self {
        Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            shop_id: cfg.shop_id.clone(),
        }
    }

    async fn request<T: DeserializeOwned>(&self, path: &str) -> Result<T, VendorError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|source| VendorError::Transport {
                vendor: VENDOR,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VendorError::Api {
                vendor: VENDOR,
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(|err| VendorError::Decode {
            vendor: VENDOR,
            detail: err.to_string(),
        })
    }

    /// Lists products in the configured shop, one page at a time.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<PrintifyProductsResponse, VendorError> {
        self.request(&format!(
            "/shops/{}/products.json?page={}&limit={}",
            self.shop_id, page, limit
        ))
        .await
    }

    /// Fetches a single product by its Printify id.
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: &str) -> Result<PrintifyProduct, VendorError> {
        self.request(&format!(
            "/shops/{}/products/{}.json",
            self.shop_id, product_id
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_envelope_tolerates_missing_fields() {
        let raw = r#"{"data": [{"id": "42", "title": "Mug"}]}"#;
        let parsed: PrintifyProductsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data[0].id, "42");
        assert!(parsed.data[0].variants.is_empty());
        assert_eq!(parsed.total, 0);
    }

    #[test]
    fn variant_price_is_minor_units() {
        let raw = r#"{"id": 7, "title": "Large - Black", "price": 2500, "is_enabled": true}"#;
        let parsed: PrintifyVariant = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.price, 2500);
        assert_eq!(parsed.currency, "USD");
    }
}
