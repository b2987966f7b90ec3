use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::VendorError;
use crate::config::PrintfulConfig;

const VENDOR: &str = "printful";

/// How many catalog entries are scanned when resolving store products.
/// Printful's catalog listing is not scoped per store, so the client fetches
/// a bounded slice and filters by store publication locally.
const CATALOG_SCAN_LIMIT: u32 = 100;

/// Maximum number of preview images assembled onto a comprehensive product.
const MAX_PREVIEW_IMAGES: usize = 10;

// ---------------------------------------------------------------------------
// v2 catalog API payloads
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StorePublication {
    pub store_id: u64,
    pub sync_product_id: u64,
}

/// Product as returned by the v2 catalog listing.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PrintfulProduct {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published_to_stores: Vec<StorePublication>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Paging {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PrintfulProductsResponse {
    #[serde(default)]
    pub data: Vec<PrintfulProduct>,
    #[serde(default)]
    pub paging: Paging,
}

/// Accepted shapes for a single-product v2 response. The API has shipped
/// `{"result": ...}`, `{"data": ...}` and bare-object variants; each one is
/// an explicit decoder case rather than a probed field chain.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductEnvelope {
    Result { result: PrintfulProduct },
    Data { data: PrintfulProduct },
    Bare(PrintfulProduct),
}

impl ProductEnvelope {
    fn into_product(self) -> PrintfulProduct {
        match self {
            ProductEnvelope::Result { result } => result,
            ProductEnvelope::Data { data } => data,
            ProductEnvelope::Bare(product) => product,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ResultEnvelope<T> {
    result: T,
}

// ---------------------------------------------------------------------------
// v1 sync API payloads
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SyncProduct {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VariantOption {
    pub id: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl VariantOption {
    /// Option values are usually strings but arrive as arrays for some
    /// catalog products; only plain strings are usable as facets.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VariantFile {
    #[serde(default, rename = "type")]
    pub file_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub visible: bool,
}

/// Store-level variant shared by the v1 sync detail and the v2 variants
/// listing; `retail_price` is a decimal string.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SyncVariant {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub retail_price: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub synced: bool,
    #[serde(default)]
    pub variant_id: Option<u64>,
    #[serde(default)]
    pub catalog_variant_id: Option<u64>,
    #[serde(default)]
    pub files: Vec<VariantFile>,
    #[serde(default)]
    pub options: Vec<VariantOption>,
}

impl SyncVariant {
    fn option_value(&self, key: &str) -> Option<String> {
        self.options
            .iter()
            .find(|opt| opt.id == key)
            .and_then(|opt| opt.value_str())
            .map(str::to_string)
    }

    fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Variant {}", self.id)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SyncProductDetail {
    pub sync_product: SyncProduct,
    #[serde(default)]
    pub sync_variants: Vec<SyncVariant>,
}

/// Catalog-level variant metadata (color, size) keyed by catalog variant id.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CatalogVariant {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_currency() -> String {
    "USD".to_string()
}

// ---------------------------------------------------------------------------
// Joined payloads produced by this client
// ---------------------------------------------------------------------------

/// Sync variant joined with its catalog metadata. Catalog lookup failure
/// degrades the variant to `color: None, size: None` rather than failing.
#[derive(Clone, Debug, Serialize)]
pub struct EnrichedVariant {
    pub variant: SyncVariant,
    pub catalog_info: Option<CatalogVariant>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ComprehensiveVariant {
    pub id: u64,
    pub title: String,
    pub retail_price: String,
    pub currency: String,
    pub is_enabled: bool,
    pub color: Option<String>,
    pub size: Option<String>,
    pub catalog_info: Option<CatalogVariant>,
    pub files: Vec<VariantFile>,
    pub options: Vec<VariantOption>,
}

/// Product payload joining the v1 sync detail (rich variants, files,
/// options) with the v2 catalog entry (description, tags). Neither endpoint
/// alone carries the full variant metadata.
#[derive(Clone, Debug, Serialize)]
pub struct ComprehensiveProduct {
    pub id: u64,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub variants: Vec<ComprehensiveVariant>,
    /// Preview image URLs collected from variant files
    pub images: Vec<String>,
}

/// Client for the Printful v1 (sync) and v2 (catalog) APIs.
#[derive(Clone, Debug)]
pub struct PrintfulClient {
    client: Client,
    base_url_v1: String,
    base_url_v2: String,
    api_key: String,
    store_id: u64,
}

impl PrintfulClient {
    /// Build a client with a default reqwest client and the configured timeout.
    pub fn new(cfg: &PrintfulConfig) -> Result<Self, VendorError> {
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
    pub fn with_client(client: Client, cfg: &PrintfulConfig) -> Self {
        Self {
            client,
            base_url_v1: cfg.base_url_v1.trim_end_matches('/').to_string(),
            base_url_v2: cfg.base_url_v2.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            store_id: cfg.store_id,
        }
    }

    async fn request_at<T: DeserializeOwned>(
        &self,
        base_url: &str,
        path: &str,
    ) -> Result<T, VendorError> {
        let url = format!("{}{}", base_url, path);
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

    async fn request_v1<T: DeserializeOwned>(&self, path: &str) -> Result<T, VendorError> {
        self.request_at(&self.base_url_v1, path).await
    }

    async fn request_v2<T: DeserializeOwned>(&self, path: &str) -> Result<T, VendorError> {
        self.request_at(&self.base_url_v2, path).await
    }

    /// Lists the raw v2 catalog slice, unscoped by store.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<PrintfulProductsResponse, VendorError> {
        self.request_v2(&format!("/products?offset={}&limit={}", offset, limit))
            .await
    }

    /// Lists products published to the configured store.
    ///
    /// The catalog listing cannot be filtered server-side, so a bounded
    /// slice is fetched and filtered by `published_to_stores` locally; the
    /// returned paging reflects the filtered set.
    #[instrument(skip(self))]
    pub async fn list_store_products(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<PrintfulProductsResponse, VendorError> {
        let all = self.list_products(0, CATALOG_SCAN_LIMIT).await?;
        let store_products: Vec<PrintfulProduct> = all
            .data
            .into_iter()
            .filter(|product| {
                product
                    .published_to_stores
                    .iter()
                    .any(|publication| publication.store_id == self.store_id)
            })
            .collect();

        let total = store_products.len() as u64;
        let data: Vec<PrintfulProduct> = store_products
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(PrintfulProductsResponse {
            data,
            paging: Paging {
                total,
                offset,
                limit,
            },
        })
    }

    /// Fetches a single product from the v2 catalog by its sync product id.
    #[instrument(skip(self))]
    pub async fn get_product(&self, sync_id: u64) -> Result<PrintfulProduct, VendorError> {
        let envelope: ProductEnvelope = self.request_v2(&format!("/products/sp{}", sync_id)).await?;
        Ok(envelope.into_product())
    }

    /// Fetches the v1 sync product detail carrying full variant metadata.
    #[instrument(skip(self))]
    pub async fn get_product_v1(&self, sync_id: u64) -> Result<SyncProductDetail, VendorError> {
        self.request_v1(&format!("/sync/products/{}", sync_id)).await
    }

    /// Lists store variants of a sync product from the v2 API.
    #[instrument(skip(self))]
    pub async fn get_variants(&self, sync_id: u64) -> Result<Vec<SyncVariant>, VendorError> {
        let envelope: DataEnvelope<Vec<SyncVariant>> = self
            .request_v2(&format!("/products/sp{}/variants", sync_id))
            .await?;
        Ok(envelope.data)
    }

    /// Looks up catalog-level variant metadata, trying the primary endpoint
    /// and then the alternate spelling. Both failing yields `None`.
    #[instrument(skip(self))]
    pub async fn get_catalog_variant(&self, catalog_variant_id: u64) -> Option<CatalogVariant> {
        let paths = [
            format!("/catalog/variants/{}", catalog_variant_id),
            format!("/catalog/variant/{}", catalog_variant_id),
        ];
        for path in paths {
            match self
                .request_v2::<ResultEnvelope<CatalogVariant>>(&path)
                .await
            {
                Ok(envelope) => return Some(envelope.result),
                Err(err) => debug!(%err, catalog_variant_id, "catalog variant lookup failed"),
            }
        }
        None
    }

    /// Joins store variants with catalog color/size metadata.
    ///
    /// A failed catalog lookup degrades that variant to bare sync data; only
    /// the initial variants listing failing propagates an error.
    #[instrument(skip(self))]
    pub async fn get_variants_with_catalog_info(
        &self,
        sync_id: u64,
    ) -> Result<Vec<EnrichedVariant>, VendorError> {
        let variants = self.get_variants(sync_id).await?;

        let lookups = variants.iter().map(|variant| async {
            match variant.catalog_variant_id.or(variant.variant_id) {
                Some(catalog_id) => self.get_catalog_variant(catalog_id).await,
                None => None,
            }
        });
        let infos = futures::future::join_all(lookups).await;

        Ok(variants
            .into_iter()
            .zip(infos)
            .map(|(variant, catalog_info)| {
                if catalog_info.is_none() {
                    warn!(
                        variant_id = variant.id,
                        "no catalog info for variant; color/size unavailable"
                    );
                }
                let color = catalog_info.as_ref().and_then(|info| info.color.clone());
                let size = catalog_info.as_ref().and_then(|info| info.size.clone());
                let name = catalog_info
                    .as_ref()
                    .and_then(|info| info.name.clone())
                    .unwrap_or_else(|| variant.display_name());
                EnrichedVariant {
                    name,
                    color,
                    size,
                    catalog_info,
                    variant,
                }
            })
            .collect())
    }

    /// Fetches a product joining the v1 and v2 APIs into one payload.
    ///
    /// The v1 sync detail is the richer source (variant files, options,
    /// per-variant facets); on its failure the client falls back to the v2
    /// catalog entry plus catalog-enriched variants, with reduced fidelity.
    #[instrument(skip(self))]
    pub async fn get_product_comprehensive(
        &self,
        sync_id: u64,
    ) -> Result<ComprehensiveProduct, VendorError> {
        match self.get_product_v1(sync_id).await {
            Ok(detail) => {
                // The v2 entry only adds description/tags; tolerate failure.
                let v2 = match self.get_product(sync_id).await {
                    Ok(product) => Some(product),
                    Err(err) => {
                        warn!(%err, sync_id, "v2 catalog lookup failed; using sync data only");
                        None
                    }
                };
                Ok(Self::combine(sync_id, detail, v2))
            }
            Err(err) => {
                warn!(%err, sync_id, "sync detail fetch failed; falling back to catalog assembly");
                let product = self.get_product(sync_id).await?;
                let variants = self.get_variants_with_catalog_info(sync_id).await?;
                Ok(Self::assemble_from_catalog(sync_id, product, variants))
            }
        }
    }

    fn combine(
        sync_id: u64,
        detail: SyncProductDetail,
        v2: Option<PrintfulProduct>,
    ) -> ComprehensiveProduct {
        let name = v2
            .as_ref()
            .map(|p| p.name.clone())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| detail.sync_product.name.clone());
        let thumbnail_url = v2
            .as_ref()
            .and_then(|p| p.thumbnail_url.clone())
            .or_else(|| detail.sync_product.thumbnail.clone());

        let images: Vec<String> = detail
            .sync_variants
            .iter()
            .flat_map(|variant| variant.files.iter())
            .filter(|file| file.visible && file.file_type == "preview")
            .map(|file| file.url.clone())
            .take(MAX_PREVIEW_IMAGES)
            .collect();

        let variants = detail
            .sync_variants
            .into_iter()
            .map(|variant| ComprehensiveVariant {
                id: variant.id,
                title: variant.display_name(),
                retail_price: variant.retail_price.clone(),
                currency: variant.currency.clone(),
                is_enabled: variant.synced,
                color: variant.option_value("Color"),
                size: variant.option_value("Size"),
                catalog_info: None,
                files: variant.files.clone(),
                options: variant.options.clone(),
            })
            .collect();

        ComprehensiveProduct {
            // Keyed by sync id so detail payloads match the listing identity.
            id: sync_id,
            name,
            thumbnail_url,
            description: v2.as_ref().and_then(|p| p.description.clone()),
            tags: v2.map(|p| p.tags).unwrap_or_default(),
            variants,
            images,
        }
    }

    fn assemble_from_catalog(
        sync_id: u64,
        product: PrintfulProduct,
        variants: Vec<EnrichedVariant>,
    ) -> ComprehensiveProduct {
        let images = product
            .thumbnail_url
            .clone()
            .into_iter()
            .collect::<Vec<String>>();

        let variants = variants
            .into_iter()
            .map(|enriched| ComprehensiveVariant {
                id: enriched.variant.id,
                title: enriched.name,
                retail_price: enriched.variant.retail_price.clone(),
                currency: enriched.variant.currency.clone(),
                is_enabled: true,
                color: enriched.color,
                size: enriched.size,
                catalog_info: enriched.catalog_info,
                files: enriched.variant.files.clone(),
                options: enriched.variant.options.clone(),
            })
            .collect();

        ComprehensiveProduct {
            id: sync_id,
            name: product.name,
            thumbnail_url: product.thumbnail_url,
            description: product.description,
            tags: product.tags,
            variants,
            images,
        }
    }
}
