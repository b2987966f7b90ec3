//! Catalog unifier: merges the two vendor catalogs into one product model.
//!
//! Products and variants are converted fresh on every fetch; there is no
//! caching layer. Vendor failures never escape the service: a failing
//! vendor contributes zero items to listings and a missing product resolves
//! to `None`.

pub mod product;
pub mod swatch;

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::clients::printful::{ComprehensiveProduct, ComprehensiveVariant, PrintfulProduct};
use crate::clients::printify::PrintifyProduct;
use crate::clients::{PrintfulClient, PrintifyClient, VendorError};

pub use product::{
    Platform, ProductImage, ProductKey, ProductKeyError, UnifiedProduct, UnifiedProductList,
    UnifiedVariant, VariantOption,
};

/// How many Printful store products are scanned when resolving a product id.
const PRINTFUL_LOOKUP_LIMIT: u32 = 100;

/// Converts Printify's integer minor units to decimal currency units.
/// Exact by construction: 2500 becomes 25.00.
pub(crate) fn minor_units_to_decimal(minor_units: i64) -> Decimal {
    Decimal::new(minor_units, 2)
}

/// Parses a Printful decimal price string ("45.00") into decimal units.
pub(crate) fn parse_retail_price(raw: &str) -> Result<Decimal, VendorError> {
    Decimal::from_str(raw.trim()).map_err(|err| VendorError::Decode {
        vendor: "printful",
        detail: format!("unparsable retail price '{}': {}", raw, err),
    })
}

fn convert_printify(product: PrintifyProduct) -> UnifiedProduct {
    let original = serde_json::to_value(&product).unwrap_or(serde_json::Value::Null);
    let images = product
        .images
        .iter()
        .map(|img| ProductImage {
            src: img.src.clone(),
            alt: Some(product.title.clone()),
        })
        .collect();
    let variants = product
        .variants
        .iter()
        .map(|variant| UnifiedVariant {
            id: variant.id.to_string(),
            title: variant.title.clone(),
            price: minor_units_to_decimal(variant.price),
            currency: variant.currency.clone(),
            is_enabled: variant.is_enabled,
            color: None,
            size: None,
            catalog_info: None,
            options: Vec::new(),
        })
        .collect();

    UnifiedProduct {
        id: ProductKey::new(Platform::Printify, product.id.clone()),
        name: product.title.clone(),
        description: if product.description.is_empty() {
            None
        } else {
            Some(product.description.clone())
        },
        images,
        variants,
        tags: product.tags.clone(),
        platform: Platform::Printify,
        original,
    }
}

/// Converts a Printful listing entry. The listing endpoint carries no
/// variants; they are populated lazily on detail fetch or cart add.
fn convert_printful_listing(product: &PrintfulProduct) -> UnifiedProduct {
    let native_id = product
        .published_to_stores
        .first()
        .map(|publication| publication.sync_product_id.to_string())
        .or_else(|| product.id.map(|id| id.to_string()))
        .unwrap_or_default();
    let original = serde_json::to_value(product).unwrap_or(serde_json::Value::Null);

    UnifiedProduct {
        id: ProductKey::new(Platform::Printful, native_id),
        name: product.name.clone(),
        description: product.description.clone(),
        images: product
            .thumbnail_url
            .iter()
            .map(|src| ProductImage {
                src: src.clone(),
                alt: Some(product.name.clone()),
            })
            .collect(),
        variants: Vec::new(),
        tags: product.tags.clone(),
        platform: Platform::Printful,
        original,
    }
}

/// Converts comprehensive variants, normalizing decimal-string prices.
pub(crate) fn unified_variants_from_comprehensive(
    variants: &[ComprehensiveVariant],
) -> Result<Vec<UnifiedVariant>, VendorError> {
    variants
        .iter()
        .map(|variant| {
            Ok(UnifiedVariant {
                id: variant.id.to_string(),
                title: variant.title.clone(),
                price: parse_retail_price(&variant.retail_price)?,
                currency: variant.currency.clone(),
                is_enabled: variant.is_enabled,
                color: variant.color.clone(),
                size: variant.size.clone(),
                catalog_info: variant
                    .catalog_info
                    .as_ref()
                    .and_then(|info| serde_json::to_value(info).ok()),
                options: variant
                    .options
                    .iter()
                    .filter_map(|opt| {
                        opt.value_str().map(|value| VariantOption {
                            name: opt.id.clone(),
                            value: value.to_string(),
                        })
                    })
                    .collect(),
            })
        })
        .collect()
}

fn convert_printful_comprehensive(
    product: ComprehensiveProduct,
) -> Result<UnifiedProduct, VendorError> {
    let variants = unified_variants_from_comprehensive(&product.variants)?;
    let images = if product.images.is_empty() {
        product
            .thumbnail_url
            .iter()
            .map(|src| ProductImage {
                src: src.clone(),
                alt: Some(product.name.clone()),
            })
            .collect()
    } else {
        product
            .images
            .iter()
            .map(|src| ProductImage {
                src: src.clone(),
                alt: Some(product.name.clone()),
            })
            .collect()
    };
    let original = serde_json::to_value(&product).unwrap_or(serde_json::Value::Null);

    Ok(UnifiedProduct {
        id: ProductKey::new(Platform::Printful, product.id.to_string()),
        name: product.name.clone(),
        description: product.description.clone(),
        images,
        variants,
        tags: product.tags.clone(),
        platform: Platform::Printful,
        original,
    })
}

/// Sorts merged products case-insensitively by name and truncates to `limit`.
/// `total` counts everything fetched; `has_more` flags truncation.
fn finalize_listing(mut products: Vec<UnifiedProduct>, limit: usize) -> UnifiedProductList {
    products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    let total = products.len();
    let has_more = total > limit;
    products.truncate(limit);
    UnifiedProductList {
        items: products,
        total,
        has_more,
    }
}

/// Unified read surface over both vendor catalogs.
///
/// Constructed once at startup with its vendor clients and shared by
/// reference; there is no hidden global instance.
#[derive(Clone, Debug)]
pub struct CatalogService {
    printify: PrintifyClient,
    printful: PrintfulClient,
}

impl CatalogService {
    pub fn new(printify: PrintifyClient, printful: PrintfulClient) -> Self {
        Self { printify, printful }
    }

    /// Lists up to `limit` products merged from both vendors.
    ///
    /// Both vendors are queried concurrently for half the limit each. A
    /// vendor failure is logged and that vendor contributes zero items;
    /// the call itself never fails.
    #[instrument(skip(self))]
    pub async fn list_unified(&self, limit: usize) -> UnifiedProductList {
        let per_vendor = limit.div_ceil(2) as u32;
        let (printify_result, printful_result) = tokio::join!(
            self.printify.list_products(1, per_vendor),
            self.printful.list_store_products(0, per_vendor),
        );

        let mut products = Vec::new();

        match printify_result {
            Ok(response) => {
                products.extend(response.data.into_iter().map(convert_printify));
            }
            Err(err) => warn!(%err, "printify listing failed; omitting its products"),
        }

        match printful_result {
            Ok(response) => {
                products.extend(response.data.iter().map(convert_printful_listing));
            }
            Err(err) => warn!(%err, "printful listing failed; omitting its products"),
        }

        finalize_listing(products, limit)
    }

    /// Fetches a single product by its composite key.
    ///
    /// Returns `None` both when nothing matches and when the owning vendor
    /// is unreachable; callers map that to a not-found outcome.
    #[instrument(skip(self))]
    pub async fn get_unified(&self, key: &ProductKey) -> Option<UnifiedProduct> {
        match key.platform {
            Platform::Printify => match self.printify.get_product(&key.native_id).await {
                Ok(product) => Some(convert_printify(product)),
                Err(err) => {
                    warn!(%err, id = %key, "printify product fetch failed");
                    None
                }
            },
            Platform::Printful => self.get_printful_product(key).await,
        }
    }

    /// Printful has no direct store-product lookup: the store listing is
    /// scanned for the entry whose publications contain the requested sync
    /// id, then the comprehensive fetch runs, falling back to the simpler
    /// listing + enriched-variants assembly with partial data.
    async fn get_printful_product(&self, key: &ProductKey) -> Option<UnifiedProduct> {
        let sync_id: u64 = match key.native_id.parse() {
            Ok(id) => id,
            Err(_) => {
                debug!(id = %key, "non-numeric printful native id");
                return None;
            }
        };

        let listing = match self
            .printful
            .list_store_products(0, PRINTFUL_LOOKUP_LIMIT)
            .await
        {
            Ok(listing) => listing,
            Err(err) => {
                warn!(%err, id = %key, "printful store listing failed");
                return None;
            }
        };

        let listed = listing.data.into_iter().find(|product| {
            product
                .published_to_stores
                .iter()
                .any(|publication| publication.sync_product_id == sync_id)
        })?;

        match self.printful.get_product_comprehensive(sync_id).await {
            Ok(comprehensive) => match convert_printful_comprehensive(comprehensive) {
                Ok(product) => return Some(product),
                Err(err) => {
                    warn!(%err, id = %key, "comprehensive payload conversion failed")
                }
            },
            Err(err) => warn!(%err, id = %key, "comprehensive fetch failed; assembling from listing"),
        }

        // Reduced-fidelity path: listing entry plus whatever enriched
        // variants are still reachable.
        let mut product = convert_printful_listing(&listed);
        match self.printful.get_variants_with_catalog_info(sync_id).await {
            Ok(enriched) => {
                for variant in enriched {
                    match parse_retail_price(&variant.variant.retail_price) {
                        Ok(price) => product.variants.push(UnifiedVariant {
                            id: variant.variant.id.to_string(),
                            title: variant.name,
                            price,
                            currency: variant.variant.currency.clone(),
                            is_enabled: true,
                            color: variant.color,
                            size: variant.size,
                            catalog_info: variant
                                .catalog_info
                                .as_ref()
                                .and_then(|info| serde_json::to_value(info).ok()),
                            options: variant
                                .variant
                                .options
                                .iter()
                                .filter_map(|opt| {
                                    opt.value_str().map(|value| VariantOption {
                                        name: opt.id.clone(),
                                        value: value.to_string(),
                                    })
                                })
                                .collect(),
                        }),
                        Err(err) => {
                            warn!(%err, variant_id = variant.variant.id, "skipping variant with unparsable price")
                        }
                    }
                }
            }
            Err(err) => warn!(%err, id = %key, "variant enrichment failed; returning product without variants"),
        }

        Some(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::printify::{PrintifyImage, PrintifyVariant};
    use rust_decimal_macros::dec;

    fn printify_product(id: &str, title: &str, price_minor: i64) -> PrintifyProduct {
        PrintifyProduct {
            id: id.to_string(),
            title: title.to_string(),
            description: "desc".to_string(),
            images: vec![PrintifyImage {
                src: "https://img/1.jpg".to_string(),
                variant_ids: vec![7],
            }],
            variants: vec![PrintifyVariant {
                id: 7,
                title: "Large - Black".to_string(),
                price: price_minor,
                currency: "USD".to_string(),
                is_enabled: true,
            }],
            tags: vec!["tee".to_string()],
        }
    }

    #[test]
    fn minor_units_convert_exactly() {
        assert_eq!(minor_units_to_decimal(2500), dec!(25.00));
        assert_eq!(minor_units_to_decimal(1), dec!(0.01));
        assert_eq!(minor_units_to_decimal(0), dec!(0.00));
    }

    #[test]
    fn retail_price_strings_parse_exactly() {
        assert_eq!(parse_retail_price("45.00").unwrap(), dec!(45.00));
        assert_eq!(parse_retail_price(" 29.50 ").unwrap(), dec!(29.50));
        assert!(parse_retail_price("n/a").is_err());
    }

    #[test]
    fn printify_conversion_normalizes_price_and_key() {
        let unified = convert_printify(printify_product("42", "Custom Tee", 2500));
        assert_eq!(unified.id.to_string(), "printify-42");
        assert_eq!(unified.platform, Platform::Printify);
        assert_eq!(unified.variants[0].price, dec!(25.00));
        assert_eq!(unified.images[0].alt.as_deref(), Some("Custom Tee"));
        assert!(unified.original.is_object());
    }

    #[test]
    fn printful_listing_key_prefers_store_publication() {
        use crate::clients::printful::StorePublication;
        let product = PrintfulProduct {
            id: Some(999),
            name: "Mug".to_string(),
            thumbnail_url: Some("https://img/mug.jpg".to_string()),
            description: None,
            tags: vec![],
            published_to_stores: vec![StorePublication {
                store_id: 1,
                sync_product_id: 321,
            }],
        };
        let unified = convert_printful_listing(&product);
        assert_eq!(unified.id.to_string(), "printful-321");
        assert!(unified.variants.is_empty());
        assert_eq!(unified.images.len(), 1);
    }

    #[test]
    fn listing_sorts_case_insensitively_and_truncates() {
        let products = vec![
            convert_printify(printify_product("1", "zebra print", 100)),
            convert_printify(printify_product("2", "Apple Tee", 100)),
            convert_printify(printify_product("3", "mango Mug", 100)),
        ];
        let listing = finalize_listing(products, 2);
        assert_eq!(listing.total, 3);
        assert!(listing.has_more);
        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.items[0].name, "Apple Tee");
        assert_eq!(listing.items[1].name, "mango Mug");
    }

    #[test]
    fn listing_under_limit_reports_no_more() {
        let products = vec![convert_printify(printify_product("1", "Tee", 100))];
        let listing = finalize_listing(products, 10);
        assert_eq!(listing.total, 1);
        assert!(!listing.has_more);
    }
}
