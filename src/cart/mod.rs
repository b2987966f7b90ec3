//! Platform-partitioned cart store.
//!
//! State lives in memory for the session and is snapshotted to durable
//! storage after every mutation; a failed persist is logged and the
//! in-memory cart stays authoritative. Mutations are serialized behind a
//! single lock, so derived totals are always consistent with item state.

pub mod model;
pub mod storage;

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::catalog::{self, Platform, ProductKey, UnifiedProduct};
use crate::clients::PrintfulClient;
use crate::errors::ServiceError;

pub use model::{cart_item_id, CartItem, PlatformCart, SelectedVariant, UnifiedCart};
pub use storage::{CartStorage, StorageError, CART_SCHEMA_VERSION};

/// Cart management service.
///
/// Constructed once at startup and shared by reference. Holds a Printful
/// client because products taken from that vendor's listing arrive without
/// variants and get a best-effort enrichment fetch on add.
pub struct CartService {
    cart: RwLock<UnifiedCart>,
    storage: CartStorage,
    printful: PrintfulClient,
}

impl CartService {
    /// Builds the service, reloading any persisted cart snapshot.
    pub fn new(storage: CartStorage, printful: PrintfulClient) -> Self {
        let cart = storage.load();
        if cart.has_items() {
            info!(total_items = cart.total_items, "restored persisted cart");
        }
        Self {
            cart: RwLock::new(cart),
            storage,
            printful,
        }
    }

    /// Adds a product to its platform partition, merging quantity into an
    /// existing entry with the same identity.
    ///
    /// `selected_variant` is snapshotted as-is; its price is not re-fetched
    /// on later reads. Printful products without pre-loaded variants get an
    /// enrichment fetch first; enrichment failure is logged and the add
    /// proceeds with whatever data is available.
    #[instrument(skip(self, product, selected_variant), fields(product_id = %product.id))]
    pub async fn add_item(
        &self,
        product: UnifiedProduct,
        quantity: u32,
        selected_variant: Option<SelectedVariant>,
    ) -> Result<UnifiedCart, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }

        let product = self.ensure_variants(product).await;
        let item_id = cart_item_id(
            &product.id,
            selected_variant.as_ref().map(|variant| variant.id.as_str()),
        );
        let platform = product.platform;

        let mut cart = self.cart.write().await;
        let partition = cart.partition_mut(platform);
        if let Some(existing) = partition.items.iter_mut().find(|item| item.id == item_id) {
            existing.quantity += quantity;
        } else {
            partition.items.push(CartItem {
                id: item_id,
                product,
                quantity,
                selected_variant,
            });
        }
        self.finish_mutation(&mut cart);
        Ok(cart.clone())
    }

    /// Removes the matching entry; a no-op when absent.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(
        &self,
        product_id: &ProductKey,
        variant_id: Option<&str>,
    ) -> UnifiedCart {
        let item_id = cart_item_id(product_id, variant_id);
        let mut cart = self.cart.write().await;
        cart.partition_mut(product_id.platform)
            .items
            .retain(|item| item.id != item_id);
        self.finish_mutation(&mut cart);
        cart.clone()
    }

    /// Sets the quantity of the matching entry. A quantity of zero is
    /// equivalent to removal; an absent entry is a no-op.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductKey,
        quantity: u32,
        variant_id: Option<&str>,
    ) -> UnifiedCart {
        if quantity == 0 {
            return self.remove_item(product_id, variant_id).await;
        }

        let item_id = cart_item_id(product_id, variant_id);
        let mut cart = self.cart.write().await;
        if let Some(item) = cart
            .partition_mut(product_id.platform)
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
        {
            item.quantity = quantity;
            self.finish_mutation(&mut cart);
        }
        cart.clone()
    }

    /// Resets the whole cart to empty.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> UnifiedCart {
        let mut cart = self.cart.write().await;
        *cart = UnifiedCart::default();
        self.finish_mutation(&mut cart);
        cart.clone()
    }

    /// Resets one platform partition to empty.
    #[instrument(skip(self))]
    pub async fn clear_platform(&self, platform: Platform) -> UnifiedCart {
        let mut cart = self.cart.write().await;
        *cart.partition_mut(platform) = PlatformCart::default();
        self.finish_mutation(&mut cart);
        cart.clone()
    }

    pub async fn cart(&self) -> UnifiedCart {
        self.cart.read().await.clone()
    }

    pub async fn platform_cart(&self, platform: Platform) -> PlatformCart {
        self.cart.read().await.partition(platform).clone()
    }

    pub async fn has_items(&self) -> bool {
        self.cart.read().await.has_items()
    }

    pub async fn has_platform_items(&self, platform: Platform) -> bool {
        !self.cart.read().await.partition(platform).is_empty()
    }

    /// Checkout hand-off URL per non-empty partition. Checkout itself is
    /// delegated entirely to the vendor platforms.
    pub async fn checkout_urls(&self) -> BTreeMap<Platform, String> {
        let cart = self.cart.read().await;
        Platform::ALL
            .into_iter()
            .filter(|platform| !cart.partition(*platform).is_empty())
            .map(|platform| (platform, format!("/checkout/{}", platform)))
            .collect()
    }

    /// Recomputes derived totals and persists the snapshot. Persistence
    /// failure keeps the in-memory cart authoritative for the session.
    fn finish_mutation(&self, cart: &mut UnifiedCart) {
        cart.recompute_totals();
        cart.updated_at = Some(Utc::now());
        if let Err(err) = self.storage.save(cart) {
            warn!(%err, "failed to persist cart snapshot; in-memory cart remains authoritative");
        }
    }

    /// Best-effort variant enrichment for Printful products whose listing
    /// entry carried no variants.
    async fn ensure_variants(&self, product: UnifiedProduct) -> UnifiedProduct {
        if product.platform != Platform::Printful || !product.variants.is_empty() {
            return product;
        }
        let Ok(sync_id) = product.id.native_id.parse::<u64>() else {
            return product;
        };

        match self.printful.get_product_comprehensive(sync_id).await {
            Ok(comprehensive) => {
                match catalog::unified_variants_from_comprehensive(&comprehensive.variants) {
                    Ok(variants) => {
                        let mut product = product;
                        product.variants = variants;
                        product
                    }
                    Err(err) => {
                        warn!(%err, product_id = %product.id, "variant conversion failed; adding item with partial data");
                        product
                    }
                }
            }
            Err(err) => {
                warn!(%err, product_id = %product.id, "variant enrichment failed; adding item with partial data");
                product
            }
        }
    }
}
