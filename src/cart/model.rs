use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Platform, ProductKey, UnifiedProduct};

/// Snapshot of the selected variant at add-time. Deliberately not
/// re-fetched later; price drift after adding is accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectedVariant {
    pub id: String,
    pub title: String,
    pub price: Decimal,
}

/// Composes the cart item identity from product key and optional variant.
pub fn cart_item_id(product_id: &ProductKey, variant_id: Option<&str>) -> String {
    match variant_id {
        Some(variant_id) => format!("{}-{}", product_id, variant_id),
        None => product_id.to_string(),
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub product: UnifiedProduct,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variant: Option<SelectedVariant>,
}

impl CartItem {
    /// Unit price: the selected variant's snapshot, else the product's
    /// first variant, else zero for variant-less partial data.
    pub fn unit_price(&self) -> Decimal {
        self.selected_variant
            .as_ref()
            .map(|variant| variant.price)
            .or_else(|| self.product.variants.first().map(|variant| variant.price))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }
}

/// One cart partition per fulfillment platform; each platform requires its
/// own checkout flow. `total` and `item_count` are derived fields.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlatformCart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub item_count: u32,
}

impl PlatformCart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn recompute(&mut self) {
        self.total = self.items.iter().map(CartItem::line_total).sum();
        self.item_count = self.items.iter().map(|item| item.quantity).sum();
    }
}

/// The whole cart: one partition per platform plus aggregate totals.
///
/// Derived fields are recomputed wholesale after every mutation rather than
/// patched incrementally, so a snapshot loaded with stale or missing totals
/// self-corrects on the next mutation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UnifiedCart {
    #[serde(default)]
    pub printify: PlatformCart,
    #[serde(default)]
    pub printful: PlatformCart,
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub total_value: Decimal,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UnifiedCart {
    pub fn partition(&self, platform: Platform) -> &PlatformCart {
        match platform {
            Platform::Printify => &self.printify,
            Platform::Printful => &self.printful,
        }
    }

    pub fn partition_mut(&mut self, platform: Platform) -> &mut PlatformCart {
        match platform {
            Platform::Printify => &mut self.printify,
            Platform::Printful => &mut self.printful,
        }
    }

    pub fn recompute_totals(&mut self) {
        self.printify.recompute();
        self.printful.recompute();
        self.total_items = self.printify.item_count + self.printful.item_count;
        self.total_value = self.printify.total + self.printful.total;
    }

    pub fn has_items(&self) -> bool {
        self.total_items > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ProductImage, UnifiedVariant};
    use rust_decimal_macros::dec;

    fn product(platform: Platform, native_id: &str, price: Decimal) -> UnifiedProduct {
        UnifiedProduct {
            id: ProductKey::new(platform, native_id),
            name: format!("Product {}", native_id),
            description: None,
            images: vec![ProductImage {
                src: "https://img/x.jpg".to_string(),
                alt: None,
            }],
            variants: vec![UnifiedVariant {
                id: "1".to_string(),
                title: "Default".to_string(),
                price,
                currency: "USD".to_string(),
                is_enabled: true,
                color: None,
                size: None,
                catalog_info: None,
                options: Vec::new(),
            }],
            tags: Vec::new(),
            platform,
            original: serde_json::Value::Null,
        }
    }

    fn item(platform: Platform, native_id: &str, price: Decimal, quantity: u32) -> CartItem {
        let product = product(platform, native_id, price);
        CartItem {
            id: cart_item_id(&product.id, None),
            product,
            quantity,
            selected_variant: None,
        }
    }

    #[test]
    fn item_id_includes_variant_when_selected() {
        let key = ProductKey::new(Platform::Printify, "42");
        assert_eq!(cart_item_id(&key, None), "printify-42");
        assert_eq!(cart_item_id(&key, Some("7")), "printify-42-7");
    }

    #[test]
    fn selected_variant_price_overrides_first_variant() {
        let mut cart_item = item(Platform::Printify, "42", dec!(25.00), 1);
        assert_eq!(cart_item.unit_price(), dec!(25.00));
        cart_item.selected_variant = Some(SelectedVariant {
            id: "7".to_string(),
            title: "Large".to_string(),
            price: dec!(30.00),
        });
        assert_eq!(cart_item.unit_price(), dec!(30.00));
        assert_eq!(cart_item.line_total(), dec!(30.00));
    }

    #[test]
    fn totals_sum_across_partitions() {
        let mut cart = UnifiedCart::default();
        cart.printify.items.push(item(Platform::Printify, "1", dec!(10.00), 2));
        cart.printful.items.push(item(Platform::Printful, "2", dec!(5.50), 3));
        cart.recompute_totals();

        assert_eq!(cart.printify.total, dec!(20.00));
        assert_eq!(cart.printify.item_count, 2);
        assert_eq!(cart.printful.total, dec!(16.50));
        assert_eq!(cart.printful.item_count, 3);
        assert_eq!(cart.total_items, 5);
        assert_eq!(cart.total_value, dec!(36.50));
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut cart = UnifiedCart::default();
        cart.printify.items.push(item(Platform::Printify, "1", dec!(25.00), 2));
        cart.recompute_totals();
        let first = (cart.total_items, cart.total_value);
        cart.recompute_totals();
        assert_eq!((cart.total_items, cart.total_value), first);
    }

    #[test]
    fn stale_derived_fields_are_corrected_by_recompute() {
        let mut cart = UnifiedCart::default();
        cart.printify.items.push(item(Platform::Printify, "1", dec!(10.00), 1));
        cart.printify.total = dec!(999.00);
        cart.total_value = dec!(999.00);
        cart.recompute_totals();
        assert_eq!(cart.printify.total, dec!(10.00));
        assert_eq!(cart.total_value, dec!(10.00));
    }

    #[test]
    fn snapshot_without_derived_fields_deserializes() {
        // Simulates a stored document from an older writer that lacked
        // derived fields entirely.
        let raw = r#"{"printify": {"items": []}}"#;
        let cart: UnifiedCart = serde_json::from_str(raw).unwrap();
        assert_eq!(cart.total_items, 0);
        assert_eq!(cart.total_value, Decimal::ZERO);
        assert!(cart.updated_at.is_none());
    }
}
