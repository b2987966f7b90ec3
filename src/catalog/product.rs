use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Fulfillment platform a product or cart partition belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Printify,
    Printful,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Printify, Platform::Printful];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Printify => "printify",
            Platform::Printful => "printful",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ProductKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "printify" => Ok(Platform::Printify),
            "printful" => Ok(Platform::Printful),
            other => Err(ProductKeyError::UnknownPlatform(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProductKeyError {
    #[error("unknown platform prefix '{0}'")]
    UnknownPlatform(String),

    #[error("product id '{0}' is missing a native id")]
    MissingNativeId(String),
}

/// Composite product identity: `{platform}-{native_id}`.
///
/// The platform prefix is a closed set containing no hyphens, so splitting
/// on the first hyphen is unambiguous and native ids may themselves contain
/// hyphens. Display and parse round-trip exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProductKey {
    pub platform: Platform,
    pub native_id: String,
}

impl ProductKey {
    pub fn new(platform: Platform, native_id: impl Into<String>) -> Self {
        Self {
            platform,
            native_id: native_id.into(),
        }
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.platform, self.native_id)
    }
}

impl FromStr for ProductKey {
    type Err = ProductKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, native_id) = s
            .split_once('-')
            .ok_or_else(|| ProductKeyError::MissingNativeId(s.to_string()))?;
        if native_id.is_empty() {
            return Err(ProductKeyError::MissingNativeId(s.to_string()));
        }
        let platform = prefix.parse()?;
        Ok(Self {
            platform,
            native_id: native_id.to_string(),
        })
    }
}

impl Serialize for ProductKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProductKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductImage {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Descriptive facet carried on a variant when the vendor exposes a generic
/// option list (e.g. `Color` / `Size`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariantOption {
    pub name: String,
    pub value: String,
}

/// Product variant normalized across vendors; `price` is always in decimal
/// currency units regardless of the vendor's wire representation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnifiedVariant {
    pub id: String,
    pub title: String,
    pub price: Decimal,
    pub currency: String,
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<VariantOption>,
}

/// Product normalized across both vendor catalogs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnifiedProduct {
    pub id: ProductKey,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub images: Vec<ProductImage>,
    pub variants: Vec<UnifiedVariant>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub platform: Platform,
    /// Original vendor payload, retained for lossless fallback rendering
    #[serde(default)]
    pub original: serde_json::Value,
}

#[derive(Clone, Debug, Serialize)]
pub struct UnifiedProductList {
    pub items: Vec<UnifiedProduct>,
    /// Count of successfully fetched products before truncation
    pub total: usize,
    pub has_more: bool,
}
