//! Product keys and stock records.
//!
//! A product key names one sellable stock line: a category plus a variant,
//! where the variant is a package code or a duration (`tv:30d`,
//! `eload:smart-100`, `invitation:reseller`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::MemberRole;
use crate::code::CodeFormat;

/// Maximum length of a product variant.
pub const MAX_VARIANT_LEN: usize = 64;

/// Family of digital goods sold through the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    /// Invitation code granting a network role on registration.
    Invitation,
    /// Activation package code.
    Package,
    /// Registration code for a new member account.
    Registration,
    /// Telco e-load voucher.
    Eload,
    /// GSAT satellite TV voucher.
    Gsat,
    /// Cable/IPTV subscription voucher.
    Tv,
    /// `WiFi` access voucher.
    Wifi,
}

impl ProductCategory {
    /// All categories, in key order.
    pub const ALL: [Self; 7] = [
        Self::Invitation,
        Self::Package,
        Self::Registration,
        Self::Eload,
        Self::Gsat,
        Self::Tv,
        Self::Wifi,
    ];

    /// The lowercase name used in product keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Invitation => "invitation",
            Self::Package => "package",
            Self::Registration => "registration",
            Self::Eload => "eload",
            Self::Gsat => "gsat",
            Self::Tv => "tv",
            Self::Wifi => "wifi",
        }
    }

    /// Code format for codes issued in this category.
    #[must_use]
    pub const fn code_format(&self) -> CodeFormat {
        match self {
            Self::Invitation => CodeFormat::new("INV", 10),
            Self::Package => CodeFormat::new("PKG", 10),
            Self::Registration => CodeFormat::new("REG", 10),
            Self::Eload => CodeFormat::new("EL", 10),
            Self::Gsat => CodeFormat::new("GS", 10),
            Self::Tv => CodeFormat::new("TV", 10),
            Self::Wifi => CodeFormat::new("WF", 10),
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = ProductKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ProductKeyError::UnknownCategory(s.to_string()))
    }
}

/// Key of one stock line: `{category}:{variant}`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductKey {
    category: ProductCategory,
    variant: String,
}

impl ProductKey {
    /// Build a key from its parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the variant is empty, too long, or contains
    /// characters outside `[a-z0-9_-]`.
    pub fn new(category: ProductCategory, variant: impl Into<String>) -> Result<Self, ProductKeyError> {
        let variant = variant.into();
        if variant.is_empty() || variant.len() > MAX_VARIANT_LEN {
            return Err(ProductKeyError::InvalidVariant(variant));
        }
        let valid = variant
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');
        if !valid {
            return Err(ProductKeyError::InvalidVariant(variant));
        }
        Ok(Self { category, variant })
    }

    /// The product category.
    #[must_use]
    pub const fn category(&self) -> ProductCategory {
        self.category
    }

    /// The variant (package code or duration).
    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Role granted to whoever registers with a code of this product.
    ///
    /// Only invitation products grant a role; their variant names it.
    #[must_use]
    pub fn granted_role(&self) -> Option<MemberRole> {
        match self.category {
            ProductCategory::Invitation => self.variant.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductKey({self})")
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.variant)
    }
}

impl FromStr for ProductKey {
    type Err = ProductKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, variant) = s
            .split_once(':')
            .ok_or_else(|| ProductKeyError::Malformed(s.to_string()))?;
        Self::new(category.parse()?, variant)
    }
}

impl TryFrom<String> for ProductKey {
    type Error = ProductKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProductKey> for String {
    fn from(key: ProductKey) -> Self {
        key.to_string()
    }
}

/// Errors parsing a product key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductKeyError {
    /// Missing the `category:variant` separator.
    #[error("malformed product key: {0}")]
    Malformed(String),

    /// Category is not one of the known families.
    #[error("unknown product category: {0}")]
    UnknownCategory(String),

    /// Variant is empty, too long, or has invalid characters.
    #[error("invalid product variant: {0}")]
    InvalidVariant(String),
}

/// Remaining sellable units for one product key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStock {
    /// The product key.
    pub key: ProductKey,

    /// Units left to sell.
    pub available: u64,

    /// When the count last changed.
    pub updated_at: DateTime<Utc>,
}

impl ProductStock {
    /// Create a stock record with the given count.
    #[must_use]
    pub fn new(key: ProductKey, available: u64) -> Self {
        Self {
            key,
            available,
            updated_at: Utc::now(),
        }
    }

    /// Check if `quantity` units can be reserved.
    #[must_use]
    pub const fn can_reserve(&self, quantity: u64) -> bool {
        self.available >= quantity
    }
}

/// Stock level observed right after a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// The product key.
    pub product_key: ProductKey,
    /// Units left.
    pub available: u64,
    /// Whether `available` is at or below the low-stock threshold.
    pub is_low_stock: bool,
}

impl StockLevel {
    /// Apply the low-stock policy to a count.
    #[must_use]
    pub fn evaluate(product_key: ProductKey, available: u64, low_stock_threshold: u64) -> Self {
        Self {
            product_key,
            available,
            is_low_stock: available <= low_stock_threshold,
        }
    }
}
