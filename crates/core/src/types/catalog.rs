//! Catalog records and the tag vocabularies products are classified by.
//!
//! Tags are closed enums with a kebab-case slug (used in URLs and the GraphQL
//! contract) and a Vietnamese display label.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Error returned when a slug does not name a known tag.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{slug}'")]
pub struct TagError {
    /// Which vocabulary was being parsed.
    pub kind: &'static str,
    /// The offending input.
    pub slug: String,
}

macro_rules! catalog_tag {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => ($slug:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every value, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// URL slug.
            #[must_use]
            pub const fn slug(self) -> &'static str {
                match self {
                    $(Self::$variant => $slug),+
                }
            }

            /// Display label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.slug())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = TagError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|tag| tag.slug().eq_ignore_ascii_case(needle))
                    .ok_or_else(|| TagError {
                        kind: $kind,
                        slug: needle.to_owned(),
                    })
            }
        }
    };
}

catalog_tag! {
    /// Top-level product category.
    Category, "category" {
        Frame => ("frame", "Gọng kính"),
        Lens => ("lens", "Tròng kính"),
        Sunglasses => ("sunglasses", "Kính mát"),
    }
}

catalog_tag! {
    /// Frame shape / style.
    Shape, "shape" {
        Rectangle => ("rectangle", "Chữ nhật"),
        Round => ("round", "Tròn"),
        Square => ("square", "Vuông"),
        Oval => ("oval", "Oval"),
        CatEye => ("cat-eye", "Mắt mèo"),
        Aviator => ("aviator", "Phi công"),
    }
}

catalog_tag! {
    /// Frame material.
    Material, "material" {
        Acetate => ("acetate", "Acetate"),
        Metal => ("metal", "Kim loại"),
        Titanium => ("titanium", "Titan"),
        Tr90 => ("tr90", "Nhựa dẻo TR90"),
        Plastic => ("plastic", "Nhựa"),
    }
}

catalog_tag! {
    /// How much of the lens the frame encloses.
    FrameDesign, "frame design" {
        FullRim => ("full-rim", "Gọng nguyên"),
        SemiRim => ("semi-rim", "Gọng nửa"),
        Rimless => ("rimless", "Không gọng"),
    }
}

/// Errors from [`Product::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProductError {
    /// The original (pre-sale) price is below the current price.
    #[error("product {id}: original price {original} is below price {price}")]
    OriginalBelowPrice {
        /// Offending product.
        id: ProductId,
        /// Current price.
        price: Price,
        /// Original price.
        original: Price,
    },
    /// Rating outside the 0-5 scale.
    #[error("product {id}: rating {rating} is outside 0..=5")]
    RatingOutOfRange {
        /// Offending product.
        id: ProductId,
        /// The rating found.
        rating: f32,
    },
}

/// A catalog product. Read-only once loaded.
///
/// Frame attributes (`shape`, `material`, `frame_design`) are absent for
/// lenses; a product without a tag never matches a filter on that tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub brand: String,
    pub category: Category,
    pub price: Price,
    #[serde(default)]
    pub original_price: Option<Price>,
    pub rating: f32,
    pub review_count: u32,
    #[serde(default)]
    pub shape: Option<Shape>,
    #[serde(default)]
    pub material: Option<Material>,
    #[serde(default)]
    pub frame_design: Option<FrameDesign>,
    #[serde(default)]
    pub is_on_sale: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_hot_deal: bool,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Product {
    /// Check record invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError`] if the original price is below the current
    /// price or the rating is outside 0-5.
    pub fn validate(&self) -> Result<(), ProductError> {
        if let Some(original) = self.original_price
            && original < self.price
        {
            return Err(ProductError::OriginalBelowPrice {
                id: self.id,
                price: self.price,
                original,
            });
        }
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(ProductError::RatingOutOfRange {
                id: self.id,
                rating: self.rating,
            });
        }
        Ok(())
    }

    /// Percentage off the original price, when discounted.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u8> {
        self.original_price
            .and_then(|original| self.price.discount_percent(original))
    }
}
