//! Trade-in (old-for-new) requests.
//!
//! A customer describes a used pair of glasses and optionally the product
//! they want instead. The form is validated field by field, appraised and
//! kept in a [`TradeInStore`] until staff follow up.

use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use optica_core::{Category, DeviceCondition, PhoneNumber, Price, Product, TradeInId};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};

use crate::catalog::find_by_slug;

/// Credit never exceeds this share of the desired product's price.
pub const MAX_CREDIT_PERCENT: u8 = 30;

const NAME_MAX_CHARS: usize = 100;
const BRAND_MAX_CHARS: usize = 60;
const TEXT_MAX_CHARS: usize = 500;

/// Appraisal base for an item in like-new condition.
#[must_use]
pub const fn base_value(category: Category) -> Price {
    match category {
        Category::Frame => Price::new(800_000),
        Category::Sunglasses => Price::new(1_000_000),
        Category::Lens => Price::new(200_000),
    }
}

/// Estimated credit for an old item.
///
/// Base value scaled by condition, capped at [`MAX_CREDIT_PERCENT`] of the
/// desired product's price when one is given.
#[must_use]
pub fn appraise(category: Category, condition: DeviceCondition, desired: Option<Price>) -> Price {
    let credit = base_value(category).percent_of(condition.credit_percent());
    desired.map_or(credit, |price| credit.min(price.percent_of(MAX_CREDIT_PERCENT)))
}

/// Raw form submission.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TradeInForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub old_brand: String,
    #[serde(default)]
    pub old_category: String,
    #[serde(default)]
    pub old_description: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub desired_product: String,
    #[serde(default)]
    pub note: String,
}

/// Inline error per form field. `None` means the field is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TradeInErrors {
    pub full_name: Option<&'static str>,
    pub phone: Option<&'static str>,
    pub old_brand: Option<&'static str>,
    pub old_category: Option<&'static str>,
    pub old_description: Option<&'static str>,
    pub condition: Option<&'static str>,
    pub desired_product: Option<&'static str>,
    pub note: Option<&'static str>,
}

impl TradeInErrors {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.phone.is_none()
            && self.old_brand.is_none()
            && self.old_category.is_none()
            && self.old_description.is_none()
            && self.condition.is_none()
            && self.desired_product.is_none()
            && self.note.is_none()
    }
}

/// The product a customer wants in exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredProduct {
    pub slug: String,
    pub name: String,
    pub price: Price,
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTradeIn {
    pub full_name: String,
    pub phone: PhoneNumber,
    pub old_brand: String,
    pub old_category: Category,
    pub old_description: String,
    pub condition: DeviceCondition,
    pub desired: Option<DesiredProduct>,
    pub note: Option<String>,
}

impl ValidTradeIn {
    #[must_use]
    pub fn estimate(&self) -> Price {
        appraise(
            self.old_category,
            self.condition,
            self.desired.as_ref().map(|d| d.price),
        )
    }
}

fn required_text(
    raw: &str,
    max: usize,
    missing: &'static str,
    too_long: &'static str,
) -> Result<String, &'static str> {
    let value = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if value.is_empty() {
        Err(missing)
    } else if value.chars().count() > max {
        Err(too_long)
    } else {
        Ok(value)
    }
}

impl TradeInForm {
    /// Validate every field, collecting all errors at once.
    ///
    /// `products` resolves the desired product slug.
    ///
    /// # Errors
    ///
    /// Returns the per-field errors when any field is invalid.
    pub fn validate(&self, products: &[Product]) -> Result<ValidTradeIn, TradeInErrors> {
        let mut errors = TradeInErrors::default();

        let full_name = required_text(
            &self.full_name,
            NAME_MAX_CHARS,
            "Vui lòng nhập họ tên",
            "Họ tên quá dài",
        )
        .map_err(|e| errors.full_name = Some(e))
        .ok();

        let phone = PhoneNumber::parse(&self.phone)
            .map_err(|e| errors.phone = Some(e.user_message()))
            .ok();

        let old_brand = required_text(
            &self.old_brand,
            BRAND_MAX_CHARS,
            "Vui lòng nhập thương hiệu",
            "Tên thương hiệu quá dài",
        )
        .map_err(|e| errors.old_brand = Some(e))
        .ok();

        let old_category = self
            .old_category
            .parse::<Category>()
            .map_err(|_| errors.old_category = Some("Vui lòng chọn loại sản phẩm"))
            .ok();

        let old_description = required_text(
            &self.old_description,
            TEXT_MAX_CHARS,
            "Vui lòng mô tả sản phẩm cũ",
            "Mô tả quá dài",
        )
        .map_err(|e| errors.old_description = Some(e))
        .ok();

        let condition = self
            .condition
            .parse::<DeviceCondition>()
            .map_err(|_| errors.condition = Some("Vui lòng chọn tình trạng"))
            .ok();

        let desired_slug = self.desired_product.trim();
        let desired = if desired_slug.is_empty() {
            None
        } else if let Some(product) = find_by_slug(products, desired_slug) {
            Some(DesiredProduct {
                slug: product.slug.clone(),
                name: product.name.clone(),
                price: product.price,
            })
        } else {
            errors.desired_product = Some("Sản phẩm không tồn tại");
            None
        };

        let note = self.note.trim();
        if note.chars().count() > TEXT_MAX_CHARS {
            errors.note = Some("Ghi chú quá dài");
        }

        match (
            full_name,
            phone,
            old_brand,
            old_category,
            old_description,
            condition,
        ) {
            (
                Some(full_name),
                Some(phone),
                Some(old_brand),
                Some(old_category),
                Some(old_description),
                Some(condition),
            ) if errors.is_empty() => Ok(ValidTradeIn {
                full_name,
                phone,
                old_brand,
                old_category,
                old_description,
                condition,
                desired,
                note: (!note.is_empty()).then(|| note.to_string()),
            }),
            _ => Err(errors),
        }
    }
}

/// A stored trade-in request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeInRequest {
    pub id: TradeInId,
    pub full_name: String,
    pub phone: PhoneNumber,
    pub old_brand: String,
    pub old_category: Category,
    pub old_description: String,
    pub condition: DeviceCondition,
    pub desired: Option<DesiredProduct>,
    pub note: Option<String>,
    pub estimate: Price,
    pub submitted_at: DateTime<Utc>,
}

/// How long a request stays retrievable after submission.
const REQUEST_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const MAX_REQUESTS: u64 = 10_000;

/// Process-local trade-in storage, bounded in size and age.
pub struct TradeInStore {
    requests: Cache<TradeInId, TradeInRequest>,
    next_id: AtomicI32,
}

impl Default for TradeInStore {
    fn default() -> Self {
        Self::with_limits(MAX_REQUESTS, REQUEST_TTL)
    }
}

impl TradeInStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding at most `capacity` requests, each for at most `ttl`.
    #[must_use]
    pub fn with_limits(capacity: u64, ttl: Duration) -> Self {
        Self {
            requests: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            next_id: AtomicI32::new(1),
        }
    }

    /// Appraise and store a validated request.
    pub fn submit(&self, valid: ValidTradeIn) -> TradeInRequest {
        let id = TradeInId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = TradeInRequest {
            id,
            estimate: valid.estimate(),
            full_name: valid.full_name,
            phone: valid.phone,
            old_brand: valid.old_brand,
            old_category: valid.old_category,
            old_description: valid.old_description,
            condition: valid.condition,
            desired: valid.desired,
            note: valid.note,
            submitted_at: Utc::now(),
        };
        self.requests.insert(id, request.clone());
        tracing::info!(
            trade_in_id = %id,
            phone = %request.phone.masked(),
            estimate = request.estimate.amount(),
            "Trade-in request stored"
        );
        request
    }

    #[must_use]
    pub fn get(&self, id: TradeInId) -> Option<TradeInRequest> {
        self.requests.get(&id)
    }

    /// Number of stored requests after pending evictions are applied.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.requests.run_pending_tasks();
        self.requests.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
