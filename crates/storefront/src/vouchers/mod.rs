//! Voucher claiming.
//!
//! A logged-in customer claims a program once and receives a personal code.
//! Claiming again returns the same code.

pub mod programs;
mod store;

pub use programs::VoucherProgram;
pub use store::{InMemoryVoucherStore, VoucherClaim, VoucherStore};

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use optica_core::{ClaimStatus, CustomerId};
use rand::seq::IndexedRandom;
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;

/// Characters used in codes; `0/O` and `1/I` are left out.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_SUFFIX_LEN: usize = 6;

/// Shop time zone offset (Asia/Ho_Chi_Minh, no DST).
const SHOP_UTC_OFFSET_SECS: i32 = 7 * 60 * 60;

/// Calendar date at the shop, used for voucher expiry.
#[must_use]
pub fn shop_today() -> NaiveDate {
    let now = Utc::now();
    FixedOffset::east_opt(SHOP_UTC_OFFSET_SECS)
        .map_or_else(|| now.date_naive(), |tz| now.with_timezone(&tz).date_naive())
}

/// Errors that can occur when claiming a voucher.
#[derive(Debug, Error)]
pub enum VoucherError {
    /// No program has this id.
    #[error("unknown voucher program '{0}'")]
    UnknownProgram(String),

    /// The program no longer accepts claims.
    #[error("voucher program '{program}' has ended")]
    Expired {
        program: &'static str,
        ended_on: Option<NaiveDate>,
    },

    /// Claim storage failed.
    #[error("voucher storage error: {0}")]
    Repository(#[from] RepositoryError),
}

impl VoucherError {
    /// Vietnamese message rendered next to the voucher.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownProgram(_) => "Chương trình ưu đãi không tồn tại".to_string(),
            Self::Expired {
                ended_on: Some(day),
                ..
            } => format!(
                "Chương trình đã kết thúc ngày {}",
                day.format("%d/%m/%Y")
            ),
            Self::Expired { ended_on: None, .. } => "Chương trình đã kết thúc".to_string(),
            Self::Repository(_) => "Không thể nhận mã lúc này, vui lòng thử lại".to_string(),
        }
    }
}

/// One program as shown to one customer.
#[derive(Debug, Clone, Serialize)]
pub struct VoucherView {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub discount_label: &'static str,
    pub expires_on: Option<String>,
    pub status: ClaimStatus,
    pub code: Option<String>,
    /// Whether the claim button should be offered.
    pub claimable: bool,
}

impl VoucherView {
    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        matches!(self.status, ClaimStatus::Claimed)
    }
}

/// Claims vouchers against a [`VoucherStore`].
#[derive(Clone)]
pub struct VoucherService {
    store: Arc<dyn VoucherStore>,
}

impl VoucherService {
    #[must_use]
    pub fn new(store: Arc<dyn VoucherStore>) -> Self {
        Self { store }
    }

    /// Claim `program_id` for `customer`.
    ///
    /// A repeated claim returns the stored one unchanged.
    ///
    /// # Errors
    ///
    /// `UnknownProgram` for an id not on offer, `Expired` when the program
    /// ended before `today`, `Repository` when storage fails.
    #[tracing::instrument(skip(self), fields(customer_id = %customer))]
    pub async fn claim(
        &self,
        customer: CustomerId,
        program_id: &str,
        today: NaiveDate,
    ) -> Result<VoucherClaim, VoucherError> {
        let program = programs::find(program_id)
            .ok_or_else(|| VoucherError::UnknownProgram(program_id.to_string()))?;

        if let Some(existing) = self.store.find(customer, program.id).await? {
            tracing::debug!(program = program.id, "Voucher already claimed");
            return Ok(existing);
        }

        if !program.is_available(today) {
            return Err(VoucherError::Expired {
                program: program.id,
                ended_on: program.expires_on,
            });
        }

        let claim = VoucherClaim {
            customer_id: customer,
            program_id: program.id.to_string(),
            code: generate_code(program.code_prefix),
            claimed_at: Utc::now(),
            expires_on: program.expires_on,
        };
        let stored = self.store.insert_if_absent(claim).await?;
        tracing::info!(program = program.id, "Voucher claimed");
        Ok(stored)
    }

    /// Every program with this customer's claim state.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::Repository` when storage fails.
    pub async fn list_for(
        &self,
        customer: CustomerId,
        today: NaiveDate,
    ) -> Result<Vec<VoucherView>, VoucherError> {
        let claims = self.store.list(customer).await?;

        Ok(programs::all()
            .iter()
            .map(|program| {
                let claim = claims.iter().find(|c| c.program_id == program.id);
                VoucherView {
                    id: program.id,
                    title: program.title,
                    description: program.description,
                    discount_label: program.discount_label,
                    expires_on: program
                        .expires_on
                        .map(|d| d.format("%d/%m/%Y").to_string()),
                    status: if claim.is_some() {
                        ClaimStatus::Claimed
                    } else {
                        ClaimStatus::Unclaimed
                    },
                    code: claim.map(|c| c.code.clone()),
                    claimable: claim.is_none() && program.is_available(today),
                }
            })
            .collect())
    }
}

/// `PREFIX-XXXXXX` with an unambiguous uppercase suffix.
fn generate_code(prefix: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .filter_map(|_| CODE_ALPHABET.choose(&mut rng).copied().map(char::from))
        .collect();
    format!("{prefix}-{suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> (VoucherService, Arc<InMemoryVoucherStore>) {
        let store = Arc::new(InMemoryVoucherStore::new());
        (VoucherService::new(store.clone()), store)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn test_code_format() {
        let code = generate_code("BLUE");
        let (prefix, suffix) = code.split_once('-').unwrap();
        assert_eq!(prefix, "BLUE");
        assert_eq!(suffix.len(), CODE_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        assert!(!suffix.contains(['0', 'O', '1', 'I']));
    }

    #[tokio::test]
    async fn test_second_claim_returns_same_code() {
        let (service, store) = service();
        let customer = CustomerId::new(7);
        let first = service.claim(customer, "WELCOME50K", today()).await.unwrap();
        let second = service.claim(customer, "welcome50k", today()).await.unwrap();
        assert_eq!(first, second);
        assert!(first.code.starts_with("WELCOME-"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_program() {
        let (service, store) = service();
        let err = service
            .claim(CustomerId::new(7), "FREESTUFF", today())
            .await
            .unwrap_err();
        assert!(matches!(err, VoucherError::UnknownProgram(_)));
        assert_eq!(err.user_message(), "Chương trình ưu đãi không tồn tại");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_program() {
        let (service, _) = service();
        let err = service
            .claim(CustomerId::new(7), "TET2026", today())
            .await
            .unwrap_err();
        assert!(matches!(err, VoucherError::Expired { .. }));
        assert!(err.user_message().contains("28/02/2026"));
    }

    #[tokio::test]
    async fn test_list_for_reflects_claims() {
        let (service, _) = service();
        let customer = CustomerId::new(7);
        service.claim(customer, "BLUECUT20", today()).await.unwrap();

        let views = service.list_for(customer, today()).await.unwrap();
        let blue = views.iter().find(|v| v.id == "BLUECUT20").unwrap();
        assert!(blue.is_claimed());
        assert!(blue.code.as_deref().unwrap().starts_with("BLUE-"));
        assert!(!blue.claimable);

        let tet = views.iter().find(|v| v.id == "TET2026").unwrap();
        assert_eq!(tet.status, ClaimStatus::Unclaimed);
        assert!(!tet.claimable);

        let welcome = views.iter().find(|v| v.id == "WELCOME50K").unwrap();
        assert!(welcome.claimable);

        // Other customers are unaffected
        let others = service.list_for(CustomerId::new(8), today()).await.unwrap();
        assert!(others.iter().all(|v| !v.is_claimed()));
    }
}
