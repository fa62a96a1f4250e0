//! Claim storage.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use optica_core::CustomerId;
use serde::Serialize;
use tokio::sync::RwLock;

use super::VoucherError;

/// A minted voucher belonging to one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoucherClaim {
    pub customer_id: CustomerId,
    pub program_id: String,
    pub code: String,
    pub claimed_at: DateTime<Utc>,
    pub expires_on: Option<NaiveDate>,
}

/// Persistence for voucher claims.
///
/// Implementations must keep at most one claim per (customer, program).
#[async_trait]
pub trait VoucherStore: Send + Sync {
    /// The claim `customer` holds for `program_id`, if any.
    async fn find(
        &self,
        customer: CustomerId,
        program_id: &str,
    ) -> Result<Option<VoucherClaim>, VoucherError>;

    /// Store `claim` unless the customer already holds one for the program.
    ///
    /// Returns whichever claim is stored afterwards.
    async fn insert_if_absent(&self, claim: VoucherClaim) -> Result<VoucherClaim, VoucherError>;

    /// Every claim held by `customer`.
    async fn list(&self, customer: CustomerId) -> Result<Vec<VoucherClaim>, VoucherError>;
}

/// Process-local claim store.
#[derive(Default)]
pub struct InMemoryVoucherStore {
    claims: RwLock<HashMap<(CustomerId, String), VoucherClaim>>,
}

impl InMemoryVoucherStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored claims.
    pub async fn len(&self) -> usize {
        self.claims.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.claims.read().await.is_empty()
    }
}

#[async_trait]
impl VoucherStore for InMemoryVoucherStore {
    async fn find(
        &self,
        customer: CustomerId,
        program_id: &str,
    ) -> Result<Option<VoucherClaim>, VoucherError> {
        Ok(self
            .claims
            .read()
            .await
            .get(&(customer, program_id.to_string()))
            .cloned())
    }

    async fn insert_if_absent(&self, claim: VoucherClaim) -> Result<VoucherClaim, VoucherError> {
        let mut claims = self.claims.write().await;
        let stored = claims
            .entry((claim.customer_id, claim.program_id.clone()))
            .or_insert(claim);
        Ok(stored.clone())
    }

    async fn list(&self, customer: CustomerId) -> Result<Vec<VoucherClaim>, VoucherError> {
        let mut claims: Vec<_> = self
            .claims
            .read()
            .await
            .values()
            .filter(|c| c.customer_id == customer)
            .cloned()
            .collect();
        claims.sort_by_key(|c| c.claimed_at);
        Ok(claims)
    }
}
