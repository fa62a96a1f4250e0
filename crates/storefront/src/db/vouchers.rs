//! Voucher claims in `PostgreSQL`.
//!
//! Queries are checked at runtime so the crate builds without a database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use optica_core::CustomerId;
use sqlx::PgPool;

use super::RepositoryError;
use crate::vouchers::{VoucherClaim, VoucherError, VoucherStore};

#[derive(sqlx::FromRow)]
struct ClaimRow {
    customer_id: CustomerId,
    program_id: String,
    code: String,
    claimed_at: DateTime<Utc>,
    expires_on: Option<NaiveDate>,
}

impl From<ClaimRow> for VoucherClaim {
    fn from(row: ClaimRow) -> Self {
        Self {
            customer_id: row.customer_id,
            program_id: row.program_id,
            code: row.code,
            claimed_at: row.claimed_at,
            expires_on: row.expires_on,
        }
    }
}

/// Claim store backed by `storefront.voucher_claim`.
#[derive(Clone)]
pub struct PgVoucherStore {
    pool: PgPool,
}

impl PgVoucherStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(
        &self,
        customer: CustomerId,
        program_id: &str,
    ) -> Result<Option<VoucherClaim>, RepositoryError> {
        let row = sqlx::query_as::<_, ClaimRow>(
            r"
            SELECT customer_id, program_id, code, claimed_at, expires_on
            FROM storefront.voucher_claim
            WHERE customer_id = $1 AND program_id = $2
            ",
        )
        .bind(customer)
        .bind(program_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VoucherClaim::from))
    }
}

#[async_trait]
impl VoucherStore for PgVoucherStore {
    async fn find(
        &self,
        customer: CustomerId,
        program_id: &str,
    ) -> Result<Option<VoucherClaim>, VoucherError> {
        Ok(self.fetch(customer, program_id).await?)
    }

    async fn insert_if_absent(&self, claim: VoucherClaim) -> Result<VoucherClaim, VoucherError> {
        let inserted = sqlx::query_as::<_, ClaimRow>(
            r"
            INSERT INTO storefront.voucher_claim
                (customer_id, program_id, code, claimed_at, expires_on)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (customer_id, program_id) DO NOTHING
            RETURNING customer_id, program_id, code, claimed_at, expires_on
            ",
        )
        .bind(claim.customer_id)
        .bind(&claim.program_id)
        .bind(&claim.code)
        .bind(claim.claimed_at)
        .bind(claim.expires_on)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        if let Some(row) = inserted {
            return Ok(row.into());
        }

        // Lost the race: another request stored a claim first
        self.fetch(claim.customer_id, &claim.program_id)
            .await?
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "voucher claim for customer {} / {} vanished after conflict",
                    claim.customer_id, claim.program_id
                ))
                .into()
            })
    }

    async fn list(&self, customer: CustomerId) -> Result<Vec<VoucherClaim>, VoucherError> {
        let rows = sqlx::query_as::<_, ClaimRow>(
            r"
            SELECT customer_id, program_id, code, claimed_at, expires_on
            FROM storefront.voucher_claim
            WHERE customer_id = $1
            ORDER BY claimed_at
            ",
        )
        .bind(customer)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(rows.into_iter().map(VoucherClaim::from).collect())
    }
}
