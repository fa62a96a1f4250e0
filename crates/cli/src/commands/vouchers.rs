//! Voucher inspection.

use optica_core::CustomerId;
use optica_storefront::db::PgVoucherStore;
use optica_storefront::vouchers::{VoucherStore, programs, shop_today};

use super::migrate::database_url;

/// Print every voucher program and whether it accepts claims today.
pub fn programs() {
    let today = shop_today();

    #[allow(clippy::print_stdout)]
    for program in programs::all() {
        let ends = program
            .expires_on
            .map_or_else(|| "-".to_string(), |d| d.format("%d/%m/%Y").to_string());
        let state = if program.is_available(today) {
            "open"
        } else {
            "closed"
        };
        println!(
            "{:<12} {:<8} {:<10} {:<6}  {}",
            program.id, program.discount_label, ends, state, program.title
        );
    }
}

/// Print the claims stored for `customer_id`.
///
/// # Errors
///
/// Returns an error if `STOREFRONT_DATABASE_URL` is unset or the query fails.
pub async fn claims(customer_id: i32) -> Result<(), Box<dyn std::error::Error>> {
    let pool = optica_storefront::db::create_pool(&database_url()?).await?;
    let store = PgVoucherStore::new(pool);
    let claims = store.list(CustomerId::new(customer_id)).await?;

    #[allow(clippy::print_stdout)]
    {
        for claim in &claims {
            println!(
                "{:<12} {:<16} {}",
                claim.program_id,
                claim.code,
                claim.claimed_at.format("%d/%m/%Y %H:%M")
            );
        }
        println!("{} claim(s) for customer {customer_id}", claims.len());
    }
    Ok(())
}
