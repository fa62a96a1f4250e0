//! Domain models for storefront.
//!
//! Types stored in the session between requests.

pub mod session;

pub use session::{Cart, CartLine, CurrentCustomer, keys as session_keys};
