//! Optica Core - Shared domain types.
//!
//! This crate provides the types used across all Optica components:
//! - `storefront` - Public-facing eyewear shop
//! - `cli` - Command-line tools for migrations and catalog inspection
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere, including from the catalog engine's pure functions.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, phone numbers, OTP codes,
//!   catalog tags, products and filter selections

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
