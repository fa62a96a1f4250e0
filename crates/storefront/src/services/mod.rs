//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Phone-OTP gate state machine and the flow that drives it
//! - `signals` - Publish/subscribe channel for auth events

pub mod auth;
pub mod signals;
