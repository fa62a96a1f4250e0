//! Core types for Optica.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod email;
pub mod filter;
pub mod id;
pub mod otp;
pub mod phone;
pub mod price;
pub mod status;

pub use catalog::{Category, FrameDesign, Material, Product, ProductError, Shape, TagError};
pub use email::{Email, EmailError};
pub use filter::{FilterState, Selection, SortKey};
pub use id::*;
pub use otp::{OTP_LENGTH, OtpCode, OtpError};
pub use phone::{PhoneError, PhoneNumber};
pub use price::Price;
pub use status::*;
