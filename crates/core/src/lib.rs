//! Sstashed Core - Shared types library.
//!
//! This crate provides common types used across all Sstashed components:
//! - `storefront` - Gateway client, session and cart/wishlist synchronizers
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps it
//! lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Canonical ids, prices, emails, and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
