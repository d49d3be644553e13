//! Tienda Core - Shared types library.
//!
//! This crate provides common types used across the Tienda Telcel workspace:
//! - `storefront` - Public storefront API server (cart, auth, catalog, checkout)
//! - `cli` - Command-line tools for migrations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, phone numbers, prices,
//!   roles, and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
