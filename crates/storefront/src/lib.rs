//! Tienda Telcel storefront library.
//!
//! JSON API behind the Tienda Telcel storefront: catalog browsing, a cart
//! that follows the customer from guest to signed-in, customer accounts on
//! Supabase Auth, and checkout against the order backend.
//!
//! # Modules
//!
//! - [`cart`] - Cart state manager (guest/user carts, merge on sign-in)
//! - [`auth`] - Auth/session bridge over the identity provider
//! - [`catalog`] - Catalog API client with response caching
//! - [`orders`] - Checkout and order submission
//! - [`routes`] - HTTP handlers and router assembly

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod orders;
pub mod routes;
pub mod state;
pub mod validation;
