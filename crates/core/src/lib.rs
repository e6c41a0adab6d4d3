//! Atelier Core - Domain library for the jewelry storefront.
//!
//! This crate holds the storefront's business rules, shared by:
//! - `storefront` - JSON catalog service (uses the layout engine and cart repricing)
//! - `cli` - Local tooling with a persisted, client-side cart
//!
//! # Architecture
//!
//! The core crate contains only types, pure logic, and traits - no file access,
//! no database access, no HTTP clients. Persistence for the cart is expressed
//! through the [`cart::CartStorage`] trait and implemented by the callers.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`cart`] - Cart aggregate, quantity rules, and the hydrating `CartStore`
//! - [`layout`] - Pattern-based catalog grid layout engine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod layout;
pub mod types;

pub use types::*;
