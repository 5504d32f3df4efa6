//! AutoNorte Core - Shared types library.
//!
//! This crate provides common types used across the AutoNorte client
//! components:
//! - `client` - Storefront client core (session, cart, checkout)
//! - `cli` - Command-line driver for the client core
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This
//! keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and peso amounts,
//!   plus the order enums shared between cart and checkout

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
