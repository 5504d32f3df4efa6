//! Core types for AutoNorte.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod order;

pub use id::*;
pub use money::Pesos;
pub use order::{DeliveryType, PaymentMethod};
