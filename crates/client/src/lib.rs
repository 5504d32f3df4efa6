//! AutoNorte storefront client core.
//!
//! The stateful heart of the storefront: session token coordination,
//! the hybrid guest/server cart, carrier shipping quotes, and checkout
//! submission. Catalog rendering and page wiring live elsewhere and
//! call into this crate through a small set of operations.
//!
//! # Architecture
//!
//! - One [`StorefrontSession`] per page session owns every component
//!   and replaces ambient globals; clones share all state.
//! - The session token and guest cart persist through a
//!   [`storage::CredentialStore`]; nothing else is durable.
//! - The backend is the source of truth for the authenticated cart -
//!   no local sync, direct API calls.
//! - Guest carts are priced by resolving product ids against the public
//!   catalog (cached via `moka`, 5 minute TTL).
//!
//! # Example
//!
//! ```rust,ignore
//! use autonorte_client::{StoreConfig, StorefrontSession};
//! use autonorte_client::checkout::CheckoutForm;
//! use autonorte_core::{DeliveryType, PaymentMethod, ProductId};
//!
//! let session = StorefrontSession::new(StoreConfig::from_env()?)?;
//!
//! // Works logged in or anonymous; guest state migrates on first login.
//! session.add_to_cart(ProductId::new(5), 2).await?;
//! let view = session.cart_view().await?;
//! println!("total {}", view.totals.grand_total);
//!
//! // Checkout (authenticated).
//! session.set_delivery_type(DeliveryType::Pickup);
//! let outcome = session
//!     .checkout(&CheckoutForm {
//!         payment_method: Some(PaymentMethod::Card),
//!         delivery_type: Some(DeliveryType::Pickup),
//!         ..CheckoutForm::default()
//!     })
//!     .await?;
//! println!("pay at {}", outcome.payment_url);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;
pub mod shipping;
pub mod storage;

mod storefront;

pub use config::{ConfigError, StoreConfig};
pub use error::{Result, StoreError};
pub use storefront::{CartView, StorefrontSession};
