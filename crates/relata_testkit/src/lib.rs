//! # Relata Testkit
//!
//! Test utilities for Relata.
//!
//! This crate provides:
//! - The shop fixture domain (customers, orders, order items, tickets,
//!   companies and their CEOs, locations and clients) with seeded stores
//! - Typed domain object handles for the fixture classes
//! - A recording extension and a vetoing extension
//! - A record store that fails on demand
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relata_testkit::prelude::*;
//!
//! #[test]
//! fn order_belongs_to_customer() {
//!     let world = ShopWorld::seeded();
//!     let mut tx = world.transaction();
//!     let customer = tx
//!         .get_related_object(&world.data.order1, "Customer")
//!         .unwrap();
//!     assert_eq!(customer, Some(world.data.customer1.clone()));
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod domain;
pub mod extensions;
pub mod fixtures;
pub mod generators;
pub mod stores;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::domain::*;
    pub use crate::extensions::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stores::*;
}

pub use domain::*;
pub use extensions::*;
pub use fixtures::*;
pub use generators::*;
pub use stores::*;
