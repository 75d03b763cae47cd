//! Interface definitions for the store.
//!
//! This module defines the abstract `PostalStore` trait that allows for
//! dependency injection and swappable storage backends.

mod postal_store;

pub use postal_store::PostalStore;
