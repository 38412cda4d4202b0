//! Sparse ordered property value storage for UI object property overrides.
//!
//! In a retained-mode UI toolkit, most property values come from styles,
//! templates, or inherited defaults; only a handful are set locally on any
//! given object. This crate provides the storage for those local overrides:
//! a [`PropertyValueStore`] is a small sorted map from a registered
//! [`PropertyId`] to an opaque value, tuned for the read-heavy, tiny-N
//! workload of a property engine that consults it per object, per property,
//! many times per frame.
//!
//! Properties are declared once with [`define_property!`], which assigns each
//! a dense, process-wide id at program start-up:
//!
//! ```rust
//! use propstore::{define_property, PropertyValueStore, RegisteredProperty};
//!
//! define_property!(Opacity);
//! define_property!(IsVisible);
//!
//! let mut store: PropertyValueStore<f64> = PropertyValueStore::new();
//! store.add(Opacity::property_id(), 0.5);
//!
//! assert_eq!(store.get(Opacity::property_id()), Some(&0.5));
//! assert_eq!(store.get(IsVisible::property_id()), None);
//!
//! for (id, value) in store.iter() {
//!     println!("{id:?} -> {value}");
//! }
//! ```
//!
//! The store is single-threaded and exclusively owned by one object at a
//! time; there are no concurrency guarantees beyond the registration of
//! property ids, which is synchronized because it is global.

pub mod property;
pub mod value_store;

pub use property::{
    initialize_property_id, property_name, registered_property_count, PropertyId,
    RegisteredProperty,
};
pub use value_store::{PropertyValueStore, LINEAR_SEARCH_MAX};

// Re-exported for the expansion of `define_property!`.
pub use ctor;
pub use paste;
