#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A HashMap implementation over the linear-probing table.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with configurable hashers.
pub mod hash_map;

pub mod hash_table;

/// The default hasher builder used by [`HashMap`] when no hasher is
/// specified.
#[cfg(feature = "foldhash")]
pub type DefaultHashBuilder = foldhash::fast::RandomState;

/// Placeholder standing in for the default hasher builder when the
/// `foldhash` feature is disabled. It is uninhabited; construct a map with
/// an explicit hasher instead.
#[cfg(not(feature = "foldhash"))]
#[derive(Clone, Copy, Debug)]
pub enum DefaultHashBuilder {}

pub use hash_map::HashMap;
pub use hash_table::HashTable;
pub use hash_table::LoadFactor;
pub use hash_table::TryReserveError;
