//! Hash collections used throughout the crate.

pub use std::collections::BTreeMap;

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;
