//! Implementations of [`FeatureSource`](crate::query::FeatureSource).

mod memory;
pub use memory::InMemoryFeatureSource;

mod rest;
pub use rest::{decode_extent, decode_feature_set, query_params};

#[cfg(all(feature = "http", not(target_arch = "wasm32")))]
pub use rest::FeatureService;
