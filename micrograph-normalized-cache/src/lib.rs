//! A normalized cache for [`micrograph`](../micrograph/index.html).
//!
//! Query results are broken up into one record per entity, keyed by `Typename:id`, with links
//! between them instead of nested copies. Two queries that ask for the same entity read the
//! same record, so a write through one of them is visible to the other.
//!
//! Subscribers registered with [`NormalizedCache::subscribe`](struct.NormalizedCache.html#method.subscribe)
//! are called again whenever a write changes data they read.
//!
//! ```
//! # use micrograph::Client;
//! # use micrograph_normalized_cache::NormalizedCache;
//! let cache = NormalizedCache::new();
//! let client = Client::builder("http://localhost:8080/graphql")
//!     .with_cache(cache.clone())
//!     .build();
//! ```
//!
//! The lower level pieces ([`normalize`](fn.normalize.html), [`merge`](fn.merge.html) and
//! [`denormalize`](fn.denormalize.html)) are exported as well and work on a plain
//! [`Store`](struct.Store.html).

#[cfg(test)]
#[macro_use]
extern crate lazy_static;

mod annotate;
mod cache;
pub mod store;
mod subscriptions;
mod types;

pub use annotate::prepare_query;
pub use cache::NormalizedCache;
pub use store::{
    denormalize, field_key, merge, normalize, ChangedKeys, Denormalized, EntityKey, FieldKey,
    FieldRef, Footprint, Record, Store, StoreValue
};
pub use subscriptions::Unsubscribe;
pub use types::{is_root, KeyOptions, NormalizedCacheOptions, ROOT_TYPES};

pub type HashMap<K, V> = std::collections::HashMap<K, V, fnv::FnvBuildHasher>;
pub type HashSet<T> = std::collections::HashSet<T, fnv::FnvBuildHasher>;
