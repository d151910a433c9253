//! Process-wide cache of fetched results.
//!
//! - Results are keyed by resource plus query (or item id)
//! - Identical requests in flight are shared
//! - Mutations invalidate by tag; subscribed queries refetch on their own
//! - Entries nobody subscribes to are dropped after a grace period

mod api;
mod keys;
mod store;

pub use api::ResourceApi;
pub use store::Subscription;

#[cfg(test)]
pub use keys::{ResourceKey, Tag};
#[cfg(test)]
pub use store::Store;
