//! Cache keys and invalidation tags.

use sha2::{Digest, Sha256};

use crate::api::ListQuery;

/// Label used to group cache entries for bulk invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
  /// Every list query of a resource.
  List(&'static str),
  /// One record of a resource.
  Item(&'static str, String),
}

/// Identity of a cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
  List {
    resource: &'static str,
    query: ListQuery,
  },
  Item {
    resource: &'static str,
    id: String,
  },
}

impl ResourceKey {
  pub fn list(resource: &'static str, query: ListQuery) -> Self {
    Self::List { resource, query }
  }

  pub fn item(resource: &'static str, id: impl Into<String>) -> Self {
    Self::Item {
      resource,
      id: id.into(),
    }
  }

  fn canonical(&self) -> String {
    match self {
      Self::List { resource, query } => format!("{}:list:{}", resource, query.canonical()),
      Self::Item { resource, id } => format!("{}:item:{}", resource, id),
    }
  }

  /// SHA256 of the canonical form, for stable fixed-length keys.
  pub fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.canonical().as_bytes());
    hex::encode(hasher.finalize())
  }

  pub fn description(&self) -> String {
    match self {
      Self::List { resource, query } => match query.keyword() {
        Some(keyword) => format!("{} page {} matching {:?}", resource, query.page(), keyword),
        None => format!("{} page {}", resource, query.page()),
      },
      Self::Item { resource, id } => format!("{} {}", resource, id),
    }
  }

  /// Tags the entry carries before any value has arrived, so a request
  /// still in flight is caught by an invalidation.
  pub fn base_tags(&self) -> Vec<Tag> {
    match self {
      Self::List { resource, .. } => vec![Tag::List(*resource)],
      Self::Item { resource, id } => vec![Tag::Item(*resource, id.clone())],
    }
  }
}
