//! The generic engine behind every collection: client plus cache.

use tracing::{debug, warn};

use super::keys::{ResourceKey, Tag};
use super::store::Store;
use crate::api::{ApiError, DeleteReceipt, ListQuery, ListResult, Payload, ResourceClient};
use crate::query::Query;
use crate::resources::{Record, Resource};

fn list_tags<R: Resource>(result: &ListResult<R::Item>) -> Vec<Tag> {
  result
    .items
    .iter()
    .map(|item| Tag::Item(R::TAG, item.id().to_string()))
    .collect()
}

/// Cached reads and invalidating writes for one collection.
pub struct ResourceApi<R: Resource> {
  client: ResourceClient<R>,
  lists: Store<ListResult<R::Item>>,
  items: Store<R::Item>,
}

impl<R: Resource> Clone for ResourceApi<R> {
  fn clone(&self) -> Self {
    Self {
      client: self.client.clone(),
      lists: self.lists.clone(),
      items: self.items.clone(),
    }
  }
}

impl<R: Resource> ResourceApi<R> {
  pub fn new(client: ResourceClient<R>) -> Self {
    Self {
      client,
      lists: Store::new(R::TAG, list_tags::<R>),
      // An item key already provides its own id tag
      items: Store::new(R::TAG, |_| Vec::new()),
    }
  }

  #[cfg(test)]
  pub fn lists(&self) -> &Store<ListResult<R::Item>> {
    &self.lists
  }

  #[cfg(test)]
  pub fn items(&self) -> &Store<R::Item> {
    &self.items
  }

  /// One page, from cache when fresh.
  pub async fn list(&self, query: &ListQuery, force: bool) -> Result<ListResult<R::Item>, ApiError> {
    let key = ResourceKey::list(R::TAG, query.clone());
    let client = self.client.clone();
    let query = query.clone();
    self
      .lists
      .fetch(&key, force, move || async move { client.list(&query).await })
      .await
  }

  /// One record, from cache when fresh.
  pub async fn get(&self, id: &str, force: bool) -> Result<R::Item, ApiError> {
    let key = ResourceKey::item(R::TAG, id);
    let client = self.client.clone();
    let id = id.to_string();
    self
      .items
      .fetch(&key, force, move || async move { client.get(&id).await })
      .await
  }

  /// A subscribed query for one page. It refetches on its own when a
  /// mutation invalidates the page.
  pub fn use_list(&self, query: ListQuery) -> Query<ListResult<R::Item>> {
    let subscription = self.lists.subscribe(&ResourceKey::list(R::TAG, query.clone()));
    let api = self.clone();
    Query::new(move |force| {
      let api = api.clone();
      let query = query.clone();
      async move { api.list(&query, force).await }
    })
    .with_subscription(subscription)
  }

  pub fn use_item(&self, id: &str) -> Query<R::Item> {
    let subscription = self.items.subscribe(&ResourceKey::item(R::TAG, id));
    let api = self.clone();
    let id = id.to_string();
    Query::new(move |force| {
      let api = api.clone();
      let id = id.clone();
      async move { api.get(&id, force).await }
    })
    .with_subscription(subscription)
  }

  fn invalidate(&self, tags: &[Tag]) {
    let affected = self.lists.invalidate(tags) + self.items.invalidate(tags);
    debug!(resource = R::TAG, ?tags, affected, "invalidated after mutation");
  }

  pub async fn create(&self, payload: Payload) -> Result<R::Item, ApiError> {
    let created = self.client.create(payload).await.map_err(|e| {
      warn!(resource = R::TAG, "create failed: {}", e);
      e
    })?;
    self.invalidate(&[Tag::List(R::TAG)]);
    Ok(created)
  }

  pub async fn update(&self, id: &str, payload: Payload) -> Result<R::Item, ApiError> {
    let updated = self.client.update(id, payload).await.map_err(|e| {
      warn!(resource = R::TAG, id, "update failed: {}", e);
      e
    })?;
    self.invalidate(&[Tag::List(R::TAG), Tag::Item(R::TAG, id.to_string())]);
    Ok(updated)
  }

  pub async fn delete(&self, id: &str) -> Result<DeleteReceipt, ApiError> {
    let receipt = self.client.delete(id).await.map_err(|e| {
      warn!(resource = R::TAG, id, "delete failed: {}", e);
      e
    })?;
    self.invalidate(&[Tag::List(R::TAG), Tag::Item(R::TAG, id.to_string())]);
    Ok(receipt)
  }
}
