//! HTTP client for one collection.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tracing::debug;
use url::Url;

use super::api_types::{decode_delete, decode_item, decode_list, error_message};
use super::error::ApiError;
use super::payload::{Payload, RequestBody};
use super::types::{DeleteReceipt, ListQuery, ListResult};
use crate::resources::Resource;
use crate::session::Session;

/// Build the shared reqwest client with the configured extra headers.
pub fn http_client(extra_headers: &BTreeMap<String, String>) -> Result<reqwest::Client> {
  let mut headers = HeaderMap::new();
  for (name, value) in extra_headers {
    let name = HeaderName::from_bytes(name.as_bytes())
      .map_err(|e| eyre!("Invalid header name {}: {}", name, e))?;
    let value =
      HeaderValue::from_str(value).map_err(|e| eyre!("Invalid header value for {}: {}", name, e))?;
    headers.insert(name, value);
  }

  reqwest::Client::builder()
    .default_headers(headers)
    .build()
    .map_err(|e| eyre!("Failed to create HTTP client: {}", e))
}

/// Parse an origin so that relative paths join below it.
pub fn base_url(origin: &str) -> Result<Url> {
  let mut origin = origin.trim().to_string();
  if !origin.ends_with('/') {
    origin.push('/');
  }
  let url = Url::parse(&origin).map_err(|e| eyre!("Invalid URL {}: {}", origin, e))?;
  if url.cannot_be_a_base() {
    return Err(eyre!("URL {} cannot be used as a base", origin));
  }
  Ok(url)
}

/// Attach the bearer credential if the session has one. A missing token
/// is not an error here; the server decides what needs authorization.
pub(crate) fn authorize(builder: RequestBuilder, session: &Session) -> RequestBuilder {
  match session.token() {
    Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
    None => builder,
  }
}

/// Send a request and return the body of a 2xx response.
pub(crate) async fn send(builder: RequestBuilder) -> Result<Vec<u8>, ApiError> {
  let response = builder.send().await?;
  let status = response.status();
  let body = response.bytes().await?;

  if !status.is_success() {
    return Err(ApiError::Http {
      status: status.as_u16(),
      message: error_message(&body),
    });
  }

  Ok(body.to_vec())
}

/// Client for the collection described by `R`.
pub struct ResourceClient<R: Resource> {
  http: reqwest::Client,
  collection: Url,
  session: Session,
  _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceClient<R> {
  fn clone(&self) -> Self {
    Self {
      http: self.http.clone(),
      collection: self.collection.clone(),
      session: self.session.clone(),
      _resource: PhantomData,
    }
  }
}

impl<R: Resource> ResourceClient<R> {
  pub fn new(http: reqwest::Client, origin: &str, session: Session) -> Result<Self> {
    let collection = base_url(origin)?
      .join(R::PATH)
      .map_err(|e| eyre!("Invalid path for {}: {}", R::TAG, e))?;

    Ok(Self {
      http,
      collection,
      session,
      _resource: PhantomData,
    })
  }

  fn item_url(&self, id: &str) -> Url {
    let mut url = self.collection.clone();
    // http(s) URLs always have path segments
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.pop_if_empty().push(id);
    }
    url
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    debug!(resource = R::TAG, %method, %url, "request");
    authorize(self.http.request(method, url), &self.session)
  }

  async fn request_with_payload(
    &self,
    method: Method,
    url: Url,
    payload: Payload,
  ) -> Result<Vec<u8>, ApiError> {
    let builder = self.request(method, url);
    let builder = match payload.into_body().await? {
      RequestBody::Json(value) => builder.json(&value),
      RequestBody::Multipart(form) => builder.multipart(form),
    };
    send(builder).await
  }

  /// `GET /<resource>?page=&limit=&sort=&keyword=`
  pub async fn list(&self, query: &ListQuery) -> Result<ListResult<R::Item>, ApiError> {
    let mut url = self.collection.clone();
    url.query_pairs_mut().extend_pairs(query.query_pairs());

    let body = send(self.request(Method::GET, url)).await?;
    decode_list(R::ENVELOPE, &body)
  }

  /// `GET /<resource>/:id`
  pub async fn get(&self, id: &str) -> Result<R::Item, ApiError> {
    let body = send(self.request(Method::GET, self.item_url(id))).await?;
    decode_item(&body)
  }

  /// `POST /<resource>`
  pub async fn create(&self, payload: Payload) -> Result<R::Item, ApiError> {
    let url = self.collection.clone();
    let body = self.request_with_payload(Method::POST, url, payload).await?;
    decode_item(&body)
  }

  /// `PATCH /<resource>/:id`
  pub async fn update(&self, id: &str, payload: Payload) -> Result<R::Item, ApiError> {
    let url = self.item_url(id);
    let body = self.request_with_payload(Method::PATCH, url, payload).await?;
    decode_item(&body)
  }

  /// `DELETE /<resource>/:id`
  pub async fn delete(&self, id: &str) -> Result<DeleteReceipt, ApiError> {
    let body = send(self.request(Method::DELETE, self.item_url(id))).await?;
    decode_delete(&body)
  }
}

#[cfg(test)]
pub(crate) mod test_support {
  use serde_json::{json, Value};

  /// A flat list envelope with `count` books starting at `first`.
  pub fn books_page(first: usize, count: usize, page: u32, pages: u32) -> Value {
    let data: Vec<Value> = (first..first + count)
      .map(|n| {
        json!({
          "_id": format!("b{}", n),
          "title": format!("Book {}", n),
          "description": "A sufficiently long description",
          "price": 10.0,
          "createdAt": "2024-01-01T00:00:00Z"
        })
      })
      .collect();
    json!({
      "status": "success",
      "code": 200,
      "message": "",
      "results": count,
      "pagination": { "currentPage": page, "limit": 10, "numberOfPages": pages },
      "data": data
    })
  }

  pub fn book(id: &str, title: &str) -> Value {
    json!({
      "_id": id,
      "title": title,
      "description": "A sufficiently long description",
      "price": 10.0,
      "createdAt": "2024-01-01T00:00:00Z"
    })
  }
}
