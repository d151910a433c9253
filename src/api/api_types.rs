//! Serde-deserializable types matching the collection API envelopes.
//!
//! These are kept apart from the domain types so that decoding is one
//! explicit step: a body either matches the expected envelope and maps
//! into a `ListResult`, or the operation fails with `ApiError::Decode`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::ApiError;
use super::types::{DeleteReceipt, ListResult, Pagination, User};

/// Where a list endpoint puts its page inside the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
  /// `{status, code, message, results, pagination, data: [...]}`
  Flat,
  /// `{status, code, message, data: {results, pagination, data: [...]}}`
  Nested,
}

// ============================================================================
// List envelopes
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiPagination {
  #[serde(rename = "currentPage")]
  current_page: u32,
  #[serde(rename = "numberOfPages")]
  number_of_pages: u32,
  #[serde(default)]
  limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiPage<T> {
  data: Vec<T>,
  pagination: ApiPagination,
  #[serde(default)]
  results: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiNestedPage<T> {
  data: ApiPage<T>,
}

impl<T> From<ApiPage<T>> for ListResult<T> {
  fn from(page: ApiPage<T>) -> Self {
    let results = page.results.unwrap_or(page.data.len() as u64);
    ListResult {
      items: page.data,
      pagination: Pagination {
        current_page: page.pagination.current_page,
        total_pages: page.pagination.number_of_pages,
        limit: page.pagination.limit,
      },
      results,
    }
  }
}

/// Decode a list response body according to its envelope.
pub fn decode_list<T: DeserializeOwned>(
  envelope: Envelope,
  body: &[u8],
) -> Result<ListResult<T>, ApiError> {
  let page: ApiPage<T> = match envelope {
    Envelope::Flat => serde_json::from_slice(body),
    Envelope::Nested => serde_json::from_slice::<ApiNestedPage<T>>(body).map(|n| n.data),
  }
  .map_err(|e| ApiError::Decode(format!("list response: {}", e)))?;

  Ok(page.into())
}

// ============================================================================
// Single records
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiSingle<T> {
  Wrapped { data: T },
  Bare(T),
}

/// Decode a single record, either bare or wrapped as `{data: record}`.
pub fn decode_item<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
  let single: ApiSingle<T> = serde_json::from_slice(body)
    .map_err(|e| ApiError::Decode(format!("record response: {}", e)))?;

  Ok(match single {
    ApiSingle::Wrapped { data } => data,
    ApiSingle::Bare(item) => item,
  })
}

/// Decode a delete acknowledgement. An empty 2xx body counts as success.
pub fn decode_delete(body: &[u8]) -> Result<DeleteReceipt, ApiError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(DeleteReceipt::empty());
  }
  serde_json::from_slice(body).map_err(|e| ApiError::Decode(format!("delete response: {}", e)))
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiLoginData {
  pub token: String,
  pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct ApiLoginResponse {
  pub data: ApiLoginData,
}

// ============================================================================
// Errors
// ============================================================================

/// Pull `message` out of an error body when the server sent one.
pub fn error_message(body: &[u8]) -> Option<String> {
  let value: serde_json::Value = serde_json::from_slice(body).ok()?;
  value
    .get("message")
    .and_then(|m| m.as_str())
    .filter(|m| !m.is_empty())
    .map(String::from)
}
