use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Most recently created first.
pub const DEFAULT_SORT: &str = "-createdAt";

/// Identifies one page of a resource. Keyword filtering happens server-side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
  page: u32,
  limit: u32,
  sort: String,
  keyword: Option<String>,
}

impl Default for ListQuery {
  fn default() -> Self {
    Self::new(DEFAULT_PAGE_SIZE, DEFAULT_SORT)
  }
}

impl ListQuery {
  /// First page with the given page size and sort spec.
  pub fn new(limit: u32, sort: impl Into<String>) -> Self {
    Self {
      page: 1,
      limit: limit.max(1),
      sort: sort.into(),
      keyword: None,
    }
  }

  /// Pages are 1-based; anything lower is clamped to the first page.
  pub fn with_page(mut self, page: u32) -> Self {
    self.page = page.max(1);
    self
  }

  /// An empty keyword means "no filter".
  pub fn with_keyword(mut self, keyword: &str) -> Self {
    self.keyword = if keyword.is_empty() {
      None
    } else {
      Some(keyword.to_string())
    };
    self
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn limit(&self) -> u32 {
    self.limit
  }

  pub fn sort(&self) -> &str {
    &self.sort
  }

  pub fn keyword(&self) -> Option<&str> {
    self.keyword.as_deref()
  }

  /// Query-string parameters in the order the server expects them.
  /// `sort` is omitted when empty and `keyword` when absent.
  pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
    if !self.sort.is_empty() {
      pairs.push(("sort", self.sort.clone()));
    }
    if let Some(keyword) = &self.keyword {
      pairs.push(("keyword", keyword.clone()));
    }
    pairs
  }

  /// Stable serialization used as the cache identity of this query.
  pub fn canonical(&self) -> String {
    format!(
      "page={}&limit={}&sort={}&keyword={}",
      self.page,
      self.limit,
      self.sort,
      self.keyword.as_deref().unwrap_or("")
    )
  }
}

/// Server-computed pagination. The client never paginates locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  pub current_page: u32,
  pub total_pages: u32,
  pub limit: Option<u32>,
}

/// One decoded page of a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<T> {
  pub items: Vec<T>,
  pub pagination: Pagination,
  /// Number of records the server reported for this page.
  pub results: u64,
}

/// Acknowledgement returned by `DELETE /<resource>/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteReceipt {
  pub status: String,
  #[serde(default)]
  pub message: String,
}

impl DeleteReceipt {
  /// Receipt for a 2xx response that carried no body.
  pub fn empty() -> Self {
    Self {
      status: "success".to_string(),
      message: String::new(),
    }
  }
}

/// Signed-in administrator, as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  #[serde(rename = "_id")]
  pub id: String,
  pub name: String,
  pub email: String,
  pub role: String,
}
