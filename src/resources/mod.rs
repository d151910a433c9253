//! The four content collections, each described once as a `Resource`.
//!
//! Everything that differs between books, messages, newspapers and
//! courses lives here: wire path, envelope shape, item schema, table
//! columns, form fields and validation rules. The client, cache, list
//! view and modals are generic over `Resource`.

pub mod books;
pub mod courses;
pub mod form;
pub mod messages;
pub mod newspapers;

pub use books::Books;
pub use courses::Courses;
pub use messages::Messages;
pub use newspapers::Newspapers;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::api::api_types::Envelope;
use form::{FieldSpec, FormValues};

/// A record of a collection, identified by its server-assigned id.
pub trait Record: Clone + std::fmt::Debug + PartialEq + Send + Sync + DeserializeOwned + 'static {
  fn id(&self) -> &str;
}

/// Which mutations a collection supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
  pub create: bool,
  pub update: bool,
  pub delete: bool,
}

impl Capabilities {
  pub const ALL: Capabilities = Capabilities {
    create: true,
    update: true,
    delete: true,
  };

  pub const READ_DELETE: Capabilities = Capabilities {
    create: false,
    update: false,
    delete: true,
  };
}

/// A table column: header and width as a percentage of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub header: &'static str,
  pub width: u16,
}

pub trait Resource: Send + Sync + 'static {
  type Item: Record;

  /// Cache tag and command name, e.g. "books"
  const TAG: &'static str;
  /// Display title, e.g. "Books"
  const TITLE: &'static str;
  /// Singular noun used in notifications, e.g. "book"
  const NOUN: &'static str;
  /// Collection path relative to the resource origin
  const PATH: &'static str;
  const ENVELOPE: Envelope;
  const CAPABILITIES: Capabilities;
  /// Create/update form, in display order. Empty for read-only resources.
  const FIELDS: &'static [FieldSpec];
  const COLUMNS: &'static [Column];

  /// Cells of one table row, matching `COLUMNS`.
  fn row(item: &Self::Item) -> Vec<String>;

  /// Labelled values for the read-only detail modal.
  fn details(item: &Self::Item) -> Vec<(&'static str, String)>;

  /// Short human label, e.g. the title.
  fn label(item: &Self::Item) -> String;

  /// Seed values for the update form.
  fn form_values(_item: &Self::Item) -> FormValues {
    FormValues::new()
  }
}

/// "book" -> "Book"
pub fn capitalize(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

pub fn format_date(at: &DateTime<Utc>) -> String {
  at.format("%Y-%m-%d").to_string()
}

pub fn format_datetime(at: &DateTime<Utc>) -> String {
  at.format("%Y-%m-%d %H:%M").to_string()
}
