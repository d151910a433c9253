use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::form::{FieldKind, FieldSpec, FormValues, Rule};
use super::{format_date, format_datetime, Capabilities, Column, Record, Resource};
use crate::api::api_types::Envelope;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Book {
  #[serde(rename = "_id")]
  pub id: String,
  pub title: String,
  pub description: String,
  #[serde(default)]
  pub price: Option<f64>,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub slug: Option<String>,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
  #[serde(rename = "updatedAt", default)]
  pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Book {
  fn id(&self) -> &str {
    &self.id
  }
}

pub struct Books;

impl Resource for Books {
  type Item = Book;

  const TAG: &'static str = "books";
  const TITLE: &'static str = "Books";
  const NOUN: &'static str = "book";
  const PATH: &'static str = "api/v1/books";
  const ENVELOPE: Envelope = Envelope::Flat;
  const CAPABILITIES: Capabilities = Capabilities::ALL;

  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec {
      name: "title",
      label: "Title",
      kind: FieldKind::Text,
      rules: &[
        Rule::Required("Book title is required"),
        Rule::MinChars(3, "Too short book title"),
        Rule::MaxChars(100, "Too long book title"),
      ],
    },
    FieldSpec {
      name: "description",
      label: "Description",
      kind: FieldKind::Multiline,
      rules: &[
        Rule::Required("Book description is required"),
        Rule::MinChars(20, "Too short book description"),
      ],
    },
    FieldSpec {
      name: "price",
      label: "Price (EGP)",
      kind: FieldKind::Number,
      rules: &[
        Rule::Required("Book price is required"),
        Rule::Number {
          invalid: "Price must be a number",
          min: 0.0,
          below_min: "Price must be zero or greater",
        },
      ],
    },
    FieldSpec {
      name: "image",
      label: "Image",
      kind: FieldKind::Image,
      rules: &[Rule::RequiredOnCreate("Book image is required")],
    },
  ];

  const COLUMNS: &'static [Column] = &[
    Column {
      header: "Title",
      width: 45,
    },
    Column {
      header: "Price",
      width: 15,
    },
    Column {
      header: "Image",
      width: 25,
    },
    Column {
      header: "Date",
      width: 15,
    },
  ];

  fn row(item: &Book) -> Vec<String> {
    vec![
      item.title.clone(),
      format_price(item.price),
      item.image.clone().unwrap_or_default(),
      format_date(&item.created_at),
    ]
  }

  fn details(item: &Book) -> Vec<(&'static str, String)> {
    vec![
      ("Title", item.title.clone()),
      ("Description", item.description.clone()),
      ("Price", format_price(item.price)),
      ("Image", item.image.clone().unwrap_or_else(|| "-".to_string())),
      ("Slug", item.slug.clone().unwrap_or_else(|| "-".to_string())),
      ("Created", format_datetime(&item.created_at)),
      (
        "Updated",
        item
          .updated_at
          .as_ref()
          .map(format_datetime)
          .unwrap_or_else(|| "-".to_string()),
      ),
      ("ID", item.id.clone()),
    ]
  }

  fn label(item: &Book) -> String {
    item.title.clone()
  }

  fn form_values(item: &Book) -> FormValues {
    FormValues::from([
      ("title", item.title.clone()),
      ("description", item.description.clone()),
      ("price", item.price.map(|p| p.to_string()).unwrap_or_default()),
    ])
  }
}

fn format_price(price: Option<f64>) -> String {
  price
    .map(|p| format!("{:.2} EGP", p))
    .unwrap_or_else(|| "-".to_string())
}
