use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::form::{FieldKind, FieldSpec, FormValues, Rule};
use super::{format_date, format_datetime, Capabilities, Column, Record, Resource};
use crate::api::api_types::Envelope;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Newspaper {
  #[serde(rename = "_id")]
  pub id: String,
  pub title: String,
  pub description: String,
  #[serde(default)]
  pub slug: Option<String>,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
  #[serde(rename = "updatedAt", default)]
  pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Newspaper {
  fn id(&self) -> &str {
    &self.id
  }
}

pub struct Newspapers;

impl Resource for Newspapers {
  type Item = Newspaper;

  const TAG: &'static str = "newspapers";
  const TITLE: &'static str = "Newspapers";
  const NOUN: &'static str = "newspaper";
  const PATH: &'static str = "api/v1/newspapers";
  const ENVELOPE: Envelope = Envelope::Flat;
  const CAPABILITIES: Capabilities = Capabilities::ALL;

  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec {
      name: "title",
      label: "Title",
      kind: FieldKind::Text,
      rules: &[
        Rule::Required("Newspaper title is required"),
        Rule::MinChars(3, "Too short title"),
        Rule::MaxChars(100, "Too long title"),
      ],
    },
    FieldSpec {
      name: "description",
      label: "Description",
      kind: FieldKind::Multiline,
      rules: &[
        Rule::Required("Description is required"),
        Rule::MinChars(10, "Too short description"),
      ],
    },
  ];

  const COLUMNS: &'static [Column] = &[
    Column {
      header: "Title",
      width: 35,
    },
    Column {
      header: "Description",
      width: 50,
    },
    Column {
      header: "Date",
      width: 15,
    },
  ];

  fn row(item: &Newspaper) -> Vec<String> {
    vec![
      item.title.clone(),
      item.description.replace('\n', " "),
      format_date(&item.created_at),
    ]
  }

  fn details(item: &Newspaper) -> Vec<(&'static str, String)> {
    vec![
      ("Title", item.title.clone()),
      ("Description", item.description.clone()),
      ("Slug", item.slug.clone().unwrap_or_else(|| "-".to_string())),
      ("Created", format_datetime(&item.created_at)),
      ("ID", item.id.clone()),
    ]
  }

  fn label(item: &Newspaper) -> String {
    item.title.clone()
  }

  fn form_values(item: &Newspaper) -> FormValues {
    FormValues::from([
      ("title", item.title.clone()),
      ("description", item.description.clone()),
    ])
  }
}
