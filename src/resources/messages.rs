use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::form::FieldSpec;
use super::{format_date, format_datetime, Capabilities, Column, Record, Resource};
use crate::api::api_types::Envelope;

/// A contact-us message. Messages are read and deleted, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
  #[serde(rename = "_id")]
  pub id: String,
  pub name: String,
  pub email: String,
  pub message: String,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
  #[serde(rename = "updatedAt", default)]
  pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Message {
  fn id(&self) -> &str {
    &self.id
  }
}

pub struct Messages;

impl Resource for Messages {
  type Item = Message;

  const TAG: &'static str = "messages";
  const TITLE: &'static str = "Messages";
  const NOUN: &'static str = "message";
  const PATH: &'static str = "api/v1/contact-us";
  const ENVELOPE: Envelope = Envelope::Nested;
  const CAPABILITIES: Capabilities = Capabilities::READ_DELETE;
  const FIELDS: &'static [FieldSpec] = &[];

  const COLUMNS: &'static [Column] = &[
    Column {
      header: "Name",
      width: 20,
    },
    Column {
      header: "Email",
      width: 25,
    },
    Column {
      header: "Message",
      width: 40,
    },
    Column {
      header: "Date",
      width: 15,
    },
  ];

  fn row(item: &Message) -> Vec<String> {
    vec![
      or_na(&item.name),
      or_na(&item.email),
      if item.message.is_empty() {
        "No message".to_string()
      } else {
        item.message.replace('\n', " ")
      },
      format_date(&item.created_at),
    ]
  }

  fn details(item: &Message) -> Vec<(&'static str, String)> {
    vec![
      ("Name", or_na(&item.name)),
      ("Email", or_na(&item.email)),
      (
        "Message",
        if item.message.is_empty() {
          "No message provided.".to_string()
        } else {
          item.message.clone()
        },
      ),
      ("Received", format_datetime(&item.created_at)),
      ("Message ID", item.id.clone()),
    ]
  }

  fn label(item: &Message) -> String {
    if item.name.is_empty() {
      item.id.clone()
    } else {
      item.name.clone()
    }
  }
}

fn or_na(value: &str) -> String {
  if value.is_empty() {
    "N/A".to_string()
  } else {
    value.to_string()
  }
}
