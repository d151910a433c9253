use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::form::{FieldKind, FieldSpec, FormValues, Rule};
use super::{format_date, format_datetime, Capabilities, Column, Record, Resource};
use crate::api::api_types::Envelope;

pub const COURSE_TYPES: &[&str] = &[
  "دوره تدريبيه",
  "برامج تدريبه",
  "ورش عمل",
  "الدبلومات المهنيه",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Course {
  #[serde(rename = "_id")]
  pub id: String,
  pub name: String,
  pub title: String,
  #[serde(rename = "type")]
  pub course_type: String,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
  #[serde(rename = "updatedAt", default)]
  pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Course {
  fn id(&self) -> &str {
    &self.id
  }
}

pub struct Courses;

impl Resource for Courses {
  type Item = Course;

  const TAG: &'static str = "courses";
  const TITLE: &'static str = "Courses";
  const NOUN: &'static str = "course";
  const PATH: &'static str = "api/v1/courses";
  const ENVELOPE: Envelope = Envelope::Flat;
  const CAPABILITIES: Capabilities = Capabilities::ALL;

  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec {
      name: "name",
      label: "Course Name",
      kind: FieldKind::Text,
      rules: &[
        Rule::Required("Course Name is required"),
        Rule::MinChars(3, "Too short Name"),
      ],
    },
    FieldSpec {
      name: "title",
      label: "Title",
      kind: FieldKind::Text,
      rules: &[
        Rule::Required("Title is required"),
        Rule::MinChars(5, "Too short Title"),
      ],
    },
    FieldSpec {
      name: "type",
      label: "Type",
      kind: FieldKind::Choice(COURSE_TYPES),
      rules: &[
        Rule::Required("Type is required"),
        Rule::OneOf("Type is required"),
      ],
    },
    FieldSpec {
      name: "image",
      label: "Image",
      kind: FieldKind::Image,
      rules: &[Rule::RequiredOnCreate("Image is required")],
    },
  ];

  const COLUMNS: &'static [Column] = &[
    Column {
      header: "Course Name",
      width: 25,
    },
    Column {
      header: "Title",
      width: 35,
    },
    Column {
      header: "Type",
      width: 25,
    },
    Column {
      header: "Date",
      width: 15,
    },
  ];

  fn row(item: &Course) -> Vec<String> {
    vec![
      item.name.clone(),
      item.title.clone(),
      item.course_type.clone(),
      format_date(&item.created_at),
    ]
  }

  fn details(item: &Course) -> Vec<(&'static str, String)> {
    vec![
      ("Course Name", item.name.clone()),
      ("Title", item.title.clone()),
      ("Type", item.course_type.clone()),
      ("Image", item.image.clone().unwrap_or_else(|| "-".to_string())),
      ("Created", format_datetime(&item.created_at)),
      ("ID", item.id.clone()),
    ]
  }

  fn label(item: &Course) -> String {
    item.name.clone()
  }

  fn form_values(item: &Course) -> FormValues {
    FormValues::from([
      ("name", item.name.clone()),
      ("title", item.title.clone()),
      ("type", item.course_type.clone()),
    ])
  }
}
