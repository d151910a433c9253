//! Form schemas, field-level validation and payload construction.

use thiserror::Error;

use crate::api::payload::Payload;

/// Field values keyed by field name, as typed by the user.
pub type FormValues = std::collections::BTreeMap<&'static str, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  Text,
  Multiline,
  Number,
  /// One of a fixed set of values
  Choice(&'static [&'static str]),
  /// Path of an image file to upload
  Image,
}

/// A single validation constraint. Rules after the first failing one are
/// not evaluated, so each field reports at most one message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
  Required(&'static str),
  /// Required when creating; an empty value on update keeps the stored one.
  RequiredOnCreate(&'static str),
  MinChars(usize, &'static str),
  MaxChars(usize, &'static str),
  Number {
    invalid: &'static str,
    min: f64,
    below_min: &'static str,
  },
  /// Value must be one of the field's choices.
  OneOf(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
  pub name: &'static str,
  pub label: &'static str,
  pub kind: FieldKind,
  pub rules: &'static [Rule],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
  Create,
  Update { id: String },
}

impl FormMode {
  pub fn is_create(&self) -> bool {
    matches!(self, FormMode::Create)
  }
}

/// Every failing field with its message, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(Vec<(&'static str, &'static str)>);

impl ValidationErrors {
  pub fn get(&self, field: &str) -> Option<&'static str> {
    self
      .0
      .iter()
      .find(|(name, _)| *name == field)
      .map(|(_, message)| *message)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &(&'static str, &'static str)> {
    self.0.iter()
  }
}

fn value_of<'a>(values: &'a FormValues, name: &str) -> &'a str {
  values.get(name).map(|v| v.trim()).unwrap_or("")
}

fn check(field: &FieldSpec, value: &str, mode: &FormMode) -> Option<&'static str> {
  if value.is_empty() {
    return field.rules.iter().find_map(|rule| match rule {
      Rule::Required(msg) => Some(*msg),
      Rule::RequiredOnCreate(msg) if mode.is_create() => Some(*msg),
      _ => None,
    });
  }

  let chars = value.chars().count();
  field.rules.iter().find_map(|rule| match *rule {
    Rule::Required(_) | Rule::RequiredOnCreate(_) => None,
    Rule::MinChars(min, msg) => (chars < min).then_some(msg),
    Rule::MaxChars(max, msg) => (chars > max).then_some(msg),
    Rule::Number {
      invalid,
      min,
      below_min,
    } => match value.parse::<f64>() {
      Ok(n) if n.is_finite() => (n < min).then_some(below_min),
      _ => Some(invalid),
    },
    Rule::OneOf(msg) => match field.kind {
      FieldKind::Choice(options) => (!options.contains(&value)).then_some(msg),
      _ => None,
    },
  })
}

/// Validate the full field set, collecting every failure.
pub fn validate(
  fields: &[FieldSpec],
  values: &FormValues,
  mode: &FormMode,
) -> Result<(), ValidationErrors> {
  let errors: Vec<_> = fields
    .iter()
    .filter_map(|field| check(field, value_of(values, field.name), mode).map(|m| (field.name, m)))
    .collect();

  if errors.is_empty() {
    Ok(())
  } else {
    Err(ValidationErrors(errors))
  }
}

/// Build the request payload from validated values. Text is trimmed, an
/// empty image path is left out.
pub fn build_payload(fields: &[FieldSpec], values: &FormValues) -> Payload {
  fields.iter().fold(Payload::new(), |payload, field| {
    let value = value_of(values, field.name);
    match field.kind {
      FieldKind::Image if value.is_empty() => payload,
      FieldKind::Image => payload.with_image(field.name, value),
      FieldKind::Number => match value.parse::<f64>() {
        Ok(n) => payload.with_number(field.name, n),
        Err(_) => payload.with_text(field.name, value),
      },
      FieldKind::Text | FieldKind::Multiline | FieldKind::Choice(_) => {
        payload.with_text(field.name, value)
      }
    }
  })
}
