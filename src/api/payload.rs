//! Request bodies for create and update.
//!
//! A payload is sent as JSON unless it carries an image, in which case it
//! becomes a multipart form. Binary content never goes through JSON.

use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::error::ApiError;

/// An image to upload, read from disk when the request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
  pub field: String,
  pub path: PathBuf,
}

/// Fields submitted by a create or update form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
  fields: Map<String, Value>,
  image: Option<ImageUpload>,
}

/// Wire form of a payload.
pub enum RequestBody {
  Json(Value),
  Multipart(Form),
}

impl Payload {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_text(mut self, name: &str, value: impl Into<String>) -> Self {
    self.fields.insert(name.to_string(), Value::String(value.into()));
    self
  }

  pub fn with_number(mut self, name: &str, value: f64) -> Self {
    let value = serde_json::Number::from_f64(value)
      .map(Value::Number)
      .unwrap_or(Value::Null);
    self.fields.insert(name.to_string(), value);
    self
  }

  pub fn with_image(mut self, field: &str, path: impl Into<PathBuf>) -> Self {
    self.image = Some(ImageUpload {
      field: field.to_string(),
      path: path.into(),
    });
    self
  }

  #[cfg(test)]
  pub fn is_multipart(&self) -> bool {
    self.image.is_some()
  }

  pub fn field(&self, name: &str) -> Option<&Value> {
    self.fields.get(name)
  }

  pub fn image(&self) -> Option<&ImageUpload> {
    self.image.as_ref()
  }

  /// Build the wire body, reading the image file if one is attached.
  pub async fn into_body(self) -> Result<RequestBody, ApiError> {
    let Some(image) = self.image else {
      return Ok(RequestBody::Json(Value::Object(self.fields)));
    };

    let bytes = tokio::fs::read(&image.path)
      .await
      .map_err(|e| ApiError::Attachment {
        path: image.path.display().to_string(),
        message: e.to_string(),
      })?;

    let mut form = Form::new();
    for (name, value) in self.fields {
      let text = match value {
        Value::String(s) => s,
        Value::Null => continue,
        other => other.to_string(),
      };
      form = form.text(name, text);
    }

    let file_name = image
      .path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload".to_string());
    let part = Part::bytes(bytes)
      .file_name(file_name)
      .mime_str(&mime_for(&image.path))
      .map_err(|e| ApiError::Attachment {
        path: image.path.display().to_string(),
        message: e.to_string(),
      })?;

    Ok(RequestBody::Multipart(form.part(image.field, part)))
  }
}

/// Content type guessed from the file extension.
fn mime_for(path: &Path) -> String {
  mime_guess::from_path(path).first_or_octet_stream().to_string()
}
