//! Typed errors for requests against the content collections.

use thiserror::Error;

/// Errors from a single API operation.
///
/// `Clone` so one in-flight request can hand the same outcome to every
/// waiter that joined it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  #[error("network error: {0}")]
  Network(String),
  #[error("HTTP {status}: {}", message.as_deref().unwrap_or("request failed"))]
  Http {
    status: u16,
    message: Option<String>,
  },
  #[error("unexpected response shape: {0}")]
  Decode(String),
  #[error("could not read {path}: {message}")]
  Attachment { path: String, message: String },
}

impl ApiError {
  /// Message suitable for a notification: the server's message for HTTP
  /// errors that carried one, otherwise `fallback`.
  pub fn user_message(&self, fallback: &str) -> String {
    match self {
      ApiError::Http {
        message: Some(message),
        ..
      } => message.clone(),
      _ => fallback.to_string(),
    }
  }

  #[cfg(test)]
  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Http { status, .. } => Some(*status),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      ApiError::Decode(err.to_string())
    } else {
      ApiError::Network(err.to_string())
    }
  }
}
