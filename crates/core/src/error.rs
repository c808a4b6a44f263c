use serde::{Deserialize, Serialize};

/// The error taxonomy exposed at the protocol surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  NotFound,
  InvalidConfig,
  InvalidRequest,
  ProviderNotAvailable,
  EmbeddingFailed,
  ParseError,
  SearchFailed,
  StoreFailed,
  Timeout,
  Cancelled,
  SchemaIncompatible,
}

impl ErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ErrorKind::NotFound => "not_found",
      ErrorKind::InvalidConfig => "invalid_config",
      ErrorKind::InvalidRequest => "invalid_request",
      ErrorKind::ProviderNotAvailable => "provider_not_available",
      ErrorKind::EmbeddingFailed => "embedding_failed",
      ErrorKind::ParseError => "parse_error",
      ErrorKind::SearchFailed => "search_failed",
      ErrorKind::StoreFailed => "store_failed",
      ErrorKind::Timeout => "timeout",
      ErrorKind::Cancelled => "cancelled",
      ErrorKind::SchemaIncompatible => "schema_incompatible",
    }
  }
}

/// An error record as delivered to protocol consumers.
///
/// Carries a kind from the taxonomy plus a human-readable message, and
/// optionally the field or path it concerns. Never carries stack traces.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("{}: {message}", .kind.as_str())]
pub struct EngineError {
  pub kind: ErrorKind,
  pub message: String,
  /// Field name or file path the error refers to, when applicable.
  pub context: Option<String>,
}

impl EngineError {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
      context: None,
    }
  }

  pub fn with_context(mut self, context: impl Into<String>) -> Self {
    self.context = Some(context.into());
    self
  }

  pub fn invalid_request(field: &str) -> Self {
    Self::new(ErrorKind::InvalidRequest, format!("missing required field: {field}")).with_context(field)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display_includes_kind() {
    let err = EngineError::new(ErrorKind::StoreFailed, "disk full");
    assert_eq!(err.to_string(), "store_failed: disk full");
  }

  #[test]
  fn test_invalid_request_names_field() {
    let err = EngineError::invalid_request("query");
    assert_eq!(err.kind, ErrorKind::InvalidRequest);
    assert_eq!(err.context.as_deref(), Some("query"));
  }

  #[test]
  fn test_kind_serializes_snake_case() {
    let json = serde_json::to_string(&ErrorKind::SchemaIncompatible).unwrap();
    assert_eq!(json, "\"schema_incompatible\"");
  }
}
