// Text validation utilities for embedding providers
//
// Provides validation and truncation for text inputs before embedding,
// protecting against oversized chunks that exceed model context limits.

use scout_core::CHARS_PER_TOKEN;
use tracing::warn;

/// Configuration for text validation.
#[derive(Debug, Clone)]
pub struct TextValidationConfig {
  /// Maximum tokens allowed for embedding (model-specific).
  pub max_tokens: usize,
  /// Estimated characters per token for size calculation.
  pub chars_per_token: usize,
}

impl TextValidationConfig {
  /// Create config for a specific model's context length.
  pub fn for_context_length(context_length: usize) -> Self {
    Self {
      max_tokens: context_length,
      chars_per_token: CHARS_PER_TOKEN,
    }
  }

  /// Maximum characters allowed based on token estimate.
  pub fn max_chars(&self) -> usize {
    self.max_tokens * self.chars_per_token
  }

  /// Estimate token count for a text string.
  pub fn estimate_tokens(&self, text: &str) -> usize {
    text.len() / self.chars_per_token
  }
}

/// Result of validating text for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
  /// Text is within limits, use as-is.
  Valid,
  /// Text exceeds limits and was truncated.
  Truncated { original_len: usize, truncated_len: usize },
}

/// Validate and optionally truncate text for embedding.
///
/// Truncation happens at character boundaries to avoid splitting multi-byte
/// characters. Returns the (possibly truncated) text and what happened.
pub fn validate_and_truncate(text: &str, config: &TextValidationConfig) -> (String, ValidationResult) {
  let estimated_tokens = config.estimate_tokens(text);

  if estimated_tokens <= config.max_tokens {
    return (text.to_string(), ValidationResult::Valid);
  }

  let max_chars = config.max_chars();
  let truncated: String = text.chars().take(max_chars).collect();
  let truncated_len = truncated.len();

  warn!(
    original_len = text.len(),
    truncated_len,
    max_tokens = config.max_tokens,
    "Text exceeds embedding model context limit, truncating"
  );

  (
    truncated,
    ValidationResult::Truncated {
      original_len: text.len(),
      truncated_len,
    },
  )
}
