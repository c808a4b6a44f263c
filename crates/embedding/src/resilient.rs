// Resilient provider wrapper with retries and backoff
//
// Features:
// - Exponential backoff with jitter
// - Retry on 429, 502, 503, 504 status codes
// - Network error and timeout retry
// - Cancellation-aware: never retries after the token fires

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{EmbeddingError, EmbeddingProvider, Result};

/// Configuration for retry behaviour.
#[derive(Debug, Clone)]
pub struct RetryConfig {
  /// Maximum number of retry attempts
  pub max_retries: u32,
  /// Initial backoff duration
  pub initial_backoff: Duration,
  /// Maximum backoff duration
  pub max_backoff: Duration,
  /// Backoff multiplier (exponential factor)
  pub backoff_multiplier: f64,
  /// Whether to add jitter to backoff
  pub add_jitter: bool,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_retries: 3,
      initial_backoff: Duration::from_secs(1),
      max_backoff: Duration::from_secs(30),
      backoff_multiplier: 2.0,
      add_jitter: true,
    }
  }
}

impl RetryConfig {
  /// Calculate backoff duration for a given attempt
  pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
    let base = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
    let mut backoff = Duration::from_secs_f64(base.min(self.max_backoff.as_secs_f64()));

    if self.add_jitter {
      // Up to 25% jitter
      let jitter_factor = 1.0 + (rand_f64() * 0.25);
      backoff = Duration::from_secs_f64(backoff.as_secs_f64() * jitter_factor);
    }

    backoff.min(self.max_backoff)
  }
}

/// A simple pseudo-random number generator for jitter (no external deps)
fn rand_f64() -> f64 {
  use std::time::{SystemTime, UNIX_EPOCH};

  let nanos = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .subsec_nanos();

  (nanos as f64 / u32::MAX as f64).fract()
}

/// Check if an error is worth retrying
pub fn is_retryable_error(error: &EmbeddingError) -> bool {
  match error {
    EmbeddingError::Timeout => true,
    EmbeddingError::Request(_) => true,
    EmbeddingError::Provider(msg) => {
      // Retryable status codes surface in the message
      msg.contains("429") // Rate limited
        || msg.contains("502") // Bad gateway
        || msg.contains("503") // Service unavailable
        || msg.contains("504") // Gateway timeout
    }
    _ => false,
  }
}

/// Wraps another provider with retry logic for transient failures.
pub struct ResilientProvider<P: EmbeddingProvider> {
  inner: P,
  config: RetryConfig,
}

impl<P: EmbeddingProvider> ResilientProvider<P> {
  pub fn new(provider: P) -> Self {
    Self {
      inner: provider,
      config: RetryConfig::default(),
    }
  }

  pub fn with_config(provider: P, config: RetryConfig) -> Self {
    Self {
      inner: provider,
      config,
    }
  }

  async fn embed_with_retry(&self, cancel: &CancellationToken, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let max_retries = self.config.max_retries;
    let mut last_error = None;

    for attempt in 0..=max_retries {
      if attempt > 0 {
        let backoff = self.config.backoff_for_attempt(attempt - 1);
        debug!(
          attempt,
          max_retries,
          backoff_ms = backoff.as_millis(),
          "Retrying embed after backoff"
        );
        tokio::select! {
          biased;
          _ = cancel.cancelled() => return Err(EmbeddingError::Cancelled),
          _ = sleep(backoff) => {}
        }
      }

      match self.inner.embed(cancel, texts).await {
        Ok(result) => {
          if attempt > 0 {
            info!(attempt, "Embed succeeded after retry");
          }
          return Ok(result);
        }
        Err(EmbeddingError::Cancelled) => return Err(EmbeddingError::Cancelled),
        Err(e) if is_retryable_error(&e) && attempt < max_retries => {
          warn!(attempt = attempt + 1, max_retries, err = %e, "Retryable error, will retry");
          last_error = Some(e);
        }
        Err(e) => return Err(e),
      }
    }

    warn!(max_retries, "All retries exhausted");
    Err(last_error.unwrap_or_else(|| EmbeddingError::Provider("max retries exceeded".to_string())))
  }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for ResilientProvider<P> {
  fn name(&self) -> &str {
    self.inner.name()
  }

  fn dimensions(&self) -> usize {
    self.inner.dimensions()
  }

  fn max_batch_size(&self) -> usize {
    self.inner.max_batch_size()
  }

  async fn embed(&self, cancel: &CancellationToken, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    self.embed_with_retry(cancel, texts).await
  }

  async fn warmup(&self, cancel: &CancellationToken) -> Result<()> {
    self.inner.warmup(cancel).await
  }

  async fn available(&self, cancel: &CancellationToken) -> bool {
    self.inner.available(cancel).await
  }

  async fn close(&self) {
    self.inner.close().await;
  }
}
