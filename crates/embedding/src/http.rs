use std::time::Duration;

use async_trait::async_trait;
use scout_core::EmbeddingSettings;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{
  EmbeddingError, EmbeddingProvider, Result,
  validation::{TextValidationConfig, validate_and_truncate},
};

/// Calculate max batch size based on context length
/// Formula: clamp(context_length / avg_chunk_tokens, 1, 64)
fn calculate_max_batch_size(context_length: usize) -> usize {
  let calculated = context_length / 512;
  calculated.clamp(1, 64)
}

/// HTTP embedding provider speaking the Ollama-style `/api/embed` protocol.
///
/// Batches up to `max_batch_size`, truncates each text to the model's
/// character cap before submission, converts returned doubles to single
/// precision, and bounds every network call with the configured timeouts.
#[derive(Debug, Clone)]
pub struct HttpProvider {
  client: reqwest::Client,
  base_url: String,
  model: String,
  dimensions: usize,
  max_batch_size: usize,
  request_timeout: Duration,
  availability_timeout: Duration,
  validation: TextValidationConfig,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
  model: &'a str,
  input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
  embeddings: Vec<Vec<f64>>,
}

impl HttpProvider {
  pub fn new(settings: &EmbeddingSettings) -> Self {
    let max_batch_size = settings
      .max_batch_size
      .unwrap_or_else(|| calculate_max_batch_size(settings.context_length));

    info!(
      base_url = %settings.base_url,
      model = %settings.model,
      dimensions = settings.dimensions,
      max_batch_size,
      "HTTP embedding provider initialized"
    );

    Self {
      client: reqwest::Client::new(),
      base_url: settings.base_url.trim_end_matches('/').to_string(),
      model: settings.model.clone(),
      dimensions: settings.dimensions,
      max_batch_size,
      request_timeout: Duration::from_secs(settings.request_timeout_secs),
      availability_timeout: Duration::from_secs(settings.availability_timeout_secs),
      validation: TextValidationConfig::for_context_length(settings.context_length),
    }
  }

  fn embed_url(&self) -> String {
    format!("{}/api/embed", self.base_url)
  }

  fn tags_url(&self) -> String {
    format!("{}/api/tags", self.base_url)
  }

  /// Submit one sub-batch, bounded by the request timeout and cancellation.
  async fn embed_sub_batch(&self, cancel: &CancellationToken, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let request = self.client.post(self.embed_url()).json(&EmbedRequest {
      model: &self.model,
      input: texts,
    });

    let response = tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(EmbeddingError::Cancelled),
      result = tokio::time::timeout(self.request_timeout, request.send()) => match result {
        Err(_) => return Err(EmbeddingError::Timeout),
        Ok(Err(e)) => return Err(EmbeddingError::Request(e)),
        Ok(Ok(response)) => response,
      },
    };

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(EmbeddingError::Provider(format!("HTTP {status}: {body}")));
    }

    let parsed: EmbedResponse = response.json().await?;
    if parsed.embeddings.len() != texts.len() {
      return Err(EmbeddingError::Provider(format!(
        "provider returned {} embeddings for {} texts",
        parsed.embeddings.len(),
        texts.len()
      )));
    }

    // Convert doubles to single precision and verify consistent widths
    let mut vectors = Vec::with_capacity(parsed.embeddings.len());
    let mut width: Option<usize> = None;
    for embedding in parsed.embeddings {
      let vector: Vec<f32> = embedding.into_iter().map(|v| v as f32).collect();
      match width {
        None => width = Some(vector.len()),
        Some(w) if w != vector.len() => {
          return Err(EmbeddingError::DimensionMismatch {
            expected: w,
            got: vector.len(),
          });
        }
        Some(_) => {}
      }
      vectors.push(vector);
    }

    trace!(texts = texts.len(), width = width.unwrap_or(0), "Embedded sub-batch");
    Ok(vectors)
  }
}

#[async_trait]
impl EmbeddingProvider for HttpProvider {
  fn name(&self) -> &str {
    "ollama"
  }

  fn dimensions(&self) -> usize {
    self.dimensions
  }

  fn max_batch_size(&self) -> usize {
    self.max_batch_size
  }

  async fn embed(&self, cancel: &CancellationToken, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }

    // Truncate oversized texts to the model's character cap
    let prepared: Vec<String> = texts
      .iter()
      .map(|t| validate_and_truncate(t, &self.validation).0)
      .collect();

    let mut vectors = Vec::with_capacity(prepared.len());
    for sub_batch in prepared.chunks(self.max_batch_size) {
      if cancel.is_cancelled() {
        return Err(EmbeddingError::Cancelled);
      }
      let mut batch_vectors = self.embed_sub_batch(cancel, sub_batch).await?;
      vectors.append(&mut batch_vectors);
    }

    Ok(vectors)
  }

  async fn warmup(&self, cancel: &CancellationToken) -> Result<()> {
    debug!(model = %self.model, "Warming up embedding model");
    self.embed(cancel, &["warmup".to_string()]).await.map(|_| ())
  }

  async fn available(&self, cancel: &CancellationToken) -> bool {
    let request = self.client.get(self.tags_url());
    let result = tokio::select! {
      biased;
      _ = cancel.cancelled() => return false,
      result = tokio::time::timeout(self.availability_timeout, request.send()) => result,
    };
    match result {
      Ok(Ok(response)) => response.status().is_success(),
      Ok(Err(e)) => {
        warn!(error = %e, "Embedding provider not reachable");
        false
      }
      Err(_) => {
        warn!("Embedding provider availability check timed out");
        false
      }
    }
  }

  async fn close(&self) {}
}
