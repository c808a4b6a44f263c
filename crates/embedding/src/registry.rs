//! Write-once provider registry.
//!
//! Maps string names to factories so the engine can accept different
//! embedding and reranking models without recompilation. Registration
//! happens at startup; after [`ProviderRegistry::freeze`] the registry is
//! read-only, which keeps it safe to share as the one process-wide global.

use std::{
  collections::HashMap,
  sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
  },
};

use scout_core::EmbeddingSettings;

use crate::{EmbeddingError, EmbeddingProvider, HttpProvider, Reranker, Result};

type ProviderFactory = Box<dyn Fn(&EmbeddingSettings) -> Result<Arc<dyn EmbeddingProvider>> + Send + Sync>;
type RerankerFactory = Box<dyn Fn(&EmbeddingSettings) -> Result<Arc<dyn Reranker>> + Send + Sync>;

pub struct ProviderRegistry {
  providers: RwLock<HashMap<String, ProviderFactory>>,
  rerankers: RwLock<HashMap<String, RerankerFactory>>,
  frozen: AtomicBool,
}

impl ProviderRegistry {
  /// Registry pre-populated with the bundled providers.
  pub fn with_defaults() -> Self {
    let registry = Self {
      providers: RwLock::new(HashMap::new()),
      rerankers: RwLock::new(HashMap::new()),
      frozen: AtomicBool::new(false),
    };
    registry
      .register_provider("ollama", |settings| {
        // Transient HTTP failures (429/5xx, timeouts) retry with backoff.
        Ok(Arc::new(crate::ResilientProvider::new(HttpProvider::new(settings))))
      })
      .expect("registry is not frozen yet");
    registry
      .register_provider("mock", |settings| {
        Ok(Arc::new(crate::mock::MockProvider::new(settings.dimensions)))
      })
      .expect("registry is not frozen yet");
    registry
      .register_reranker("mock-reranker", |_| Ok(Arc::new(crate::mock::MockReranker::new())))
      .expect("registry is not frozen yet");
    registry
  }

  /// Register an embedding provider factory. Fails after `freeze`.
  pub fn register_provider<F>(&self, name: &str, factory: F) -> Result<()>
  where
    F: Fn(&EmbeddingSettings) -> Result<Arc<dyn EmbeddingProvider>> + Send + Sync + 'static,
  {
    if self.frozen.load(Ordering::SeqCst) {
      return Err(EmbeddingError::Provider("registry is frozen".to_string()));
    }
    self
      .providers
      .write()
      .expect("registry lock poisoned")
      .insert(name.to_string(), Box::new(factory));
    Ok(())
  }

  /// Register a reranker factory. Fails after `freeze`.
  pub fn register_reranker<F>(&self, name: &str, factory: F) -> Result<()>
  where
    F: Fn(&EmbeddingSettings) -> Result<Arc<dyn Reranker>> + Send + Sync + 'static,
  {
    if self.frozen.load(Ordering::SeqCst) {
      return Err(EmbeddingError::Provider("registry is frozen".to_string()));
    }
    self
      .rerankers
      .write()
      .expect("registry lock poisoned")
      .insert(name.to_string(), Box::new(factory));
    Ok(())
  }

  /// Make the registry read-only. Idempotent.
  pub fn freeze(&self) {
    self.frozen.store(true, Ordering::SeqCst);
  }

  pub fn create_provider(&self, settings: &EmbeddingSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    let providers = self.providers.read().expect("registry lock poisoned");
    let factory = providers
      .get(&settings.provider)
      .ok_or_else(|| EmbeddingError::UnknownProvider(settings.provider.clone()))?;
    factory(settings)
  }

  pub fn create_reranker(&self, settings: &EmbeddingSettings) -> Result<Option<Arc<dyn Reranker>>> {
    let Some(name) = settings.reranker.as_deref() else {
      return Ok(None);
    };
    let rerankers = self.rerankers.read().expect("registry lock poisoned");
    let factory = rerankers
      .get(name)
      .ok_or_else(|| EmbeddingError::UnknownProvider(name.to_string()))?;
    factory(settings).map(Some)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mock_settings() -> EmbeddingSettings {
    EmbeddingSettings {
      provider: "mock".to_string(),
      dimensions: 16,
      ..Default::default()
    }
  }

  #[test]
  fn test_create_default_providers() {
    let registry = ProviderRegistry::with_defaults();
    let provider = registry.create_provider(&mock_settings()).unwrap();
    assert_eq!(provider.name(), "mock");
    assert_eq!(provider.dimensions(), 16);
  }

  #[test]
  fn test_unknown_provider_errors() {
    let registry = ProviderRegistry::with_defaults();
    let mut settings = mock_settings();
    settings.provider = "nope".to_string();
    let err = registry.create_provider(&settings).unwrap_err();
    assert!(matches!(err, EmbeddingError::UnknownProvider(_)));
  }

  #[test]
  fn test_frozen_registry_rejects_registration() {
    let registry = ProviderRegistry::with_defaults();
    registry.freeze();
    let result = registry.register_provider("late", |settings| {
      Ok(Arc::new(crate::mock::MockProvider::new(settings.dimensions)))
    });
    assert!(result.is_err());

    // creation keeps working after freeze
    assert!(registry.create_provider(&mock_settings()).is_ok());
  }

  #[test]
  fn test_reranker_creation_is_optional() {
    let registry = ProviderRegistry::with_defaults();
    let mut settings = mock_settings();
    assert!(registry.create_reranker(&settings).unwrap().is_none());

    settings.reranker = Some("mock-reranker".to_string());
    let reranker = registry.create_reranker(&settings).unwrap().unwrap();
    assert_eq!(reranker.name(), "mock-reranker");
  }
}
