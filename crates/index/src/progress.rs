use serde::{Deserialize, Serialize};

/// Indexing pass phases, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexPhase {
  Scan,
  Filter,
  Chunk,
  Embed,
  Commit,
  Cleanup,
  Done,
}

/// A progress record, emitted at phase transitions and at bounded intervals
/// within a phase. Warnings ride along and never terminate the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexProgress {
  pub phase: IndexPhase,
  pub total_files: usize,
  pub processed_files: usize,
  pub total_chunks: usize,
  pub processed_chunks: usize,
  pub current_file: Option<String>,
  pub warning: Option<String>,
}

impl IndexProgress {
  pub fn phase(phase: IndexPhase, total_files: usize) -> Self {
    Self {
      phase,
      total_files,
      processed_files: 0,
      total_chunks: 0,
      processed_chunks: 0,
      current_file: None,
      warning: None,
    }
  }

  pub fn with_files(mut self, processed: usize) -> Self {
    self.processed_files = processed;
    self
  }

  pub fn with_chunks(mut self, processed: usize, total: usize) -> Self {
    self.processed_chunks = processed;
    self.total_chunks = total;
    self
  }

  pub fn with_current_file(mut self, file: impl Into<String>) -> Self {
    self.current_file = Some(file.into());
    self
  }

  pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
    self.warning = Some(warning.into());
    self
  }
}
