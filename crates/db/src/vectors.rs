//! Embedding blob encoding and similarity.

/// Serialize an embedding as little-endian f32 bytes.
pub fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
  vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize little-endian f32 bytes back into an embedding.
pub fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
  bytes
    .chunks_exact(4)
    .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    .collect()
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when either vector is zero or lengths disagree.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() || a.is_empty() {
    return 0.0;
  }

  let mut dot = 0.0f32;
  let mut norm_a = 0.0f32;
  let mut norm_b = 0.0f32;
  for (x, y) in a.iter().zip(b) {
    dot += x * y;
    norm_a += x * x;
    norm_b += y * y;
  }

  if norm_a == 0.0 || norm_b == 0.0 {
    return 0.0;
  }

  dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_round_trip() {
    let v = vec![0.5f32, -1.25, 3.0, 0.0];
    assert_eq!(bytes_to_vector(&vector_to_bytes(&v)), v);
  }

  #[test]
  fn test_cosine_identical_is_one() {
    let v = vec![1.0f32, 2.0, 3.0];
    assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn test_cosine_orthogonal_is_zero() {
    let a = vec![1.0f32, 0.0];
    let b = vec![0.0f32, 1.0];
    assert!(cosine_similarity(&a, &b).abs() < 1e-6);
  }

  #[test]
  fn test_cosine_opposite_is_negative_one() {
    let a = vec![1.0f32, 1.0];
    let b = vec![-1.0f32, -1.0];
    assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
  }

  #[test]
  fn test_mismatched_lengths_score_zero() {
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
  }
}
