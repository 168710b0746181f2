//! Core data models used throughout endee-rag.
//!
//! These types represent the vector records, index descriptors, and search
//! results that flow through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// Content shown for a hit whose identifier has no entry in the id map.
pub const UNKNOWN_CONTENT: &str = "Unknown Content";

/// A vector ready for insertion into the remote index.
///
/// Serializes to the `{id, vector}` object the insert endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
}

/// One `id|text` line of the identifier map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMapEntry {
    pub id: String,
    pub text: String,
}

/// Similarity metric of a vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpaceType {
    #[default]
    #[serde(rename = "cosine")]
    Cosine,
    #[serde(rename = "l2")]
    L2,
    #[serde(rename = "ip", alias = "inner_product")]
    InnerProduct,
}

impl SpaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceType::Cosine => "cosine",
            SpaceType::L2 => "l2",
            SpaceType::InnerProduct => "ip",
        }
    }
}

/// The index the ingestion pipeline writes into.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescriptor {
    pub name: String,
    pub dim: usize,
    pub space_type: SpaceType,
    pub precision: Option<String>,
}

/// Result of [`RemoteIndex::ensure_index`](crate::remote::RemoteIndex::ensure_index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    AlreadyExists,
}

/// A hit as reported by the vector service, before content lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    /// Similarity or distance, depending on the index metric. `None` when
    /// the service sent no numeric score for this hit.
    pub score: Option<f64>,
}

/// A search hit joined with the text it was indexed from.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub id: String,
    pub score: Option<f64>,
    pub content: String,
}

impl RankedResult {
    /// The first `max_chars` characters of the content.
    pub fn preview(&self, max_chars: usize) -> String {
        self.content.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_record_wire_shape() {
        let record = VectorRecord {
            id: "3".to_string(),
            vector: vec![0.5, -1.0],
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"id": "3", "vector": [0.5, -1.0]}));
    }

    #[test]
    fn test_space_type_wire_names() {
        assert_eq!(SpaceType::Cosine.as_str(), "cosine");
        assert_eq!(
            serde_json::to_value(SpaceType::InnerProduct).unwrap(),
            serde_json::json!("ip")
        );
    }

    #[test]
    fn test_preview_counts_chars_not_bytes() {
        let result = RankedResult {
            id: "0".to_string(),
            score: Some(0.9),
            content: "héllo wörld".to_string(),
        };
        assert_eq!(result.preview(5), "héllo");
        assert_eq!(result.preview(100), "héllo wörld");
        assert_eq!(result.content, "héllo wörld");
    }
}
