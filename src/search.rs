//! Search pipeline.
//!
//! Embeds the query, asks the vector service for the `k` nearest
//! neighbours, decodes the response with [`crate::decode`], and joins each
//! hit with its text from the id map. Results keep the order the service
//! returned; nothing is re-ranked here.

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::config::Config;
use crate::decode::{self, DecodedHit};
use crate::embedding::{self, EmbeddingProvider};
use crate::error::EndeeError;
use crate::id_map::IdMapStore;
use crate::models::{RankedResult, SearchHit, UNKNOWN_CONTENT};
use crate::remote::RemoteIndex;

/// One line of search output.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEntry {
    Ranked(RankedResult),
    /// A hit the decoder could not resolve to an id.
    Unparsed(rmpv::Value),
}

impl SearchEntry {
    pub fn as_ranked(&self) -> Option<&RankedResult> {
        match self {
            SearchEntry::Ranked(result) => Some(result),
            SearchEntry::Unparsed(_) => None,
        }
    }
}

/// Run the `search` command.
pub async fn run_search(config: &Config, query: &str, k: Option<usize>) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        bail!("Please provide a query.");
    }
    let k = k.unwrap_or(config.search.k);
    if k == 0 {
        bail!("k must be >= 1");
    }

    let remote = RemoteIndex::new(&config.remote)?;
    if !remote.probe().await {
        println!("Could not connect to Endee at {}. Is it running?", remote.base_url());
        return Err(EndeeError::Unreachable {
            url: remote.base_url().to_string(),
        }
        .into());
    }

    let provider = embedding::create_provider(&config.embedding, config.index.dim)?;
    let store = IdMapStore::new(&config.store.path);
    let id_map = store.load_all()?;

    let entries = search(config, provider.as_ref(), &remote, &id_map, query, k).await?;

    println!("\nResults for '{}':", query);
    if entries.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let preview_chars = config.search.preview_chars;
    for entry in &entries {
        match entry {
            SearchEntry::Ranked(result) => {
                println!(
                    "[ID: {}] {}... (Score: {})",
                    result.id,
                    result.preview(preview_chars),
                    format_score(result.score)
                );
            }
            SearchEntry::Unparsed(raw) => println!("Raw result: {}", raw),
        }
    }

    Ok(())
}

/// Query the index and resolve hits against `id_map`.
///
/// Embedding failures surface as [`EndeeError::SearchRequest`] so that
/// every failure of this call is one of the search error kinds.
pub async fn search(
    config: &Config,
    provider: &dyn EmbeddingProvider,
    remote: &RemoteIndex,
    id_map: &HashMap<String, String>,
    query: &str,
    k: usize,
) -> Result<Vec<SearchEntry>, EndeeError> {
    let query_vec = embedding::embed_query(provider, query, config.index.dim)
        .await
        .map_err(|e| match e.downcast::<EndeeError>() {
            Ok(known) => known,
            Err(other) => EndeeError::SearchRequest {
                message: format!("failed to embed query: {}", other),
            },
        })?;

    let body = remote.search(&config.index.name, &query_vec, k).await?;
    tracing::debug!(bytes = body.len(), "search response received");

    let hits = decode::decode_response(&body)?;
    Ok(hits
        .into_iter()
        .map(|hit| match hit {
            DecodedHit::Resolved(hit) => SearchEntry::Ranked(resolve(hit, id_map)),
            DecodedHit::Unparsed(raw) => SearchEntry::Unparsed(raw),
        })
        .collect())
}

/// Render a score at full precision, or `n/a` when the hit had none.
pub fn format_score(score: Option<f64>) -> String {
    score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

/// Attach content from the id map, or [`UNKNOWN_CONTENT`].
pub fn resolve(hit: SearchHit, id_map: &HashMap<String, String>) -> RankedResult {
    let content = id_map
        .get(&hit.id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_CONTENT.to_string());
    RankedResult {
        id: hit.id,
        score: hit.score,
        content,
    }
}
