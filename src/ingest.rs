//! Ingestion pipeline orchestration.
//!
//! Coordinates the `ingest` command: health probe → index provisioning →
//! id map reset → discovery → line splitting → embedding → batched insert.
//!
//! Ids are assigned before batching, so the insert batch size never
//! changes which id a line receives. Insert batches are independent: a
//! rejected batch is recorded and the remaining batches are still sent.

use anyhow::{bail, Result};

use crate::chunk::{batch_ranges, split_units};
use crate::config::{Config, IndexConfig};
use crate::connector_fs;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::EndeeError;
use crate::id_map::IdMapStore;
use crate::models::{EnsureOutcome, IndexDescriptor, VectorRecord};
use crate::remote::RemoteIndex;

/// What a finished ingest run did.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub files: usize,
    pub files_skipped: usize,
    pub units: usize,
    /// Vectors in batches the service accepted.
    pub inserted: usize,
    pub chunks_ok: usize,
    /// One [`EndeeError::ChunkInsert`] per rejected batch.
    pub chunk_errors: Vec<EndeeError>,
}

impl IngestReport {
    pub fn chunks_total(&self) -> usize {
        self.chunks_ok + self.chunk_errors.len()
    }
}

#[derive(Debug)]
pub enum IngestOutcome {
    /// No eligible files, or no non-blank lines in them.
    NothingToIngest { reason: String },
    Completed(IngestReport),
}

pub fn index_descriptor(config: &IndexConfig) -> IndexDescriptor {
    IndexDescriptor {
        name: config.name.clone(),
        dim: config.dim,
        space_type: config.space_type,
        precision: config.precision.clone(),
    }
}

/// Run the `ingest` command.
pub async fn run_ingest(config: &Config) -> Result<()> {
    let remote = RemoteIndex::new(&config.remote)?;

    if !remote.probe().await {
        println!("Could not connect to Endee at {}. Is it running?", remote.base_url());
        return Err(EndeeError::Unreachable {
            url: remote.base_url().to_string(),
        }
        .into());
    }
    println!("Endee is reachable.");

    let descriptor = index_descriptor(&config.index);
    println!("Creating index '{}'...", descriptor.name);
    match remote.ensure_index(&descriptor).await? {
        EnsureOutcome::Created => println!("Index created successfully."),
        EnsureOutcome::AlreadyExists => println!("Index already exists."),
    }

    let provider = embedding::create_provider(&config.embedding, config.index.dim)?;
    tracing::info!(model = provider.model_name(), "embedding provider ready");

    let mut store = IdMapStore::new(&config.store.path);
    let outcome = ingest(config, provider.as_ref(), &remote, &mut store).await?;

    let report = match outcome {
        IngestOutcome::NothingToIngest { reason } => {
            println!("Nothing to ingest: {}", reason);
            return Ok(());
        }
        IngestOutcome::Completed(report) => report,
    };

    println!("ingest {}", descriptor.name);
    println!("  files: {}", report.files);
    if report.files_skipped > 0 {
        println!("  files skipped: {}", report.files_skipped);
    }
    println!("  lines: {}", report.units);
    println!("  vectors inserted: {}", report.inserted);
    println!(
        "  chunks: {} ok, {} failed",
        report.chunks_ok,
        report.chunk_errors.len()
    );

    if !report.chunk_errors.is_empty() {
        bail!(
            "{} of {} chunks failed to insert",
            report.chunk_errors.len(),
            report.chunks_total()
        );
    }

    println!("ok");
    Ok(())
}

/// Ingest every eligible file under `config.ingest.root`.
///
/// Resets `store` first; ids restart at 0. Mapping records are synced to
/// disk before the first insert request is sent.
pub async fn ingest(
    config: &Config,
    provider: &dyn EmbeddingProvider,
    remote: &RemoteIndex,
    store: &mut IdMapStore,
) -> Result<IngestOutcome> {
    store.reset()?;

    let files = connector_fs::scan_sources(&config.ingest)?;
    if files.is_empty() {
        return Ok(IngestOutcome::NothingToIngest {
            reason: format!("no files found in {}", config.ingest.root.display()),
        });
    }

    let dim = config.index.dim;
    let mut report = IngestReport::default();
    let mut records: Vec<VectorRecord> = Vec::new();
    let mut next_id: u64 = 0;

    for path in &files {
        println!("Processing {}...", path.display());
        let body = match std::fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                report.files_skipped += 1;
                continue;
            }
        };
        report.files += 1;

        let units = split_units(&body);
        for batch in units.chunks(config.embedding.batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|unit| unit.to_string()).collect();
            let vectors = embedding::embed_checked(provider, &texts, dim).await?;

            for (text, vector) in texts.into_iter().zip(vectors) {
                let id = next_id.to_string();
                next_id += 1;
                store.append(&id, &text)?;
                records.push(VectorRecord { id, vector });
            }
        }
    }

    store.sync()?;
    report.units = records.len();

    if records.is_empty() {
        return Ok(IngestOutcome::NothingToIngest {
            reason: "no non-empty lines in source files".to_string(),
        });
    }

    println!("Inserting {} vectors...", records.len());
    for range in batch_ranges(records.len(), config.ingest.chunk_size) {
        let chunk = &records[range.clone()];
        match remote.insert(&config.index.name, chunk, range.clone()).await {
            Ok(()) => {
                println!("Inserted chunk {}-{}", range.start, range.end);
                report.inserted += chunk.len();
                report.chunks_ok += 1;
            }
            Err(e) => {
                tracing::warn!(start = range.start, end = range.end, error = %e, "chunk insert failed");
                report.chunk_errors.push(e);
            }
        }
    }

    Ok(IngestOutcome::Completed(report))
}
