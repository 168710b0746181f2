//! Identifier map store.
//!
//! The vector service only keeps `{id, vector}` pairs, so the text behind
//! each synthetic id lives in a local file with one `id|text` record per
//! line. Ids restart at 0 on every ingest run, which is why a run begins
//! with [`IdMapStore::reset`]: stale lines would otherwise attribute old
//! text to reused ids.
//!
//! Lifecycle:
//! - ingest: `reset` → `append`* → `sync` (before any vector is inserted)
//! - search: `load_all`

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::IdMapEntry;

const DELIMITER: char = '|';

pub struct IdMapStore {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl IdMapStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the store, discarding every previous record.
    pub fn reset(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&self.path)
            .with_context(|| format!("Failed to reset id map: {}", self.path.display()))?;
        self.writer = Some(BufWriter::new(file));
        tracing::debug!(path = %self.path.display(), "id map reset");
        Ok(())
    }

    /// Append one record.
    ///
    /// Records are buffered; call [`sync`](Self::sync) before relying on
    /// them being on disk.
    pub fn append(&mut self, id: &str, text: &str) -> Result<()> {
        debug_assert!(!id.contains(DELIMITER));
        debug_assert!(!text.contains('\n'));

        if self.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .with_context(|| format!("Failed to open id map: {}", self.path.display()))?;
            self.writer = Some(BufWriter::new(file));
        }

        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}{}{}", id, DELIMITER, text)?;
        }
        Ok(())
    }

    /// Flush buffered records and fsync the file.
    pub fn sync(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }

    /// Read every record into an `id → text` map.
    ///
    /// A missing file yields an empty map. Lines without a delimiter or
    /// with invalid UTF-8 are skipped. If an id repeats, the last line wins.
    pub fn load_all(&self) -> Result<HashMap<String, String>> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|entry| (entry.id, entry.text))
            .collect())
    }

    /// Read every well-formed record in file order.
    pub fn entries(&self) -> Result<Vec<IdMapEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "id map does not exist yet");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read id map: {}", self.path.display()))
            }
        };

        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for raw in BufReader::new(file).split(b'\n') {
            let raw = raw?;
            match parse_line(&raw) {
                Some(entry) => entries.push(entry),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!(skipped, "skipped malformed id map lines");
        }

        Ok(entries)
    }
}

fn parse_line(raw: &[u8]) -> Option<IdMapEntry> {
    let line = std::str::from_utf8(raw).ok()?;
    let line = line.strip_suffix('\r').unwrap_or(line);
    let (id, text) = line.split_once(DELIMITER)?;
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    Some(IdMapEntry {
        id: id.to_string(),
        text: text.to_string(),
    })
}
