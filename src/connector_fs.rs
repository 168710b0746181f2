//! Source document discovery.
//!
//! Walks `ingest.root` and returns files whose extension is on the
//! allow-list. By default only the top level of the directory is scanned;
//! set `ingest.recursive = true` to descend.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::IngestConfig;

/// Eligible files under `config.root`, sorted by path.
///
/// A missing root yields no files; the caller reports that as nothing to
/// ingest.
pub fn scan_sources(config: &IngestConfig) -> Result<Vec<PathBuf>> {
    let root = &config.root;
    if !root.is_dir() {
        tracing::warn!(root = %root.display(), "source directory does not exist");
        return Ok(Vec::new());
    }

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    if !config.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);

        if exclude_set.is_match(relative) {
            continue;
        }

        if !has_allowed_extension(path, &config.extensions) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
