//! Query result snapshot discovery and loading.
//!
//! Inputs are JSON files or directories of JSON files. Files are read
//! concurrently; a file that fails to load does not stop the others.

use crate::models::QueryResult;
use anyhow::{Context, Result};
use futures::future::join_all;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration for snapshot discovery.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// File extensions picked up when expanding directories (e.g. ["json"])
    pub extensions: Vec<String>,
    /// Maximum snapshot size in bytes
    pub max_file_size: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["json".to_string()],
            max_file_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl From<&crate::config::InputConfig> for LoadConfig {
    fn from(config: &crate::config::InputConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            max_file_size: config.max_file_size,
        }
    }
}

/// A loaded query result snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Path the snapshot was read from.
    pub path: PathBuf,
    /// Display name: the `name` field, or the file stem.
    pub name: String,
    pub result: QueryResult,
}

/// Outcome of loading a single input file.
#[derive(Debug)]
pub struct LoadOutcome {
    pub path: PathBuf,
    pub snapshot: Result<Snapshot>,
}

/// Snapshot loader.
pub struct SnapshotLoader {
    config: LoadConfig,
}

impl SnapshotLoader {
    /// Create a new loader.
    pub fn new(config: LoadConfig) -> Self {
        Self { config }
    }

    /// Expand the given inputs into snapshot file paths.
    ///
    /// Files are taken as given. Directories contribute their matching,
    /// non-hidden files in name order (not recursively).
    pub fn discover(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for input in inputs {
            if input.is_dir() {
                let before = files.len();
                self.expand_dir(input, &mut files)?;
                debug!(
                    "{} snapshot(s) found in {}",
                    files.len() - before,
                    input.display()
                );
            } else if input.is_file() {
                files.push(input.clone());
            } else {
                return Err(anyhow::anyhow!("Input not found: {}", input.display()));
            }
        }

        Ok(files)
    }

    /// Load every file concurrently, keeping input order.
    pub async fn load_all(&self, paths: &[PathBuf]) -> Vec<LoadOutcome> {
        info!("Loading {} snapshot(s)", paths.len());

        let loads = paths.iter().map(|path| async move {
            LoadOutcome {
                path: path.clone(),
                snapshot: self.load(path).await,
            }
        });

        join_all(loads).await
    }

    /// Load a single snapshot file.
    pub async fn load(&self, path: &Path) -> Result<Snapshot> {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to stat snapshot: {}", path.display()))?;

        if metadata.len() > self.config.max_file_size {
            return Err(anyhow::anyhow!(
                "Snapshot {} is {} bytes, larger than the {} byte limit",
                path.display(),
                metadata.len(),
                self.config.max_file_size
            ));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

        let result: QueryResult = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

        let name = snapshot_name(path, &result);
        debug!(
            "Loaded '{}': {} column(s), {} row(s)",
            name,
            result.items.len(),
            result.rows.len()
        );

        Ok(Snapshot {
            path: path.to_path_buf(),
            name,
            result,
        })
    }

    fn expand_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

        let mut found = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            // Hidden files
            if name.starts_with('.') {
                continue;
            }

            if path.is_file() && self.matches(&path) {
                found.push(path);
            }
        }

        found.sort();
        files.extend(found);
        Ok(())
    }

    /// Check if a file has one of the configured extensions and fits the size limit.
    pub fn matches(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !self.config.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            return false;
        }

        match fs::metadata(path) {
            Ok(metadata) if metadata.len() > self.config.max_file_size => {
                warn!("Skipping oversized snapshot: {}", path.display());
                false
            }
            Ok(_) => true,
            Err(_) => false,
        }
    }
}

/// Display name of a snapshot.
pub fn snapshot_name(path: &Path, result: &QueryResult) -> String {
    if let Some(name) = result.name.as_deref().filter(|n| !n.trim().is_empty()) {
        return name.to_string();
    }

    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
