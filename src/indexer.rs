//! Directory indexing: walk a project tree, parse supported files into
//! documents, vectorize them, and publish a fresh index snapshot.
//!
//! The sparse pipeline is strictly two-pass: pass one accumulates document
//! frequencies over the complete file set, pass two vectorizes. The dense
//! pipeline has no corpus-wide statistic and runs in a single pass.
//!
//! Each run builds a brand-new vectorizer and store, so nothing from a
//! previous index can leak into the new one; the finished snapshot is
//! installed into the [`SharedIndex`] in one atomic swap.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::IndexingConfig;
use crate::models::{Document, IndexStats};
use crate::store::{IndexSnapshot, SharedIndex, VectorStore};
use crate::vectorizer::{tokenize, TfIdfVectorizer, Vectorizer};

/// A single progress event during an index run. Reported on stderr by
/// [`StderrProgress`] so stdout stays parseable.
#[derive(Debug, Clone)]
pub enum IndexEvent {
    Discovered { files: usize },
    /// Sparse pass one: corpus statistics before any vector is finalized.
    ComputingStatistics,
    Indexing { indexed: usize, total: usize },
    /// A file failed to read or parse. Non-fatal; indexing continues.
    FileError { path: String, message: String },
    Done,
}

pub trait IndexProgress: Send + Sync {
    fn report(&self, event: IndexEvent);
}

/// Human-friendly progress on stderr.
pub struct StderrProgress;

impl IndexProgress for StderrProgress {
    fn report(&self, event: IndexEvent) {
        let line = match &event {
            IndexEvent::Discovered { files } => format!("index  discovered {} files\n", files),
            IndexEvent::ComputingStatistics => "index  computing corpus statistics...\n".to_string(),
            IndexEvent::Indexing { indexed, total } => {
                format!("index  {} / {} files\n", indexed, total)
            }
            IndexEvent::FileError { path, message } => {
                format!("index  skipping {}: {}\n", path, message)
            }
            IndexEvent::Done => "index  done\n".to_string(),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl IndexProgress for NoProgress {
    fn report(&self, _event: IndexEvent) {}
}

/// Walks a directory and rebuilds the shared index wholesale.
pub struct DocumentIndexer {
    config: IndexingConfig,
}

impl DocumentIndexer {
    pub fn new(config: IndexingConfig) -> Self {
        Self { config }
    }

    /// Index `root` and install the result into `index`.
    ///
    /// Individual file failures are reported via `progress` and skipped;
    /// only a missing root or a broken exclude pattern aborts the run.
    pub fn index_directory(
        &self,
        root: &Path,
        index: &SharedIndex,
        progress: &dyn IndexProgress,
    ) -> Result<IndexStats> {
        if !root.is_dir() {
            bail!("Index root does not exist: {}", root.display());
        }

        let files = self.collect_files(root)?;
        progress.report(IndexEvent::Discovered { files: files.len() });

        let snapshot = match self.config.vectorizer.as_str() {
            "tfidf" => self.build_sparse(&files, progress)?,
            "dense" => self.build_dense(&files, progress)?,
            other => bail!("Unknown vectorizer: '{}'. Must be tfidf or dense.", other),
        };

        let stats = snapshot.stats.clone();
        index.install(snapshot);
        progress.report(IndexEvent::Done);
        Ok(stats)
    }

    /// Recursively enumerate files matching the extension allow-list,
    /// minus default and configured excludes. Sorted for determinism.
    fn collect_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut excludes = vec![
            "**/.git/**".to_string(),
            "**/target/**".to_string(),
            "**/node_modules/**".to_string(),
        ];
        excludes.extend(self.config.exclude_globs.clone());
        let exclude_set = build_globset(&excludes)?;

        let mut files = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if exclude_set.is_match(relative) {
                continue;
            }

            let extension = path
                .extension()
                .map(|ext| ext.to_string_lossy().to_string())
                .unwrap_or_default();
            if !self.config.extensions.iter().any(|e| *e == extension) {
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Two-pass TF-IDF build: observe frequencies over the whole corpus,
    /// then vectorize against the complete statistics.
    fn build_sparse(
        &self,
        files: &[PathBuf],
        progress: &dyn IndexProgress,
    ) -> Result<IndexSnapshot> {
        let mut vectorizer = TfIdfVectorizer::new();
        let mut store = VectorStore::new();
        let mut stats = IndexStats {
            total_files: files.len(),
            ..IndexStats::default()
        };

        progress.report(IndexEvent::ComputingStatistics);
        for path in files {
            match parse_document(path) {
                Ok(document) => vectorizer.observe_document(&tokenize(&document.content)),
                Err(e) => report_file_error(progress, path, &e),
            }
        }

        for (i, path) in files.iter().enumerate() {
            let document = match parse_document(path) {
                Ok(document) => document,
                Err(e) => {
                    report_file_error(progress, path, &e);
                    continue;
                }
            };

            let tokens = tokenize(&document.content);
            let vector = vectorizer.vectorize(&document.content)?;

            stats.total_tokens += tokens.len();
            bump_type_count(&mut stats, path);
            store.add(document, vector);
            progress.report(IndexEvent::Indexing {
                indexed: i + 1,
                total: files.len(),
            });
        }

        Ok(IndexSnapshot {
            vectorizer: Box::new(vectorizer),
            store,
            stats,
        })
    }

    /// Single-pass dense build: no corpus-dependent statistics.
    #[cfg(feature = "local-embeddings")]
    fn build_dense(
        &self,
        files: &[PathBuf],
        progress: &dyn IndexProgress,
    ) -> Result<IndexSnapshot> {
        let vectorizer = crate::dense::DenseVectorizer::load(&self.config.dense)?;
        let mut store = VectorStore::new();
        let mut stats = IndexStats {
            total_files: files.len(),
            ..IndexStats::default()
        };

        for (i, path) in files.iter().enumerate() {
            let document = match parse_document(path) {
                Ok(document) => document,
                Err(e) => {
                    report_file_error(progress, path, &e);
                    continue;
                }
            };

            let vector = match vectorizer.vectorize(&document.content) {
                Ok(vector) => vector,
                Err(e) => {
                    report_file_error(progress, path, &e);
                    continue;
                }
            };

            stats.total_tokens += tokenize(&document.content).len();
            bump_type_count(&mut stats, path);
            store.add(document, vector);
            progress.report(IndexEvent::Indexing {
                indexed: i + 1,
                total: files.len(),
            });
        }

        Ok(IndexSnapshot {
            vectorizer: Box::new(vectorizer),
            store,
            stats,
        })
    }

    #[cfg(not(feature = "local-embeddings"))]
    fn build_dense(
        &self,
        _files: &[PathBuf],
        _progress: &dyn IndexProgress,
    ) -> Result<IndexSnapshot> {
        bail!("Dense vectorizer requires the 'local-embeddings' feature")
    }
}

fn report_file_error(progress: &dyn IndexProgress, path: &Path, error: &anyhow::Error) {
    progress.report(IndexEvent::FileError {
        path: path.display().to_string(),
        message: error.to_string(),
    });
}

fn bump_type_count(stats: &mut IndexStats, path: &Path) {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    *stats.counts_by_type.entry(extension).or_insert(0) += 1;
}

/// Read one file into a [`Document`] with type/size metadata.
fn parse_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read {}: {}", path.display(), e))?;

    let size = content.len();
    let mut document = Document::new(content, path.display().to_string());
    if let Some(extension) = path.extension() {
        document
            .metadata
            .insert("type".to_string(), extension.to_string_lossy().to_string());
    }
    document
        .metadata
        .insert("size".to_string(), size.to_string());
    Ok(document)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
