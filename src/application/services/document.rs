//! Document service
//!
//! Loads a forest document from JSON, runs edits through the tree engine and
//! writes the result back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::edit::Edit;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt, JsonResultExt};
use crate::domain::{self, BlockId, BlockRef, Forest, TreeEngine};
use crate::infrastructure::traits::FileSystem;

/// Structural summary of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    /// Root-level blocks
    pub roots: usize,
    /// Blocks at every level
    pub blocks: usize,
    /// Blocks holding at least one child
    pub containers: usize,
    /// Number of levels
    pub depth: usize,
    /// Ids that occur more than once
    pub duplicates: Vec<BlockId>,
}

impl DocumentReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
    }
}

/// Service for loading, editing and saving forest documents.
pub struct DocumentService {
    fs: Arc<dyn FileSystem>,
    engine: TreeEngine,
    pretty: bool,
}

impl DocumentService {
    /// Create a new document service.
    pub fn new(fs: Arc<dyn FileSystem>, engine: TreeEngine) -> Self {
        Self {
            fs,
            engine,
            pretty: true,
        }
    }

    /// Pretty-print JSON output (default) or emit it compact.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn engine(&self) -> &TreeEngine {
        &self.engine
    }

    /// Read and parse a forest document.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Forest> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::DocumentMissing {
                path: path.to_path_buf(),
            });
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read document", path)?;
        let forest: Forest = serde_json::from_str(&content).with_document_context(path)?;
        debug!(roots = forest.len(), "loaded document");
        Ok(forest)
    }

    /// Read and parse an edit script (a JSON array of edits).
    #[instrument(level = "debug", skip(self))]
    pub fn load_script(&self, path: &Path) -> ApplicationResult<Vec<Edit>> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read edit script", path)?;
        serde_json::from_str(&content).with_document_context(path)
    }

    /// Serialize a forest the way `save` writes it.
    pub fn render(&self, forest: &[BlockRef]) -> ApplicationResult<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(forest)
        } else {
            serde_json::to_string(forest)
        };
        rendered
            .map(|json| json + "\n")
            .map_err(|e| ApplicationError::OperationFailed {
                context: "serialize document".to_string(),
                source: Box::new(e),
            })
    }

    /// Write a forest back to `path`.
    ///
    /// Content goes to a sibling temp file first and is renamed over the target,
    /// so readers never observe a half-written document.
    #[instrument(level = "debug", skip(self, forest))]
    pub fn save(&self, path: &Path, forest: &[BlockRef]) -> ApplicationResult<()> {
        let content = self.render(forest)?;
        let staging = staging_path(path);

        self.fs
            .ensure_parent(path)
            .with_path_context("create parent directory", path)?;
        self.fs
            .write(&staging, &content)
            .with_path_context("write document", &staging)?;
        self.fs
            .rename(&staging, path)
            .with_path_context("replace document", path)?;

        info!(path = %path.display(), "document saved");
        Ok(())
    }

    /// Apply `edits` in order. Any failure aborts the whole batch.
    #[instrument(level = "debug", skip(self, forest, edits), fields(edits = edits.len()))]
    pub fn apply(&self, forest: &[BlockRef], edits: &[Edit]) -> ApplicationResult<Forest> {
        let mut current = forest.to_vec();
        for (position, edit) in edits.iter().enumerate() {
            current = edit
                .apply(&self.engine, &current)
                .map_err(|source| ApplicationError::EditFailed {
                    position,
                    source: Box::new(source),
                })?;
        }
        Ok(current)
    }

    /// Load, edit and save in one step. Returns the new forest.
    pub fn edit_file(&self, path: &Path, edits: &[Edit]) -> ApplicationResult<Forest> {
        let forest = self.load(path)?;
        let edited = self.apply(&forest, edits)?;
        if domain::is_unchanged(&forest, &edited) {
            debug!("edits left the document unchanged, skipping write");
        } else {
            self.save(path, &edited)?;
        }
        Ok(edited)
    }

    /// Summarize a forest's structure and id hygiene.
    pub fn report(&self, forest: &[BlockRef]) -> DocumentReport {
        let mut containers = 0;
        let _ = domain::visit::walk::<(), _>(forest, &mut |block, _| {
            if block.is_container() {
                containers += 1;
            }
            std::ops::ControlFlow::Continue(())
        });

        DocumentReport {
            roots: forest.len(),
            blocks: domain::count(forest),
            containers,
            depth: domain::depth(forest),
            duplicates: domain::duplicate_ids(forest),
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
