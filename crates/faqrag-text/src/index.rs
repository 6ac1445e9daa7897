use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tantivy::{doc, Index, IndexWriter};
use tracing::{debug, info, warn};

use faqrag_core::types::Chunk;

use crate::tantivy_utils::{build_schema, register_tokenizer, ID_FIELD, TEXT_FIELD};

const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// Rebuilds the sparse index from the full store contents.
///
/// The new index is written to a staging directory beside `index_dir` and
/// swapped in by rename, so a reader opening `index_dir` never sees a
/// half-written index.
pub struct SparseIndexer {
	index_dir: PathBuf,
}

impl SparseIndexer {
	pub fn new(index_dir: impl Into<PathBuf>) -> Self { Self { index_dir: index_dir.into() } }

	pub fn index_dir(&self) -> &Path { &self.index_dir }

	/// Replace the index with one document per chunk. Returns the number of indexed documents.
	pub fn rebuild(&self, chunks: &[Chunk]) -> Result<usize> {
		let staging = self.sibling("staging");
		if staging.exists() { std::fs::remove_dir_all(&staging)?; }
		std::fs::create_dir_all(&staging)?;

		let schema = build_schema();
		let index = Index::create_in_dir(&staging, schema.clone())?;
		register_tokenizer(&index);
		let id_field = schema.get_field(ID_FIELD)?;
		let text_field = schema.get_field(TEXT_FIELD)?;

		let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
		for chunk in chunks {
			writer.add_document(doc!(id_field => chunk.id, text_field => chunk.text.as_str()))?;
		}
		writer.commit()?;
		writer.wait_merging_threads()?;
		debug!(docs = chunks.len(), dir = %staging.display(), "staged sparse index");

		self.swap_in(&staging)?;
		info!(docs = chunks.len(), dir = %self.index_dir.display(), "sparse index rebuilt");
		Ok(chunks.len())
	}

	fn swap_in(&self, staging: &Path) -> Result<()> {
		let old = self.sibling("old");
		if old.exists() { std::fs::remove_dir_all(&old)?; }
		if self.index_dir.exists() {
			std::fs::rename(&self.index_dir, &old).with_context(|| format!("moving aside {}", self.index_dir.display()))?;
		}
		std::fs::rename(staging, &self.index_dir).with_context(|| format!("installing {}", self.index_dir.display()))?;
		if old.exists() {
			if let Err(e) = std::fs::remove_dir_all(&old) { warn!(dir = %old.display(), error = %e, "could not remove previous sparse index"); }
		}
		Ok(())
	}

	/// `.{name}.{suffix}` next to the index directory.
	fn sibling(&self, suffix: &str) -> PathBuf {
		let name = self.index_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "sparse".to_string());
		let parent = self.index_dir.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
		parent.join(format!(".{name}.{suffix}"))
	}
}
