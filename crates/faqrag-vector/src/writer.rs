use anyhow::{anyhow, bail, Result};
use arrow_array::RecordBatchIterator;
use lancedb::{Connection, Table};
use std::path::Path;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::schema::{vector_dim, vectors_to_record_batch, TABLE_NAME};
use crate::table::{open_db, open_table_if_exists};

/// Dense index over one LanceDB table. Row `id` holds the embedding of store chunk `id`.
///
/// The async LanceDB API is driven by a private runtime; every method blocks.
pub struct LanceDenseIndex {
	pub(crate) rt: Runtime,
	pub(crate) db: Connection,
	pub(crate) table_name: String,
}

impl LanceDenseIndex {
	pub fn open(db_path: &Path) -> Result<Self> {
		let rt = Runtime::new()?;
		let uri = db_path.to_string_lossy().to_string();
		let db = rt.block_on(open_db(&uri))?;
		debug!(%uri, "dense index opened");
		Ok(Self { rt, db, table_name: TABLE_NAME.to_string() })
	}

	pub(crate) fn table(&self) -> Result<Option<Table>> {
		self.rt.block_on(open_table_if_exists(&self.db, &self.table_name))
	}

	/// Number of stored vectors; zero when the table does not exist.
	pub fn len(&self) -> Result<usize> {
		match self.table()? {
			Some(table) => Ok(self.rt.block_on(table.count_rows(None))?),
			None => Ok(0),
		}
	}

	pub fn is_empty(&self) -> Result<bool> { Ok(self.len()? == 0) }

	/// Embedding dimension the table was created with.
	pub fn dim(&self) -> Result<Option<usize>> {
		match self.table()? {
			Some(table) => Ok(vector_dim(&self.rt.block_on(table.schema())?)),
			None => Ok(None),
		}
	}

	/// Append rows `first_id..` ; `first_id` must equal the current row count.
	pub fn append(&self, first_id: u64, vectors: &[Vec<f32>]) -> Result<()> {
		if vectors.is_empty() { return Ok(()); }
		let dim = vectors[0].len();
		if dim == 0 { bail!("cannot index zero-dimensional vectors"); }
		if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
			bail!("inconsistent embedding dimensions: {} vs {}", dim, bad.len());
		}
		let existing = self.len()?;
		if first_id != existing as u64 {
			bail!("dense index has {existing} rows, cannot append at id {first_id}");
		}

		let batch = vectors_to_record_batch(first_id, vectors, dim)?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		match self.table()? {
			Some(table) => {
				let table_dim = vector_dim(&self.rt.block_on(table.schema())?).ok_or_else(|| anyhow!("dense table has no vector column"))?;
				if table_dim != dim { bail!("embedding dimension {dim} does not match index dimension {table_dim}"); }
				self.rt.block_on(async { table.add(reader).execute().await })?;
			}
			None => {
				self.rt.block_on(async { self.db.create_table(&self.table_name, reader).execute().await })?;
			}
		}
		info!(rows = vectors.len(), first_id, dim, "dense vectors appended");
		Ok(())
	}

	/// Delete every row with `id >= len`.
	pub fn truncate_to(&self, len: usize) -> Result<usize> {
		let Some(table) = self.table()? else { return Ok(0) };
		let current = self.rt.block_on(table.count_rows(None))?;
		if current <= len { return Ok(0); }
		self.rt.block_on(table.delete(&format!("id >= {len}")))?;
		let removed = current - len;
		warn!(removed, kept = len, "dense index truncated to store length");
		Ok(removed)
	}
}
