use anyhow::{anyhow, Result};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::DistanceType;

use faqrag_core::traits::VectorSearcher;
use faqrag_core::types::{SearchHit, SourceKind};

use crate::schema::ID_COLUMN;
use crate::writer::LanceDenseIndex;

impl LanceDenseIndex {
	/// Exact inner-product search over every row. Score is the dot product.
	pub fn search_vec(&self, q_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 { return Ok(Vec::new()); }
		let Some(table) = self.table()? else { return Ok(Vec::new()) };
		let batches = self.rt.block_on(async {
			let stream = table
				.vector_search(q_vec.to_vec())?
				.distance_type(DistanceType::Dot)
				.bypass_vector_index()
				.select(Select::columns(&[ID_COLUMN]))
				.limit(k)
				.execute()
				.await?;
			stream.try_collect::<Vec<_>>().await
		})?;

		let mut hits = Vec::new();
		for batch in batches {
			let ids = batch.column_by_name(ID_COLUMN).and_then(|c| c.as_any().downcast_ref::<arrow_array::Int64Array>()).ok_or_else(|| anyhow!("id column missing from dense results"))?;
			let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<arrow_array::Float32Array>()).ok_or_else(|| anyhow!("_distance column missing from dense results"))?;
			for i in 0..batch.num_rows() {
				let Ok(id) = u64::try_from(ids.value(i)) else { continue };
				hits.push(SearchHit { id, score: 1.0 - distances.value(i), source: SourceKind::Dense });
			}
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
		hits.truncate(k);
		Ok(hits)
	}
}

impl VectorSearcher for LanceDenseIndex {
	fn search_vec(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>> { LanceDenseIndex::search_vec(self, query_vec, k) }

	fn len(&self) -> anyhow::Result<usize> { LanceDenseIndex::len(self) }
}
