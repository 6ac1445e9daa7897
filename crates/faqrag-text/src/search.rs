use anyhow::Result;
use std::path::Path;
use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{Index, Searcher, TantivyDocument, Term};
use tracing::debug;

use faqrag_core::traits::TextSearcher;
use faqrag_core::types::{ChunkId, SearchHit, SourceKind};

use crate::tantivy_utils::{analyze, register_tokenizer, ID_FIELD, TEXT_FIELD};

struct OpenIndex {
	index: Index,
	searcher: Searcher,
	id_field: Field,
	text_field: Field,
}

/// Read side of the sparse index. An absent index behaves as an empty one.
pub struct SparseSearcher {
	inner: Option<OpenIndex>,
}

impl SparseSearcher {
	pub fn open(index_dir: &Path) -> Result<Self> {
		if !index_dir.join("meta.json").exists() {
			debug!(dir = %index_dir.display(), "no sparse index");
			return Ok(Self { inner: None });
		}
		let index = Index::open_in_dir(index_dir)?;
		register_tokenizer(&index);
		let reader = index.reader()?; let searcher = reader.searcher();
		let schema = index.schema();
		let id_field = schema.get_field(ID_FIELD)?;
		let text_field = schema.get_field(TEXT_FIELD)?;
		Ok(Self { inner: Some(OpenIndex { index, searcher, id_field, text_field }) })
	}

	pub fn is_built(&self) -> bool { self.inner.is_some() }

	pub fn num_docs(&self) -> u64 { self.inner.as_ref().map(|i| i.searcher.num_docs()).unwrap_or(0) }

	/// Every indexed `(id, text)` in id order.
	pub fn texts(&self) -> Result<Vec<(ChunkId, String)>> {
		let Some(inner) = &self.inner else { return Ok(Vec::new()) };
		let addrs = inner.searcher.search(&tantivy::query::AllQuery, &DocSetCollector)?;
		let mut out = Vec::with_capacity(addrs.len());
		for addr in addrs {
			let doc: TantivyDocument = inner.searcher.doc(addr)?;
			let id = doc.get_first(inner.id_field).and_then(|v| v.as_u64()).unwrap_or_default();
			let text = doc.get_first(inner.text_field).and_then(|v| v.as_str()).unwrap_or_default().to_string();
			out.push((id, text));
		}
		out.sort_by_key(|(id, _)| *id);
		Ok(out)
	}

	/// BM25 over the query's tokens. Ties keep store order.
	pub fn search_text(&self, query_text: &str, k: usize) -> Result<Vec<SearchHit>> {
		let Some(inner) = &self.inner else { return Ok(Vec::new()) };
		let num_docs = inner.searcher.num_docs() as usize;
		if k == 0 || num_docs == 0 { return Ok(Vec::new()); }

		let tokens = analyze(&inner.index, inner.text_field, query_text)?;
		if tokens.is_empty() { return Ok(Vec::new()); }
		let clauses: Vec<(Occur, Box<dyn Query>)> = tokens.iter()
			.map(|t| {
				let term = Term::from_field_text(inner.text_field, t);
				(Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
			})
			.collect();
		let query = BooleanQuery::new(clauses);

		let top_docs = inner.searcher.search(&query, &TopDocs::with_limit(num_docs))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = inner.searcher.doc(addr)?;
			let Some(id) = doc.get_first(inner.id_field).and_then(|v| v.as_u64()) else { continue };
			hits.push(SearchHit { id, score, source: SourceKind::Sparse });
		}
		hits.sort_by_key(|h| h.id);
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(k);
		Ok(hits)
	}
}

impl TextSearcher for SparseSearcher {
	fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>> { self.search_text(query, k) }

	fn len(&self) -> anyhow::Result<usize> { Ok(self.num_docs() as usize) }
}
