//! faqrag-text
//!
//! Tantivy-backed sparse (BM25) index over chunk texts. Corpus and queries go
//! through the same analyzer: whitespace split, then lowercase.
use tantivy::schema::{Schema, TextFieldIndexing, TextOptions, IndexRecordOption, FAST, INDEXED, STORED};
use tantivy::tokenizer::{TextAnalyzer, TokenStream, WhitespaceTokenizer, LowerCaser};
use tantivy::Index;

pub const TOKENIZER_NAME: &str = "faq_whitespace";
pub const ID_FIELD: &str = "id";
pub const TEXT_FIELD: &str = "text";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _id_field = schema_builder.add_u64_field(ID_FIELD, INDEXED | STORED | FAST);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER_NAME).set_index_option(IndexRecordOption::WithFreqs);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing).set_stored();
	let _text_field = schema_builder.add_text_field(TEXT_FIELD, text_options);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(WhitespaceTokenizer::default())
		.filter(LowerCaser)
		.build();
	index.tokenizers().register(TOKENIZER_NAME, tokenizer);
}

/// Tokens of `text` as the index sees them.
pub fn analyze(index: &Index, field: tantivy::schema::Field, text: &str) -> tantivy::Result<Vec<String>> {
	let mut analyzer = index.tokenizer_for_field(field)?;
	let mut stream = analyzer.token_stream(text);
	let mut tokens = Vec::new();
	while stream.advance() { tokens.push(stream.token().text.clone()); }
	Ok(tokens)
}
