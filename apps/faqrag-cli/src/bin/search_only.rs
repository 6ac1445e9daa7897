use anyhow::Result;
use clap::Parser;

use faqrag_cli::{init_tracing, load_config};
use faqrag_core::store::DocumentStore;
use faqrag_core::types::SearchHit;
use faqrag_embed::embedder_from_config;
use faqrag_hybrid::IndexPaths;
use faqrag_text::SparseSearcher;
use faqrag_vector::LanceDenseIndex;

/// Raw dense and sparse hits for a query, without fusion or generation.
#[derive(Parser)]
#[command(name = "faqrag-search", version)]
struct Args {
    query: String,
    #[arg(long, default_value_t = 10)]
    limit: usize,
    /// Skip the dense index (no embedding call)
    #[arg(long)]
    sparse_only: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config()?;
    let paths = IndexPaths::from_config(&config);
    let store = DocumentStore::load(&paths.docstore)?;

    println!("🔍 faqrag-search\n================");
    println!("Query: {}", args.query);

    if !args.sparse_only {
        let dense = LanceDenseIndex::open(&paths.dense)?;
        let embedder = embedder_from_config(&config)?;
        let q_vec = embedder.embed_batch(&[args.query.clone()])?.into_iter().next().unwrap_or_default();
        print_hits("Dense", &dense.search_vec(&q_vec, args.limit)?, &store);
    }
    let sparse = SparseSearcher::open(&paths.sparse)?;
    print_hits("Sparse", &sparse.search_text(&args.query, args.limit)?, &store);
    Ok(())
}

fn print_hits(label: &str, hits: &[SearchHit], store: &DocumentStore) {
    println!("\n{label}: {} result(s)", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        match store.get(hit.id) {
            Some(chunk) => {
                let preview: String = chunk.text.chars().take(120).collect();
                println!("  {}. score={:.4}  id={}  file={}#{}", i + 1, hit.score, hit.id, chunk.meta.file_name, chunk.meta.chunk_id);
                println!("     📝 {}", preview.replace('\n', " "));
            }
            None => println!("  {}. score={:.4}  id={}  (not in store)", i + 1, hit.score, hit.id),
        }
    }
}
