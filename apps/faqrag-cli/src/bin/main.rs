use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use faqrag_cli::{init_tracing, load_config, spinner};
use faqrag_core::config::{AppConfig, GenerationBackend};
use faqrag_core::data_processor::{collect_files, DataProcessor};
use faqrag_core::traits::RelevanceJudge;
use faqrag_embed::embedder_from_config;
use faqrag_hybrid::{HybridRetriever, IndexPaths, Indexer, Pipeline, PipelineOutput, QueryOptions, Reranker};
use faqrag_llm::{Generator, LlmRelevanceJudge};
use faqrag_text::SparseSearcher;
use faqrag_vector::LanceDenseIndex;

#[derive(Parser)]
#[command(name = "faqrag", version, about = "Answer questions from your FAQ files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest files or directories (pdf, csv, txt, md) and update the indices
    Build {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Ask a question against the built indices
    Ask {
        question: String,
        /// Dense (vector) results to retrieve
        #[arg(long, default_value_t = 5)]
        topk_vec: usize,
        /// Sparse (BM25) results to retrieve
        #[arg(long, default_value_t = 5)]
        topk_sparse: usize,
        /// Results kept after reranking
        #[arg(long, default_value_t = 5)]
        topk_after: usize,
        /// Dense retrieval only
        #[arg(long)]
        no_hybrid: bool,
        /// Skip the reranking pass
        #[arg(long)]
        no_rerank: bool,
        /// Print retrieval details
        #[arg(long)]
        debug: bool,
    },
    /// Show index sizes and the configured providers
    Status,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config()?;
    match cli.command {
        Command::Build { paths } => {
            if let Err(e) = build(&config, &paths) {
                eprintln!("❌ Build failed: {e:#}");
                std::process::exit(1);
            }
        }
        Command::Ask { question, topk_vec, topk_sparse, topk_after, no_hybrid, no_rerank, debug } => {
            let options = QueryOptions { topk_vec, topk_sparse, topk_after, use_hybrid: !no_hybrid, use_rerank: !no_rerank };
            ask(&config, &question, &options, debug)?;
        }
        Command::Status => status(&config)?,
    }
    Ok(())
}

fn build(config: &AppConfig, paths: &[PathBuf]) -> Result<()> {
    let files = collect_files(paths)?;
    if files.is_empty() {
        println!("No supported files found.");
        return Ok(());
    }
    println!("📂 Ingesting {} file(s)", files.len());
    let chunks = DataProcessor::new(config.chunking.clone()).process_files(&files);

    let embedder = embedder_from_config(config)?;
    let indexer = Indexer::new(IndexPaths::from_config(config), embedder);
    let pb = spinner(&format!("Indexing {} chunks", chunks.len()))?;
    let report = indexer.update_indices(chunks);
    pb.finish_and_clear();
    let report = report?;

    println!("✅ Indices updated");
    println!("   received:   {}", report.received);
    println!("   duplicates: {}", report.duplicates);
    println!("   added:      {}", report.added);
    println!("   embedded:   {}", report.embedded);
    println!("   total:      {}", report.total);
    Ok(())
}

fn ask(config: &AppConfig, question: &str, options: &QueryOptions, debug: bool) -> Result<()> {
    let paths = IndexPaths::from_config(config);
    let retriever = HybridRetriever::open(&paths, embedder_from_config(config)?)?;
    if retriever.store().is_empty() {
        println!("⚠️  No indexed documents. Run `faqrag build <files>` first.");
        return Ok(());
    }

    let judge = LlmRelevanceJudge::from_config(config)?.map(|j| Box::new(j) as Box<dyn RelevanceJudge>);
    let generator = Generator::from_backend(&config.generation_backend(), Duration::from_secs(config.request_timeout_secs))?;
    let pipeline = Pipeline::new(retriever, Reranker::new(judge), Box::new(generator));

    let out = pipeline.run(question, options)?;
    println!("\n{}\n", out.answer);
    if !out.citations.is_empty() {
        println!("📎 Citations:");
        for (i, c) in out.citations.iter().enumerate() {
            let page = c.page.map(|p| format!(" (p. {p})")).unwrap_or_default();
            println!("  [{}] {}{} :: {}", i + 1, c.file, page, c.snippet);
        }
    }
    if debug {
        print_details(&out);
    }
    Ok(())
}

fn print_details(out: &PipelineOutput) {
    println!("\n🔎 Retrieval details ({}, {:.2}s)", out.shape, out.elapsed.as_secs_f64());
    let lists = [
        ("dense", &out.retrieved_dense),
        ("sparse", &out.retrieved_sparse),
        ("merged", &out.candidates),
        ("final (after merge/rerank)", &out.final_candidates),
    ];
    for (label, list) in lists {
        println!("  {label}: {} result(s)", list.len());
        for c in list.iter() {
            let preview: String = c.text().chars().take(80).collect();
            println!("    {:.4}  {}#{}  {}", c.score, c.file_name(), c.chunk.meta.chunk_id, preview.replace('\n', " "));
        }
    }
    println!("\n📝 Context:\n{}", out.context);
}

fn status(config: &AppConfig) -> Result<()> {
    let paths = IndexPaths::from_config(config);
    let store = faqrag_core::store::DocumentStore::load(&paths.docstore)?;
    let dense = LanceDenseIndex::open(&paths.dense)?;
    let sparse = SparseSearcher::open(&paths.sparse)?;

    println!("📊 faqrag status");
    println!("  document store: {} chunk(s)  [{}]", store.len(), paths.docstore.display());
    match dense.dim()? {
        Some(dim) => println!("  dense index:    {} vector(s), dim {}  [{}]", dense.len()?, dim, paths.dense.display()),
        None => println!("  dense index:    not built  [{}]", paths.dense.display()),
    }
    if sparse.is_built() {
        println!("  sparse index:   {} doc(s)  [{}]", sparse.num_docs(), paths.sparse.display());
    } else {
        println!("  sparse index:   not built  [{}]", paths.sparse.display());
    }
    println!("  embeddings:     {} / {}", config.embedding_provider, config.embed_model);
    match config.generation_backend() {
        GenerationBackend::External { provider, model, .. } => println!("  generation:     {provider} / {model}"),
        GenerationBackend::Extractive => println!("  generation:     extractive (no API key for {})", config.api_provider),
    }
    Ok(())
}
