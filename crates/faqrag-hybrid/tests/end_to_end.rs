use faqrag_core::data_processor::DataProcessor;
use faqrag_embed::HashEmbedder;
use faqrag_hybrid::{HybridRetriever, IndexPaths, Indexer, Pipeline, QueryOptions, Reranker};
use faqrag_llm::Generator;

#[test]
fn csv_faq_answers_refund_question() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = IndexPaths::under(tmp.path().join(".rag_store"));
    let csv = "question,answer\nWhat is your refund policy?,Refunds are available within 30 days of purchase\nHow long does shipping take?,Shipping takes 5 to 7 business days\n";
    let chunks = DataProcessor::default().process_files(&[("faq.csv".to_string(), csv.as_bytes().to_vec())]);
    assert_eq!(chunks.len(), 2);

    let report = Indexer::new(paths.clone(), Box::new(HashEmbedder::new(256))).update_indices(chunks).unwrap();
    assert_eq!(report.total, 2);

    let retriever = HybridRetriever::open(&paths, Box::new(HashEmbedder::new(256))).unwrap();
    let pipeline = Pipeline::new(retriever, Reranker::without_judge(), Box::new(Generator::Extractive));
    let opts = QueryOptions { topk_vec: 1, use_hybrid: false, use_rerank: false, ..QueryOptions::default() };
    let out = pipeline.run("What is your refund policy?", &opts).unwrap();

    assert!(out.answer.to_lowercase().contains("refund"));
    assert_eq!(out.citations.len(), 1);
    assert_eq!(out.citations[0].file, "faq.csv");
}

#[test]
fn hybrid_query_over_built_indices() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = IndexPaths::under(tmp.path());
    let text = "Q: Do you offer gift cards?\nA: Yes, in any amount.\n\nQ: Can I change my order?\nA: Within one hour of placing it.";
    let chunks = DataProcessor::default().process_files(&[("faq.md".to_string(), text.as_bytes().to_vec())]);
    Indexer::new(paths.clone(), Box::new(HashEmbedder::new(128))).update_indices(chunks).unwrap();

    let retriever = HybridRetriever::open(&paths, Box::new(HashEmbedder::new(128))).unwrap();
    let pipeline = Pipeline::new(retriever, Reranker::without_judge(), Box::new(Generator::Extractive));
    let out = pipeline.run("gift cards", &QueryOptions { use_rerank: false, ..QueryOptions::default() }).unwrap();

    assert_eq!(out.retrieved_sparse.len(), 1);
    assert!(out.retrieved_sparse[0].text().contains("gift cards"));
    assert_eq!(out.candidates.len(), 2);
}
