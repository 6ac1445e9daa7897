use faqrag_core::traits::TextSearcher;
use faqrag_core::types::{Chunk, ChunkMeta, SourceKind};
use faqrag_text::{SparseIndexer, SparseSearcher};
use tempfile::TempDir;

fn chunk(id: u64, text: &str) -> Chunk {
    Chunk {
        id,
        uid: format!("uid{id}"),
        text: text.to_string(),
        meta: ChunkMeta { file_name: "faq.txt".into(), chunk_id: id as usize, page: None },
    }
}

fn corpus() -> Vec<Chunk> {
    vec![
        chunk(0, "Q: How do refunds work?\nA: Refunds are issued within 30 days"),
        chunk(1, "Q: Do you ship abroad?\nA: We ship worldwide"),
        chunk(2, "Q: What payment methods?\nA: Cards and bank transfer"),
    ]
}

#[test]
fn missing_index_is_empty() {
    let tmp = TempDir::new().unwrap();
    let searcher = SparseSearcher::open(&tmp.path().join("sparse")).expect("open");
    assert!(!searcher.is_built());
    assert!(searcher.search("refunds", 5).unwrap().is_empty());
    assert_eq!(TextSearcher::len(&searcher).unwrap(), 0);
}

#[test]
fn rebuild_and_search_ranks_matching_docs() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("sparse");
    let indexer = SparseIndexer::new(&dir);
    assert_eq!(indexer.rebuild(&corpus()).expect("rebuild"), 3);

    let searcher = SparseSearcher::open(&dir).expect("open");
    assert_eq!(searcher.num_docs(), 3);
    let hits = searcher.search("REFUNDS issued", 5).expect("search");
    assert_eq!(hits.len(), 1, "only docs sharing a term are returned");
    assert_eq!(hits[0].id, 0);
    assert_eq!(hits[0].source, SourceKind::Sparse);

    let hits = searcher.search("we ship refunds", 1).expect("search");
    assert_eq!(hits.len(), 1);

    assert!(searcher.search("   ", 5).unwrap().is_empty());
    assert!(searcher.search("refunds", 0).unwrap().is_empty());
}

#[test]
fn ties_keep_store_order() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("sparse");
    let docs = vec![chunk(0, "alpha beta"), chunk(1, "alpha beta"), chunk(2, "gamma")];
    SparseIndexer::new(&dir).rebuild(&docs).unwrap();
    let hits = SparseSearcher::open(&dir).unwrap().search("alpha", 5).unwrap();
    let ids: Vec<u64> = hits.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn rebuild_replaces_previous_index() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("sparse");
    let indexer = SparseIndexer::new(&dir);
    indexer.rebuild(&corpus()[..1]).unwrap();
    indexer.rebuild(&corpus()).unwrap();

    let searcher = SparseSearcher::open(&dir).unwrap();
    let texts = searcher.texts().unwrap();
    assert_eq!(texts.len(), 3);
    assert_eq!(texts[2].0, 2);
    assert!(texts[1].1.contains("worldwide"));
    assert!(!tmp.path().join(".sparse.staging").exists());
    assert!(!tmp.path().join(".sparse.old").exists());
}
