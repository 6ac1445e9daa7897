//! LanceDB-backed dense index for faqrag.
//!
//! One table, `chunks`, with an `id` column matching the document store
//! position and a fixed-size `vector` column. Search is exact (flat) inner
//! product over unit vectors.

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use writer::LanceDenseIndex;
