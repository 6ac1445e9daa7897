//! Shared data model, configuration, ingestion and the document store for faqrag.
//!
//! Every other crate in the workspace builds on the types defined here; the
//! index crates only ever see [`types::Chunk`] records handed out by the
//! [`store::DocumentStore`].

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod store;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
