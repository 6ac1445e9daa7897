use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::chunker::{Chunker, ChunkingConfig};
use crate::error::{Error, Result};
use crate::types::RawChunk;

/// Extensions picked up when walking directories.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "csv", "txt", "md"];

/// Turns uploaded `(file_name, bytes)` pairs into raw chunks.
#[derive(Debug, Default)]
pub struct DataProcessor {
    chunker: Chunker,
}

impl DataProcessor {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { chunker: Chunker::new(config) }
    }

    /// Extract, chunk and tag every file. Format errors degrade to empty or raw text.
    pub fn process_files(&self, files: &[(String, Vec<u8>)]) -> Vec<RawChunk> {
        let mut out = Vec::new();
        for (name, data) in files {
            let content = extract_text(name, data);
            let pieces = self.chunker.chunk(&content);
            debug!(file = %name, chunks = pieces.len(), "chunked file");
            out.extend(pieces.into_iter().enumerate().map(|(idx, text)| RawChunk::new(text, name.clone(), idx)));
        }
        info!(files = files.len(), chunks = out.len(), "processed files");
        out
    }

    /// Read files and directories (recursively) from disk and process them.
    pub fn process_paths(&self, paths: &[PathBuf]) -> Result<Vec<RawChunk>> {
        let files = collect_files(paths)?;
        Ok(self.process_files(&files))
    }
}

/// Load `(file_name, bytes)` pairs. Directories contribute files with a supported extension.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| is_supported(p))
                .collect();
            found.sort();
            if found.is_empty() {
                warn!(dir = %path.display(), "no supported files found");
            }
            for file in found {
                files.push(read_named(&file)?);
            }
        } else if path.is_file() {
            files.push(read_named(path)?);
        } else {
            return Err(Error::NotFound(format!("input path {}", path.display())));
        }
    }
    Ok(files)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn read_named(path: &Path) -> Result<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| Error::Ingestion(format!("not a file path: {}", path.display())))?;
    Ok((name, fs::read(path)?))
}

/// Pick the extractor from the file extension.
pub fn extract_text(file_name: &str, data: &[u8]) -> String {
    let ext = file_name.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => read_pdf(file_name, data),
        "csv" => read_csv(data),
        _ => decode_utf8_lossless(data),
    }
}

/// UTF-8 decode that drops invalid byte sequences instead of replacing them.
pub fn decode_utf8_lossless(data: &[u8]) -> String {
    data.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

fn read_pdf(file_name: &str, data: &[u8]) -> String {
    let doc = match lopdf::Document::load_mem(data) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(file = %file_name, error = %e, "unreadable pdf");
            return String::new();
        }
    };
    doc.get_pages()
        .keys()
        .map(|&page| match doc.extract_text(&[page]) {
            Ok(text) => text,
            Err(e) => {
                debug!(file = %file_name, page, error = %e, "page text extraction failed");
                String::new()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn read_csv(data: &[u8]) -> String {
    let raw = decode_utf8_lossless(data);
    match qa_rows(&raw) {
        Some(rows) if !rows.is_empty() => rows.join("\n\n"),
        _ => raw,
    }
}

/// Render `question`/`answer` rows as `Q: ..\nA: ..`. `None` when the header lacks both columns.
fn qa_rows(raw: &str) -> Option<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(raw.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .ok()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
        .collect();

    let find = |names: &[&str]| names.iter().find_map(|n| headers.iter().position(|h| h == n));
    let q_col = find(&["question", "q"]);
    let a_col = find(&["answer", "a"]);
    if q_col.is_none() && a_col.is_none() {
        return None;
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else { continue };
        let q = q_col.and_then(|i| record.get(i)).unwrap_or_default();
        let a = a_col.and_then(|i| record.get(i)).unwrap_or_default();
        if !q.is_empty() || !a.is_empty() {
            rows.push(format!("Q: {q}\nA: {a}"));
        }
    }
    Some(rows)
}
