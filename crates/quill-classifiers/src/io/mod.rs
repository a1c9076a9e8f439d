//! Corpus loaders.
//!
//! Feature extraction happens elsewhere; these read its output, either as a
//! JSON document of per-document feature groups or as a flat TSV table.
pub mod corpus_json;
pub mod corpus_tsv;

use std::path::Path;

use anyhow::Result;

use crate::data_handling::Corpus;

pub use corpus_json::{parse_corpus_json, read_corpus_json};
pub use corpus_tsv::read_corpus_tsv;

/// Read a corpus, choosing the format from the file extension (`.json`
/// for JSON, anything else is read as TSV).
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let is_json = path
        .as_ref()
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        read_corpus_json(path)
    } else {
        read_corpus_tsv(path)
    }
}
