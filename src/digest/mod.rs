//! Digest assembly: merge per-keyword search results and render the
//! email body. Pure transformations over in-memory data, no I/O.

pub mod merge;
pub mod render;

/// Derived strings for one unique paper, produced once per identifier
/// regardless of how many keyword sections reference it.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub translation: Option<String>,
    pub contribution: Option<String>,
}
