//! Merging per-keyword search results into a deduplicated paper pool
//! while preserving per-keyword grouping for presentation.

use std::collections::HashMap;

use crate::arxiv::Paper;

/// One keyword's slice of the digest: the identifiers it matched, in
/// the order the source returned them.
#[derive(Debug)]
pub struct KeywordSection {
    pub keyword: String,
    pub paper_ids: Vec<String>,
}

/// Paper pool plus per-keyword index, accumulated across keywords.
///
/// Invariants: one pool entry per identifier no matter how many
/// sections reference it (first-seen-wins on collision), and every
/// identifier in any section exists in the pool.
#[derive(Debug, Default)]
pub struct MergedResults {
    papers: HashMap<String, Paper>,
    sections: Vec<KeywordSection>,
}

impl MergedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one keyword's results. Sections are kept in call order,
    /// including empty ones; a paper already in the pool keeps the
    /// fields from its first occurrence.
    pub fn push_keyword(&mut self, keyword: &str, papers: Vec<Paper>) {
        let mut paper_ids = Vec::with_capacity(papers.len());
        for paper in papers {
            paper_ids.push(paper.arxiv_id.clone());
            self.papers.entry(paper.arxiv_id.clone()).or_insert(paper);
        }
        self.sections.push(KeywordSection {
            keyword: keyword.to_string(),
            paper_ids,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// Total unique papers across all keywords.
    pub fn unique_count(&self) -> usize {
        self.papers.len()
    }

    pub fn paper(&self, id: &str) -> Option<&Paper> {
        self.papers.get(id)
    }

    /// Sections in keyword request order.
    pub fn sections(&self) -> &[KeywordSection] {
        &self.sections
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.keyword.as_str())
    }
}
