//! Rendering the digest body and subjects as plain text.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::Enrichment;
use super::merge::MergedResults;
use crate::arxiv::Paper;

const RULE: &str = "==================================================";
const SEPARATOR: &str = "----------------------------------------------------------------------";
const UNKNOWN_CATEGORY: &str = "unknown";

pub fn digest_subject(date: NaiveDate, unique: usize) -> String {
    format!("ArXiv daily digest - {date} - {unique} papers")
}

pub fn empty_subject(date: NaiveDate) -> String {
    format!("ArXiv daily digest - {date} - no matching papers")
}

/// Full digest: header with overview counts, then one section per
/// keyword with at least one match, in keyword request order. A paper
/// referenced by several keywords renders once per referencing section,
/// with identical enrichment text (intentional, for per-keyword
/// browsing).
pub fn render_digest(
    merged: &MergedResults,
    date: NaiveDate,
    enrichments: &HashMap<String, Enrichment>,
) -> String {
    let keywords: Vec<&str> = merged.keywords().collect();

    let mut body = format!(
        "[ArXiv Daily Digest] {date}\nKeywords: {}\n{RULE}\n\nOverview:\n  * {} unique papers published on {date}\n",
        keywords.join(", "),
        merged.unique_count(),
    );
    // Zero-match keywords stay out of the per-keyword counts but are
    // still part of the keyword list above.
    for section in merged.sections() {
        let count = section.paper_ids.len();
        if count > 0 {
            body.push_str(&format!("  * {}: {count} papers\n", section.keyword));
        }
    }
    body.push_str(RULE);
    body.push('\n');

    for section in merged.sections() {
        if section.paper_ids.is_empty() {
            continue;
        }
        body.push_str(&format!(
            "\n{RULE}\nKeyword: {} ({} papers)\n{RULE}\n",
            section.keyword,
            section.paper_ids.len()
        ));
        for id in &section.paper_ids {
            if let Some(paper) = merged.paper(id) {
                body.push_str(&format_paper(paper, enrichments.get(id)));
            }
        }
    }

    body
}

/// Distinct body for a run where no keyword matched anything: every
/// requested keyword is listed, no paper content at all.
pub fn render_empty(date: NaiveDate, keywords: &[String]) -> String {
    let mut body = format!(
        "[ArXiv Daily Digest] {date}\n{RULE}\n\nNo papers published on {date} matched these keywords:\n\n"
    );
    for keyword in keywords {
        body.push_str(&format!("  * {keyword}\n"));
    }
    body.push_str("\nThese keywords stay monitored; new matches will be mailed as they appear.\n");
    body.push_str(RULE);
    body.push('\n');
    body
}

fn format_paper(paper: &Paper, enrichment: Option<&Enrichment>) -> String {
    let categories = if paper.categories.is_empty() {
        UNKNOWN_CATEGORY.to_string()
    } else {
        paper.categories.join(", ")
    };

    let mut block = format!(
        "{SEPARATOR}\nTitle: {}\nAuthors: {}\nCategories: {categories}\nPublished: {}\n",
        paper.title,
        paper.authors.join(", "),
        paper.published,
    );
    if let Some(comment) = &paper.comment {
        block.push_str(&format!("Comment: {comment}\n"));
    }
    block.push_str(&format!(
        "Link: https://arxiv.org/abs/{id}\nPDF: https://arxiv.org/pdf/{id}.pdf\n\n",
        id = paper.arxiv_id
    ));

    if let Some(contribution) = enrichment.and_then(|e| e.contribution.as_deref())
        && !contribution.is_empty()
    {
        block.push_str(&format!("*** Contribution ***\n{contribution}\n\n"));
    }

    block.push_str(&format!("*** Abstract ***\n{}\n\n", paper.summary));

    if let Some(translation) = enrichment.and_then(|e| e.translation.as_deref()) {
        block.push_str(&format!("*** Translated Abstract ***\n{translation}\n\n"));
    }

    block.push_str(SEPARATOR);
    block.push('\n');
    block
}
