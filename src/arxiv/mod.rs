//! arXiv paper source: keyword search over the export API.

pub mod feed;

use chrono::NaiveDate;
use reqwest::Client;
use tracing::debug;
use url::Url;

const API_BASE: &str = "https://export.arxiv.org/api/query";

#[derive(Debug, thiserror::Error)]
pub enum ArxivError {
    #[error("invalid arXiv endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("arXiv query failed: status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// A paper published on the target date. Immutable once constructed;
/// `arxiv_id` is the sole deduplication key.
#[derive(Debug, Clone)]
pub struct Paper {
    /// Final path segment of the canonical abs URL (e.g. `2401.01234v1`).
    pub arxiv_id: String,
    pub title: String,
    pub authors: Vec<String>,
    /// The abstract, whitespace-trimmed.
    pub summary: String,
    pub published: NaiveDate,
    pub categories: Vec<String>,
    pub comment: Option<String>,
    /// Canonical abs URL as returned by the feed.
    pub url: String,
}

/// Abstraction over the paper index.
/// Implemented by `ArxivClient` for production; mock implementations used in tests.
pub trait PaperSource {
    async fn search(
        &self,
        keyword: &str,
        date: NaiveDate,
        limit: u32,
    ) -> Result<Vec<Paper>, ArxivError>;
}

#[derive(Clone)]
pub struct ArxivClient {
    http: Client,
    base_url: String,
}

impl ArxivClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }
}

impl PaperSource for ArxivClient {
    async fn search(
        &self,
        keyword: &str,
        date: NaiveDate,
        limit: u32,
    ) -> Result<Vec<Paper>, ArxivError> {
        let mut url = Url::parse(&self.base_url)?;
        url.query_pairs_mut()
            .append_pair("search_query", &build_search_query(keyword))
            .append_pair("start", "0")
            .append_pair("max_results", &limit.to_string())
            .append_pair("sortBy", "submittedDate")
            .append_pair("sortOrder", "descending");

        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArxivError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let entries = feed::parse_feed(&body);
        let candidates = entries.len();

        // Exact calendar-date match only; entries without a parsable
        // published timestamp never match.
        let papers: Vec<Paper> = entries
            .into_iter()
            .filter(|e| e.published == Some(date))
            .map(|e| {
                let arxiv_id = paper_id(&e.id_url);
                Paper {
                    arxiv_id,
                    title: e.title,
                    authors: e.authors,
                    summary: e.summary,
                    published: date,
                    categories: e.categories,
                    comment: e.comment,
                    url: e.id_url,
                }
            })
            .collect();

        debug!(keyword, candidates, matched = papers.len(), "arxiv search complete");
        Ok(papers)
    }
}

/// arXiv query restricted to the CS category hierarchy. Multi-word
/// keywords become quoted phrase searches.
fn build_search_query(keyword: &str) -> String {
    let kw = keyword.trim();
    let term = if kw.contains(' ') {
        format!("all:\"{}\"", kw.replace('"', ""))
    } else {
        format!("all:{kw}")
    };
    format!("{term} AND cat:cs.*")
}

fn paper_id(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .to_string()
}
