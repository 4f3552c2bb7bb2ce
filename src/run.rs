//! One digest run: search per keyword, merge, enrich, render, send.
//!
//! Every external call is sequential and best-effort: a failed search
//! contributes zero results for its keyword, a failed enrichment
//! becomes an inline placeholder, and a failed send is logged. The run
//! itself always completes normally.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use tracing::{info, warn};

use crate::arxiv::{Paper, PaperSource};
use crate::digest::Enrichment;
use crate::digest::merge::MergedResults;
use crate::digest::render;
use crate::llm::{Enricher, prompts};
use crate::mail::DigestSender;

#[derive(Debug)]
pub struct RunSummary {
    pub unique_papers: usize,
    /// False when the SMTP send failed. The process still exits
    /// normally either way; this is the only delivery signal.
    pub delivered: bool,
}

/// The calendar day immediately preceding today (local time).
pub fn yesterday() -> NaiveDate {
    let today = chrono::Local::now().date_naive();
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

pub async fn run<S, E, N>(
    source: &S,
    enricher: &E,
    notifier: &N,
    keywords: &[String],
    date: NaiveDate,
    limit: u32,
) -> RunSummary
where
    S: PaperSource,
    E: Enricher,
    N: DigestSender,
{
    let mut merged = MergedResults::new();
    for keyword in keywords {
        let papers = match source.search(keyword, date, limit).await {
            Ok(papers) => papers,
            Err(e) => {
                warn!(keyword = %keyword, error = %e, "search failed, treating as zero results");
                Vec::new()
            }
        };
        info!(keyword = %keyword, matched = papers.len(), %date, "keyword searched");
        merged.push_keyword(keyword, papers);
    }

    if merged.is_empty() {
        info!(%date, "no papers matched any keyword");
        let body = render::render_empty(date, keywords);
        let delivered = deliver(notifier, &render::empty_subject(date), &body).await;
        return RunSummary {
            unique_papers: 0,
            delivered,
        };
    }

    info!(unique = merged.unique_count(), "search results merged");

    // Exactly two LLM calls per unique identifier; papers shared
    // across keyword sections reuse the cached result.
    let mut enrichments: HashMap<String, Enrichment> = HashMap::new();
    for section in merged.sections() {
        for id in &section.paper_ids {
            if enrichments.contains_key(id) {
                continue;
            }
            let Some(paper) = merged.paper(id) else {
                continue;
            };
            info!(id = %id, title = %paper.title, "enriching paper");
            enrichments.insert(id.clone(), enrich(enricher, paper).await);
        }
    }

    let body = render::render_digest(&merged, date, &enrichments);
    let subject = render::digest_subject(date, merged.unique_count());
    let delivered = deliver(notifier, &subject, &body).await;

    RunSummary {
        unique_papers: merged.unique_count(),
        delivered,
    }
}

/// Both enrichment passes for one paper. A failed call degrades to an
/// inline placeholder so the digest slot always holds a string.
async fn enrich<E: Enricher>(enricher: &E, paper: &Paper) -> Enrichment {
    let translation = enricher
        .process(&paper.summary, prompts::TRANSLATION_PROMPT)
        .await
        .unwrap_or_else(|e| {
            warn!(id = %paper.arxiv_id, error = %e, "translation failed");
            format!("processing failed: {e}")
        });
    let contribution = enricher
        .process(&paper.summary, prompts::CONTRIBUTION_PROMPT)
        .await
        .unwrap_or_else(|e| {
            warn!(id = %paper.arxiv_id, error = %e, "contribution summary failed");
            format!("processing failed: {e}")
        });
    Enrichment {
        translation: Some(translation),
        contribution: Some(contribution),
    }
}

async fn deliver<N: DigestSender>(notifier: &N, subject: &str, body: &str) -> bool {
    match notifier.send(subject, body).await {
        Ok(()) => true,
        Err(e) => {
            // Known weak point: a failed final send still ends the run
            // normally and is only visible in the logs.
            warn!(error = %e, "failed to send digest");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use super::*;
    use crate::arxiv::ArxivError;
    use crate::digest::merge::test_support::paper;
    use crate::llm::LlmError;
    use crate::mail::MailError;

    #[derive(Default)]
    struct MockSource {
        results: HashMap<String, Vec<Paper>>,
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl MockSource {
        fn with(results: Vec<(&str, Vec<Paper>)>) -> Self {
            Self {
                results: results
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                ..Self::default()
            }
        }

        fn failing_on(mut self, keyword: &str) -> Self {
            self.failing.insert(keyword.to_string());
            self
        }
    }

    impl PaperSource for MockSource {
        async fn search(
            &self,
            keyword: &str,
            _date: NaiveDate,
            _limit: u32,
        ) -> Result<Vec<Paper>, ArxivError> {
            self.calls.lock().unwrap().push(keyword.to_string());
            if self.failing.contains(keyword) {
                return Err(ArxivError::Status(503));
            }
            Ok(self.results.get(keyword).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct MockEnricher {
        failing_texts: HashSet<String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockEnricher {
        fn failing_on(mut self, text: &str) -> Self {
            self.failing_texts.insert(text.to_string());
            self
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Enricher for MockEnricher {
        async fn process(&self, text: &str, template: &str) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), template.to_string()));
            if self.failing_texts.contains(text) {
                return Err(LlmError::Api {
                    code: 500,
                    message: "simulated transport error".into(),
                });
            }
            if template == prompts::TRANSLATION_PROMPT {
                Ok(format!("tr:{text}"))
            } else {
                Ok(format!("co:{text}"))
            }
        }
    }

    #[derive(Default)]
    struct MockSender {
        fail: bool,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl MockSender {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn last_sent(&self) -> (String, String) {
            self.sent.lock().unwrap().last().cloned().expect("nothing sent")
        }
    }

    impl DigestSender for MockSender {
        async fn send(&self, subject: &str, body: &str) -> Result<(), MailError> {
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), body.to_string()));
            if self.fail {
                let cause = "not-an-address".parse::<lettre::Address>().unwrap_err();
                return Err(MailError::Address(cause));
            }
            Ok(())
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn keywords(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn overlapping_keywords_enrich_each_unique_paper_twice() {
        let source = MockSource::with(vec![
            ("alpha", vec![paper("p1", "One"), paper("p2", "Two")]),
            ("beta", vec![paper("p2", "Two"), paper("p3", "Three")]),
        ]);
        let enricher = MockEnricher::default();
        let sender = MockSender::default();

        let summary = run(
            &source,
            &enricher,
            &sender,
            &keywords(&["alpha", "beta"]),
            date(),
            10,
        )
        .await;

        assert_eq!(summary.unique_papers, 3);
        assert!(summary.delivered);
        // 2 calls per unique paper, not per section reference.
        assert_eq!(enricher.call_count(), 6);

        let (subject, body) = sender.last_sent();
        assert_eq!(subject, "ArXiv daily digest - 2024-01-15 - 3 papers");
        assert!(body.contains("Keyword: alpha (2 papers)"));
        assert!(body.contains("Keyword: beta (2 papers)"));
        // p2 appears once per referencing section, identical enrichment.
        assert_eq!(body.matches("Title: Two").count(), 2);
        assert_eq!(body.matches("tr:Abstract of p2.").count(), 2);
    }

    #[tokio::test]
    async fn empty_run_sends_no_papers_body_without_enrichment() {
        let source = MockSource::with(vec![("alpha", vec![]), ("beta", vec![])]);
        let enricher = MockEnricher::default();
        let sender = MockSender::default();

        let summary = run(
            &source,
            &enricher,
            &sender,
            &keywords(&["alpha", "beta"]),
            date(),
            10,
        )
        .await;

        assert_eq!(summary.unique_papers, 0);
        assert!(summary.delivered);
        assert_eq!(enricher.call_count(), 0);

        let (subject, body) = sender.last_sent();
        assert_eq!(subject, "ArXiv daily digest - 2024-01-15 - no matching papers");
        assert!(body.contains("  * alpha\n"));
        assert!(body.contains("  * beta\n"));
        assert!(!body.contains("Title:"));
    }

    #[tokio::test]
    async fn search_failure_is_treated_as_zero_results() {
        let source = MockSource::with(vec![("alpha", vec![paper("p1", "One")])])
            .failing_on("broken");
        let enricher = MockEnricher::default();
        let sender = MockSender::default();

        let summary = run(
            &source,
            &enricher,
            &sender,
            &keywords(&["broken", "alpha"]),
            date(),
            10,
        )
        .await;

        assert_eq!(summary.unique_papers, 1);
        assert!(summary.delivered);

        let (_, body) = sender.last_sent();
        // Failed keyword still listed in the header, but has no section.
        assert!(body.contains("Keywords: broken, alpha"));
        assert!(!body.contains("Keyword: broken"));
        assert!(body.contains("Keyword: alpha (1 papers)"));
    }

    #[tokio::test]
    async fn enrichment_failure_embeds_placeholder_and_still_sends() {
        let source = MockSource::with(vec![(
            "gamma",
            vec![paper("p3", "Three")],
        )]);
        let enricher = MockEnricher::default().failing_on("Abstract of p3.");
        let sender = MockSender::default();

        let summary = run(
            &source,
            &enricher,
            &sender,
            &keywords(&["gamma"]),
            date(),
            10,
        )
        .await;

        assert!(summary.delivered);
        let (_, body) = sender.last_sent();
        assert!(body.contains("Title: Three"));
        assert!(body.contains("*** Translated Abstract ***\nprocessing failed:"));
        assert!(body.contains("simulated transport error"));
    }

    #[tokio::test]
    async fn send_failure_is_reported_not_fatal() {
        let source = MockSource::with(vec![("alpha", vec![paper("p1", "One")])]);
        let enricher = MockEnricher::default();
        let sender = MockSender::failing();

        let summary = run(
            &source,
            &enricher,
            &sender,
            &keywords(&["alpha"]),
            date(),
            10,
        )
        .await;

        assert_eq!(summary.unique_papers, 1);
        assert!(!summary.delivered);
    }

    #[tokio::test]
    async fn keywords_are_searched_in_request_order() {
        let source = MockSource::with(vec![]);
        let enricher = MockEnricher::default();
        let sender = MockSender::default();

        run(
            &source,
            &enricher,
            &sender,
            &keywords(&["c", "a", "b"]),
            date(),
            10,
        )
        .await;

        assert_eq!(*source.calls.lock().unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn yesterday_is_one_day_back() {
        let before = chrono::Local::now().date_naive();
        let resolved = yesterday();
        let after = chrono::Local::now().date_naive();
        // Tolerate a midnight rollover between the two clock reads.
        assert!(
            Some(resolved) == before.pred_opt() || Some(resolved) == after.pred_opt(),
            "got {resolved}, expected the day before {before} or {after}"
        );
    }
}
