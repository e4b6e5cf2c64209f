//! Research orchestration: runs the five phases for one company.
//!
//! The run degrades rather than fails. Only two things end it early: a
//! site with no discoverable pages, and the overall research budget
//! running out. Everything else (LLM errors, failed fetches, an empty
//! corpus) still produces a record holding every schema field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::{info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

use super::{
    aggregate::ContentAggregator,
    discover::LinkDiscoverer,
    extract::FactExtractor,
    fetch::PageFetcher,
    select::PageSelector,
};
use crate::crawlers::links::parse_website;
use crate::error::{ErrorKind, Result};
use crate::traits::{http::HttpClient, llm::LlmProvider};
use crate::types::{
    config::ResearchConfig,
    record::CompanyRecord,
    schema::FieldSchema,
    selection::SelectionMethod,
    trace::{Phase, PhaseTrace, ResearchState},
};

/// Result of one research run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchOutcome {
    pub run_id: Uuid,

    /// Always holds every schema field; all null when nothing was extracted
    pub record: CompanyRecord,

    /// One trace per attempted phase, in execution order
    pub traces: Vec<PhaseTrace>,

    /// Terminal state: `Completed` or `Failed`
    pub state: ResearchState,

    pub selection_method: Option<SelectionMethod>,
    pub started_at: DateTime<Utc>,
}

impl ResearchOutcome {
    pub fn is_completed(&self) -> bool {
        self.state == ResearchState::Completed
    }

    pub fn trace(&self, phase: Phase) -> Option<&PhaseTrace> {
        self.traces.iter().find(|t| t.phase == phase)
    }

    pub fn into_parts(self) -> (CompanyRecord, Vec<PhaseTrace>) {
        (self.record, self.traces)
    }
}

/// Bookkeeping for one run: state machine and collected traces.
struct RunLog {
    run_id: Uuid,
    state: ResearchState,
    traces: Vec<PhaseTrace>,
    selection_method: Option<SelectionMethod>,
    started_at: DateTime<Utc>,
}

impl RunLog {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            state: ResearchState::Queued,
            traces: Vec::with_capacity(Phase::ALL.len()),
            selection_method: None,
            started_at: Utc::now(),
        }
    }

    fn transition(&mut self, next: ResearchState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        info!(from = ?self.state, to = ?next, "Research state transition");
        self.state = next;
    }

    fn enter(&mut self, phase: Phase) -> Instant {
        self.transition(ResearchState::running(phase));
        Instant::now()
    }

    fn record(&mut self, trace: PhaseTrace) {
        if trace.success {
            info!(
                phase = %trace.phase,
                duration_ms = trace.duration_ms,
                error_kind = ?trace.error_kind,
                detail = trace.detail.as_deref().unwrap_or(""),
                "Phase succeeded"
            );
        } else {
            warn!(
                phase = %trace.phase,
                duration_ms = trace.duration_ms,
                error_kind = ?trace.error_kind,
                detail = trace.detail.as_deref().unwrap_or(""),
                "Phase failed"
            );
        }
        self.traces.push(trace);
    }

    /// Record the interrupted phase and fail the run.
    fn expire(&mut self, phase: Phase, started: Instant) {
        self.record(
            PhaseTrace::failure(phase, started.elapsed(), ErrorKind::Timeout)
                .with_detail("research budget exhausted"),
        );
        self.transition(ResearchState::Failed);
    }

    fn finish(self, record: CompanyRecord) -> ResearchOutcome {
        info!(
            state = ?self.state,
            populated = record.populated_count(),
            phases = self.traces.len(),
            "Research finished"
        );
        ResearchOutcome {
            run_id: self.run_id,
            record,
            traces: self.traces,
            state: self.state,
            selection_method: self.selection_method,
            started_at: self.started_at,
        }
    }
}

/// Runs the research pipeline with injected LLM and HTTP clients.
///
/// Holds no per-run state; one `Researcher` can serve concurrent runs.
pub struct Researcher<L: LlmProvider, H: HttpClient> {
    discoverer: LinkDiscoverer<Arc<H>>,
    selector: PageSelector<Arc<L>>,
    fetcher: PageFetcher<Arc<H>>,
    aggregator: ContentAggregator,
    extractor: FactExtractor<Arc<L>>,
    schema: FieldSchema,
    config: ResearchConfig,
}

impl<L: LlmProvider, H: HttpClient> Researcher<L, H> {
    /// Build a researcher, rejecting invalid configuration.
    pub fn new(llm: L, http: H, config: ResearchConfig, schema: FieldSchema) -> Result<Self> {
        config.validate()?;

        let llm = Arc::new(llm);
        let http = Arc::new(http);

        Ok(Self {
            discoverer: LinkDiscoverer::new(http.clone(), config.discovery.clone()),
            selector: PageSelector::new(llm.clone(), config.selection.clone()),
            fetcher: PageFetcher::new(http, config.fetch.clone()),
            aggregator: ContentAggregator::new(config.aggregation.clone()),
            extractor: FactExtractor::new(llm, config.extraction.clone()),
            schema,
            config,
        })
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Research one company.
    ///
    /// A bare domain is treated as `https://`. Errors only when `website`
    /// cannot be turned into an http(s) URL; every pipeline failure is
    /// reported through the outcome's state and traces instead.
    pub async fn research(&self, company_name: &str, website: &str) -> Result<ResearchOutcome> {
        let base_url = parse_website(website)?;
        let run_id = Uuid::now_v7();
        let span = info_span!("research", run_id = %run_id, company = %company_name);

        Ok(self
            .run(run_id, company_name, base_url)
            .instrument(span)
            .await)
    }

    async fn run(&self, run_id: Uuid, company_name: &str, base_url: Url) -> ResearchOutcome {
        let mut log = RunLog::new(run_id);
        let deadline = Instant::now() + self.config.research_budget();
        let website = base_url.as_str();
        let blank = || CompanyRecord::empty(company_name, website, &self.schema);

        info!(website = %website, budget_secs = self.config.research_budget_secs, "Research started");

        // Link discovery
        let started = log.enter(Phase::LinkDiscovery);
        let Some(discovery) = within(deadline, self.discoverer.discover(&base_url)).await else {
            log.expire(Phase::LinkDiscovery, started);
            return log.finish(blank());
        };
        if let Some(kind) = discovery.error_kind() {
            let detail = discovery
                .detail
                .clone()
                .unwrap_or_else(|| "no candidate links found".to_string());
            log.record(PhaseTrace::failure(Phase::LinkDiscovery, started.elapsed(), kind).with_detail(detail));
            log.transition(ResearchState::Failed);
            return log.finish(blank());
        }
        log.record(
            PhaseTrace::success(Phase::LinkDiscovery, started.elapsed()).with_detail(format!(
                "{} candidates ({} sitemaps, {} pages crawled)",
                discovery.links.len(),
                discovery.sitemaps_fetched,
                discovery.pages_crawled
            )),
        );

        // Page selection
        let started = log.enter(Phase::PageSelection);
        let Some(selection) = within(
            deadline,
            self.selector.select(&discovery.links, &self.schema, &base_url),
        )
        .await
        else {
            log.expire(Phase::PageSelection, started);
            return log.finish(blank());
        };
        log.selection_method = Some(selection.method);
        let trace = if selection.is_empty() {
            PhaseTrace::failure(Phase::PageSelection, started.elapsed(), ErrorKind::Empty)
                .with_detail("no pages selected")
        } else {
            let mut trace = PhaseTrace::success(Phase::PageSelection, started.elapsed()).with_detail(
                format!("{} of {} candidates via {:?}", selection.len(), discovery.links.len(), selection.method),
            );
            if let Some(cause) = selection.fallback_cause {
                trace = trace.with_error_kind(cause);
            }
            trace
        };
        log.record(trace);

        // Fetching
        let started = log.enter(Phase::Fetching);
        let Some(report) = within(deadline, self.fetcher.fetch_report(&selection)).await else {
            log.expire(Phase::Fetching, started);
            return log.finish(blank());
        };
        let detail = format!("{} of {} pages fetched", report.ok, report.pages.len());
        let trace = if report.pages.is_empty() {
            PhaseTrace::failure(Phase::Fetching, started.elapsed(), ErrorKind::Empty)
        } else if let Some(kind) = report.error_kind() {
            PhaseTrace::failure(Phase::Fetching, started.elapsed(), kind)
        } else {
            PhaseTrace::success(Phase::Fetching, started.elapsed())
        };
        log.record(trace.with_detail(detail));

        // Aggregation
        let started = log.enter(Phase::Aggregation);
        if Instant::now() >= deadline {
            log.expire(Phase::Aggregation, started);
            return log.finish(blank());
        }
        let corpus = self.aggregator.aggregate(&report.pages);
        let detail = format!(
            "{} sections, {} chars, {} dropped",
            corpus.sections.len(),
            corpus.char_count,
            corpus.dropped_urls.len()
        );
        let trace = if corpus.is_empty() {
            PhaseTrace::failure(Phase::Aggregation, started.elapsed(), ErrorKind::Empty)
        } else if corpus.budget_exceeded() {
            PhaseTrace::success(Phase::Aggregation, started.elapsed())
                .with_error_kind(ErrorKind::BudgetExceeded)
        } else {
            PhaseTrace::success(Phase::Aggregation, started.elapsed())
        };
        log.record(trace.with_detail(detail));

        // Extraction
        let started = log.enter(Phase::Extraction);
        let Some(result) = within(deadline, self.extractor.extract(&corpus, &self.schema)).await else {
            log.expire(Phase::Extraction, started);
            return log.finish(blank());
        };
        let trace = match result.failure() {
            Some(failure) => PhaseTrace::failure(Phase::Extraction, started.elapsed(), failure.kind())
                .with_detail(failure.to_string()),
            None => PhaseTrace::success(Phase::Extraction, started.elapsed()),
        };
        log.record(trace);

        let record = result
            .into_record(company_name, website, &self.schema)
            .with_source_urls(corpus.source_urls());
        if let Some(last) = log.traces.last_mut().filter(|t| t.success) {
            last.detail = Some(format!(
                "{} of {} fields populated",
                record.populated_count(),
                self.schema.len()
            ));
        }

        log.transition(ResearchState::Completed);
        log.finish(record)
    }
}

/// Run `future` unless the deadline passes first.
async fn within<F: Future>(deadline: Instant, future: F) -> Option<F::Output> {
    timeout_at(deadline, future).await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockHttpClient, MockLlm, MockLlmBehavior, MockRoute, SiteBuilder};
    use crate::types::schema::FieldSpec;
    use std::time::Duration;

    const SELECT: &str = "You are choosing pages";
    const EXTRACT: &str = "Extract business facts";

    fn schema() -> FieldSchema {
        FieldSchema::new(vec![
            FieldSpec::text("industry", "Primary industry"),
            FieldSpec::number("founding_year", "Year founded"),
        ])
        .unwrap()
    }

    fn site() -> MockHttpClient {
        SiteBuilder::new("https://acme.test")
            .simple_page("/", "Acme", "Welcome to Acme.", &["/about", "/contact"])
            .simple_page("/about", "About", "Acme makes anvils since 1949.", &["/"])
            .simple_page("/contact", "Contact", "Call us.", &["/"])
            .sitemap(&["/", "/about", "/contact"])
            .build()
    }

    fn researcher(llm: MockLlm, http: MockHttpClient) -> Researcher<MockLlm, MockHttpClient> {
        Researcher::new(llm, http, ResearchConfig::default(), schema()).unwrap()
    }

    #[tokio::test]
    async fn test_completed_run_traces_every_phase() {
        let llm = MockLlm::new()
            .respond_to(SELECT, r#"{"selected_pages": [{"url": "https://acme.test/about", "priority": 0.9}]}"#)
            .respond_to(EXTRACT, r#"{"industry": "Manufacturing", "founding_year": "1949"}"#);

        let outcome = researcher(llm, site()).research("Acme", "acme.test").await.unwrap();

        assert!(outcome.is_completed());
        assert_eq!(outcome.selection_method, Some(SelectionMethod::Llm));
        let phases: Vec<Phase> = outcome.traces.iter().map(|t| t.phase).collect();
        assert_eq!(phases, Phase::ALL.to_vec());
        assert!(outcome.traces.iter().all(|t| t.success));
        assert_eq!(outcome.record.website, "https://acme.test/");
        assert_eq!(outcome.record.fields["founding_year"], serde_json::json!(1949));
        assert_eq!(outcome.record.source_urls, vec!["https://acme.test/about"]);
    }

    #[tokio::test]
    async fn test_invalid_website_is_an_error() {
        let result = researcher(MockLlm::new(), site()).research("Acme", "ftp://acme.test").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = ResearchConfig::new().with_max_pages_to_select(0);
        let result = Researcher::new(MockLlm::new(), site(), config, schema());
        assert!(result.is_err());

        let config = ResearchConfig::new().with_max_corpus_chars(5_000);
        let result = Researcher::new(MockLlm::new(), site(), config, schema());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_extraction_failure_still_completes() {
        let llm = MockLlm::new()
            .respond_to(SELECT, r#"["https://acme.test/about"]"#)
            .on_prompt_containing(EXTRACT, MockLlmBehavior::Error("rate limited".into()));

        let outcome = researcher(llm, site()).research("Acme", "https://acme.test").await.unwrap();

        assert!(outcome.is_completed());
        assert!(outcome.record.is_blank());
        let trace = outcome.trace(Phase::Extraction).unwrap();
        assert!(!trace.success);
        assert_eq!(trace.error_kind, Some(ErrorKind::Provider));
    }

    #[tokio::test]
    async fn test_all_fetches_failing_yields_empty_corpus() {
        let http = SiteBuilder::new("https://acme.test")
            .simple_page("/", "Acme", "Welcome.", &["/about"])
            .sitemap(&["/", "/about"])
            .route("/about", MockRoute::NetworkError)
            .build();
        let llm = MockLlm::new().respond_to(SELECT, r#"["https://acme.test/about"]"#);

        let outcome = researcher(llm.clone(), http).research("Acme", "acme.test").await.unwrap();

        assert!(outcome.is_completed());
        assert_eq!(outcome.trace(Phase::Fetching).unwrap().error_kind, Some(ErrorKind::Network));
        assert_eq!(outcome.trace(Phase::Aggregation).unwrap().error_kind, Some(ErrorKind::Empty));
        assert_eq!(outcome.trace(Phase::Extraction).unwrap().error_kind, Some(ErrorKind::Empty));
        assert_eq!(llm.calls_containing(EXTRACT), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_expiry_fails_run() {
        let http = SiteBuilder::new("https://acme.test")
            .simple_page("/", "Acme", "Welcome.", &["/about"])
            .sitemap(&["/", "/about"])
            .build();
        let llm = MockLlm::new().on_prompt_containing(SELECT, MockLlmBehavior::Hang);
        let config = ResearchConfig::default().with_research_budget(Duration::from_secs(10));
        let researcher = Researcher::new(llm, http, config, schema()).unwrap();

        let outcome = researcher.research("Acme", "acme.test").await.unwrap();

        assert_eq!(outcome.state, ResearchState::Failed);
        let last = outcome.traces.last().unwrap();
        assert_eq!(last.phase, Phase::PageSelection);
        assert_eq!(last.error_kind, Some(ErrorKind::Timeout));
        assert!(outcome.record.is_blank());
        assert_eq!(outcome.record.fields.len(), 2);
    }
}
