//! Survey question search with segment and panel filters

use std::sync::Arc;

use dc_client::SurveyApi;
use dc_core::config::SurveyConfig;
use dc_core::{paginate, DcResult, Page, PageRequest};
use dc_models::{SegmentHit, SurveyQuestionHit};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::base::ServiceContext;

pub const SEARCH_FAILED: &str =
    "An error occurred while searching. Please try again or rephrase the question.";
pub const SEGMENTS_FAILED: &str = "Failed to load segments";

/// Match thresholds offered next to the search box
pub const THRESHOLD_OPTIONS: [(f64, &str); 4] =
    [(1.0, "100%"), (0.8, "80%"), (0.6, "60%"), (0.2, "20%")];

/// Search state for the question search screen
pub struct SurveySearch {
    api: Arc<dyn SurveyApi>,
    ctx: ServiceContext,
    page_size: usize,
    query: String,
    threshold: f64,
    results: Vec<SurveyQuestionHit>,
    segment: Option<String>,
    panel: Option<String>,
    page: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    pub query: String,
    pub threshold: f64,
    pub segment: Option<String>,
    pub panel: Option<String>,
    pub page: Page<SurveyQuestionHit>,
}

impl SurveySearch {
    pub fn new(api: Arc<dyn SurveyApi>, ctx: ServiceContext, config: &SurveyConfig) -> Self {
        Self {
            api,
            ctx,
            page_size: config.page_size.max(1),
            query: String::new(),
            threshold: config.default_threshold,
            results: Vec::new(),
            segment: None,
            panel: None,
            page: 1,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn results(&self) -> &[SurveyQuestionHit] {
        &self.results
    }

    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    pub fn panel(&self) -> Option<&str> {
        self.panel.as_deref()
    }

    /// Run a free-text search. A blank query does nothing.
    #[instrument(skip(self), fields(threshold = self.threshold))]
    pub async fn search(&mut self, query: &str) -> DcResult<usize> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(self.results.len());
        }

        self.query = query.to_string();
        self.results.clear();
        self.segment = None;
        self.panel = None;
        self.page = 1;

        let hits = self.ctx.report(
            self.api.search_questions(query, self.threshold).await,
            SEARCH_FAILED,
        )?;
        debug!(hits = hits.len(), "Question search finished");
        self.results = hits;
        Ok(self.results.len())
    }

    /// Every question tagged with `segment`, matched exactly
    #[instrument(skip(self))]
    pub async fn search_segment(&mut self, segment: &str) -> DcResult<usize> {
        let segment = segment.trim();
        if segment.is_empty() {
            return Ok(self.results.len());
        }

        let hits = self.ctx.report(
            self.api
                .search_questions(&format!("segment:{segment}"), 1.0)
                .await,
            SEARCH_FAILED,
        )?;
        self.query.clear();
        self.results = hits;
        self.segment = Some(segment.to_string());
        self.panel = None;
        self.page = 1;
        Ok(self.filtered().len())
    }

    /// Segment names known to the backend, each once
    #[instrument(skip(self))]
    pub async fn segments(&self) -> DcResult<Vec<SegmentHit>> {
        let mut segments = self
            .ctx
            .report(self.api.search_segments().await, SEGMENTS_FAILED)?;
        segments.retain(|s| !s.segment_name.trim().is_empty());
        let mut seen = Vec::new();
        segments.retain(|s| {
            let fresh = !seen.contains(&s.segment_name);
            if fresh {
                seen.push(s.segment_name.clone());
            }
            fresh
        });
        Ok(segments)
    }

    /// Selecting the active segment again clears it
    pub fn toggle_segment(&mut self, segment: &str) {
        self.segment = toggled(self.segment.take(), segment);
        self.page = 1;
    }

    pub fn toggle_panel(&mut self, panel: &str) {
        self.panel = toggled(self.panel.take(), panel);
        self.page = 1;
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.segment = None;
        self.panel = None;
        self.page = 1;
    }

    /// Segments across the current results in first-seen order
    pub fn unique_segments(&self) -> Vec<&str> {
        unique(self.results.iter().flat_map(|r| r.segments.iter().map(String::as_str)))
    }

    pub fn unique_panels(&self) -> Vec<&str> {
        unique(self.results.iter().map(|r| r.panel.as_str()))
    }

    /// Results passing the segment and panel filters
    pub fn filtered(&self) -> Vec<SurveyQuestionHit> {
        self.results
            .iter()
            .filter(|r| self.segment.as_ref().map_or(true, |s| r.segments.contains(s)))
            .filter(|r| self.panel.as_ref().map_or(true, |p| r.panel == *p))
            .cloned()
            .collect()
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn page(&self) -> Page<SurveyQuestionHit> {
        paginate(
            &self.filtered(),
            PageRequest {
                page: self.page,
                per_page: self.page_size,
            },
        )
    }

    pub fn summary(&self) -> SearchSummary {
        SearchSummary {
            query: self.query.clone(),
            threshold: self.threshold,
            segment: self.segment.clone(),
            panel: self.panel.clone(),
            page: self.page(),
        }
    }
}

fn toggled(current: Option<String>, value: &str) -> Option<String> {
    match current {
        Some(active) if active == value => None,
        _ => Some(value.to_string()),
    }
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for value in values {
        if !value.trim().is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::CollectingNotifier;
    use dc_client::MemoryApi;

    fn search() -> (SurveySearch, Arc<MemoryApi>, Arc<CollectingNotifier>) {
        let api = Arc::new(MemoryApi::seeded());
        let notifier = CollectingNotifier::shared();
        let search = SurveySearch::new(
            api.clone(),
            ServiceContext::new(notifier.clone()),
            &SurveyConfig::default(),
        );
        (search, api, notifier)
    }

    #[tokio::test]
    async fn test_blank_query_is_ignored() {
        let (mut search, api, _) = search();
        assert_eq!(search.search("   ").await.unwrap(), 0);
        assert_eq!(api.call_count("search_questions"), 0);
    }

    #[tokio::test]
    async fn test_threshold_widens_results() {
        let (mut search, _api, _) = search();
        assert_eq!(search.search("permit renewal").await.unwrap(), 0);

        search.set_threshold(THRESHOLD_OPTIONS[3].0);
        assert_eq!(search.search("permit renewal").await.unwrap(), 3);
        assert_eq!(search.query(), "permit renewal");
    }

    #[tokio::test]
    async fn test_filters_reset_page() {
        let (mut search, _api, _) = search();
        search.set_threshold(0.2);
        search.search("building neighborhood home move").await.unwrap();
        assert_eq!(search.results().len(), 5);
        assert_eq!(search.unique_panels(), vec!["Residents panel", "Industry panel"]);

        search.go_to_page(2);
        assert_eq!(search.page().page, 2);
        assert_eq!(search.page().items.len(), 1);

        search.toggle_panel("Industry panel");
        assert_eq!(search.page().page, 1);
        assert_eq!(search.filtered().len(), 2);

        search.toggle_segment("architects");
        assert_eq!(search.filtered().len(), 1);
        search.toggle_segment("architects");
        search.toggle_panel("Industry panel");
        assert_eq!(search.filtered().len(), 5);
    }

    #[tokio::test]
    async fn test_search_by_segment() {
        let (mut search, api, _) = search();
        assert_eq!(search.search_segment("residents").await.unwrap(), 3);
        assert_eq!(search.segment(), Some("residents"));
        assert!(search.unique_segments().contains(&"haifa"));
        assert_eq!(api.call_count("search_questions"), 1);

        let segments = search.segments().await.unwrap();
        assert!(segments.iter().any(|s| s.segment_name == "contractors"));
    }

    #[tokio::test]
    async fn test_failure_keeps_message() {
        let (mut search, api, notifier) = search();
        api.fail_on("search_questions", 503, "");
        assert!(search.search("permit").await.is_err());
        assert_eq!(
            notifier.last().unwrap().message,
            format!("{SEARCH_FAILED} [Status: 503]")
        );
    }
}
