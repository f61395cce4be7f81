//! Report facade: the single search-and-render entry point.

use std::sync::Arc;

use crate::config::{settings, ConfigLookup};
use crate::error::{ConfigError, ReportError};
use crate::profile::ReportProfile;
use crate::render::HtmlTableRenderer;
use crate::search::{CompoundTerm, SearchEngine};
use crate::store::RecordStore;
use crate::types::{LanguageTag, RecordSet, RenderedReport};

/// Per-facade tuning, normally built from configuration by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Cap on the unioned record set. `None` renders everything.
    pub max_records: Option<usize>,
}

impl ReportOptions {
    /// Read `search_max_records`. Zero means unlimited.
    pub fn from_config<C: ConfigLookup>(config: &C) -> Result<Self, ConfigError> {
        let max_records = config
            .get_parsed::<usize>(settings::SEARCH_MAX_RECORDS)?
            .filter(|max| *max > 0);
        Ok(Self { max_records })
    }
}

/// Orchestrates search then render against one profile and one store.
///
/// Holds no per-call state; share it across threads behind an `Arc` when the
/// store allows.
pub struct ReportFacade<S> {
    profile: Arc<ReportProfile>,
    store: S,
    options: ReportOptions,
}

impl<S: RecordStore> ReportFacade<S> {
    pub fn new(profile: Arc<ReportProfile>, store: S) -> Self {
        Self {
            profile,
            store,
            options: ReportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn profile(&self) -> &ReportProfile {
        &self.profile
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a compound `term|lang` input.
    ///
    /// Malformed input fails before the store is touched.
    pub fn run(&self, raw: &str) -> Result<RenderedReport, ReportError> {
        let compound = CompoundTerm::parse(raw)?;
        self.run_term(&compound.term, &compound.lang)
    }

    /// Search for `term` and render the matches in `lang`.
    pub fn run_term(&self, term: &str, lang: &LanguageTag) -> Result<RenderedReport, ReportError> {
        let records = SearchEngine::new(&self.profile, &self.store)
            .with_max_records(self.options.max_records)
            .search(term, lang)?;
        tracing::debug!(records = records.len(), truncated = records.truncated, "search finished");
        self.renderer().render(&records, lang)
    }

    /// Header-only report with a zero count, for callers presenting
    /// [`ReportError::NoMatchableCriteria`].
    pub fn empty_report(&self, lang: &LanguageTag) -> Result<RenderedReport, ReportError> {
        self.renderer().render(&RecordSet::empty(), lang)
    }

    fn renderer(&self) -> HtmlTableRenderer<'_> {
        HtmlTableRenderer::new(&self.profile, &self.store)
    }
}
