//! Main harvester service that ties all components together.
//!
//! One run builds (or reuses) the index, then walks it in order. Each act
//! is fetched, its sections resolved through the content endpoint, and the
//! resulting record written to the seed store. Failures stay local to the
//! act or section they happen in.

use chrono::NaiveDate;
use indicatif::ProgressBar;

use crate::config::HarvestConfig;
use crate::content::fetch_section;
use crate::error::{HarvesterError, Result};
use crate::extract::{extract_act_page, ActMetadata};
use crate::http::Transport;
use crate::listing::{discover, strategy_for, ListingStrategy};
use crate::seed::SeedStore;
use crate::text::short_name;
use crate::types::{
    IndexEntry, Provision, RecordKind, RecordState, StatuteRecord, StatuteStatus,
};

/// Date formats seen in the portal's enactment date field.
const DATE_FORMATS: &[&str] = &[
    "%d-%b-%Y",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%Y-%m-%d",
    "%d %B, %Y",
    "%d %B %Y",
];

/// Options for one harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Process at most this many acts from the head of the index.
    pub limit: Option<usize>,
    /// Reuse the index from a previous run when there is one.
    pub skip_discovery: bool,
    /// Process acts whose seed is a placeholder again.
    pub retry_placeholders: bool,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Acts whose seed was written from their act page.
    pub processed: usize,
    /// Acts left alone because of their cached seed.
    pub skipped: usize,
    /// Acts that ended in a placeholder or an error.
    pub failed: usize,
    /// Provisions written across all processed acts.
    pub provisions: usize,
}

/// Result of processing a single act.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActOutcome {
    Harvested { provisions: usize, complete: bool },
    Placeholder(String),
}

/// Sequences discovery, extraction, content retrieval and seed writes.
pub struct Harvester<'a> {
    transport: &'a dyn Transport,
    config: HarvestConfig,
    listing: Box<dyn ListingStrategy>,
    store: SeedStore,
    progress: ProgressBar,
}

impl<'a> Harvester<'a> {
    /// Create a harvester. Fails when the configuration is invalid or the
    /// output directory cannot be created.
    pub fn new(transport: &'a dyn Transport, config: HarvestConfig) -> Result<Self> {
        config.validate()?;
        let store = SeedStore::open(&config)?;
        Ok(Self {
            transport,
            listing: strategy_for(config.listing_mode),
            config,
            store,
            progress: ProgressBar::hidden(),
        })
    }

    /// Report per-act progress on `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn store(&self) -> &SeedStore {
        &self.store
    }

    /// Run the pipeline.
    ///
    /// Only setup failures are returned: an unreadable output directory, a
    /// failed index write, or a listing page that cannot be fetched while
    /// there is no previous index to fall back on.
    pub fn run(&self, options: &RunOptions) -> Result<RunStats> {
        let mut index = self.load_or_discover(options.skip_discovery)?;
        if let Some(limit) = options.limit {
            index.truncate(limit);
        }

        tracing::info!(acts = index.len(), "Harvesting statutes");
        self.progress.set_length(index.len() as u64);

        let mut stats = RunStats::default();
        for entry in &index {
            let id = entry.record_id();
            self.progress.set_message(id.clone());

            let cached = self.store.lookup(&id);
            if !cached.needs_harvest(options.retry_placeholders) {
                tracing::debug!(act = %id, cached = ?cached, "Skipping cached act");
                stats.skipped += 1;
                self.progress.inc(1);
                continue;
            }

            match self.process_act(entry) {
                Ok(ActOutcome::Harvested {
                    provisions,
                    complete,
                }) => {
                    tracing::debug!(act = %id, provisions, complete, "Act harvested");
                    stats.processed += 1;
                    stats.provisions += provisions;
                }
                Ok(ActOutcome::Placeholder(reason)) => {
                    tracing::warn!(act = %id, reason = %reason, "Wrote placeholder");
                    stats.failed += 1;
                }
                Err(e) => {
                    tracing::warn!(act = %id, error = %e, "Act failed");
                    stats.failed += 1;
                }
            }
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        tracing::info!(
            processed = stats.processed,
            skipped = stats.skipped,
            failed = stats.failed,
            provisions = stats.provisions,
            "Harvest finished"
        );
        Ok(stats)
    }

    fn load_or_discover(&self, skip_discovery: bool) -> Result<Vec<IndexEntry>> {
        if skip_discovery {
            match self.store.load_index()? {
                Some(index) => {
                    tracing::info!(acts = index.len(), "Reusing cached index");
                    return Ok(index);
                }
                None => tracing::warn!(
                    path = %self.store.index_path().display(),
                    "No cached index, running discovery"
                ),
            }
        }

        let index = match discover(self.transport, &self.config, self.listing.as_ref()) {
            Ok(index) => index,
            Err(e @ HarvesterError::Listing { .. }) => match self.store.load_index()? {
                Some(previous) => {
                    tracing::warn!(
                        error = %e,
                        acts = previous.len(),
                        "Discovery failed, keeping previous index"
                    );
                    return Ok(previous);
                }
                None => return Err(e),
            },
            Err(e) => return Err(e),
        };
        self.store.save_index(&index)?;
        Ok(index)
    }

    /// Harvest one act and write its seed.
    pub fn process_act(&self, entry: &IndexEntry) -> Result<ActOutcome> {
        let response = match self.transport.request(&entry.url) {
            Ok(response) => response,
            Err(e) => return self.placeholder(entry, e.to_string()),
        };
        if !response.is_ok() {
            return self.placeholder(entry, format!("HTTP {}", response.status));
        }

        let page = extract_act_page(&response.body);
        let mut sections = page.sections;
        if sections.is_empty() {
            return self.placeholder(entry, "no sections extracted".to_string());
        }
        if sections.len() > self.config.max_sections_per_act {
            tracing::warn!(
                act = %entry.record_id(),
                found = sections.len(),
                kept = self.config.max_sections_per_act,
                "Too many sections, dropping the rest"
            );
            sections.truncate(self.config.max_sections_per_act);
        }
        tracing::debug!(
            act = %entry.record_id(),
            sections = sections.len(),
            strategy = page.strategy.unwrap_or_default(),
            "Sections extracted"
        );

        let provisions = sections
            .iter()
            .map(|section| fetch_section(self.transport, &self.config, section))
            .collect();

        let record = build_record(entry, &page.metadata, provisions);
        self.store.write(&record)?;

        Ok(ActOutcome::Harvested {
            provisions: record.provisions.len(),
            complete: record.is_complete(),
        })
    }

    fn placeholder(&self, entry: &IndexEntry, reason: String) -> Result<ActOutcome> {
        self.store.write_placeholder(entry, &reason)?;
        Ok(ActOutcome::Placeholder(reason))
    }
}

/// Assemble the seed record of an act from its index entry, page metadata
/// and provisions.
///
/// The id always comes from the index entry so that the seed can be found
/// again on the next run.
#[must_use]
pub fn build_record(
    entry: &IndexEntry,
    metadata: &ActMetadata,
    provisions: Vec<Provision>,
) -> StatuteRecord {
    let title = metadata
        .short_title
        .clone()
        .unwrap_or_else(|| entry.title.clone());

    let mut record = StatuteRecord {
        id: entry.record_id(),
        kind: RecordKind::Statute,
        short_name: short_name(&title, entry.year),
        status: StatuteStatus::derive(metadata.status.as_deref(), &title),
        issued_date: metadata.enactment_date.as_deref().map(normalize_date),
        url: entry.url.clone(),
        provisions,
        language: metadata.language.clone(),
        state: RecordState::Incomplete,
        title,
    };
    if record.has_content() {
        record.state = RecordState::Complete;
    }
    record
}

/// Normalize an enactment date to `YYYY-MM-DD`; unknown formats are kept
/// as given.
///
/// # Examples
/// ```
/// use statute_harvester::harvester::normalize_date;
///
/// assert_eq!(normalize_date("6-Oct-1860"), "1860-10-06");
/// assert_eq!(normalize_date("sometime in 1860"), "sometime in 1860");
/// ```
#[must_use]
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map_or_else(|| raw.to_string(), |date| date.format("%Y-%m-%d").to_string())
}
