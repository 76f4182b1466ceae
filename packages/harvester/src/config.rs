//! Configuration constants, run configuration and URL builders.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::{HarvesterError, Result};

/// Base URL of the legal portal.
pub const DEFAULT_BASE_URL: &str = "https://www.indiacode.nic.in";

/// Path of the browse/listing endpoint, relative to the base URL.
pub const DEFAULT_LISTING_PATH: &str = "/handle/123456789/1362/browse";

/// Path of the section content endpoint, relative to the base URL.
pub const DEFAULT_CONTENT_PATH: &str = "/SectionPageContent";

/// Minimum spacing between two outbound requests (milliseconds).
pub const MIN_REQUEST_INTERVAL_MS: u64 = 500;

/// Number of retries after the first attempt for retryable responses.
pub const MAX_RETRIES: u32 = 3;

/// Unit of the exponential backoff; the wait before retry `n` is `unit * 2^(n+1)`.
pub const BACKOFF_UNIT_MS: u64 = 1000;

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Number of entries requested per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Hard bound on listing pages, so a broken "next page" signal cannot loop forever.
pub const MAX_LISTING_PAGES: u32 = 500;

/// Hard bound on section references processed for a single act.
pub const MAX_SECTIONS_PER_ACT: usize = 5000;

/// Default output directory for the index and seed files.
pub const DEFAULT_OUTPUT_DIR: &str = "data/statutes";

/// File name of the index artifact inside the output directory.
pub const INDEX_FILE_NAME: &str = "index.json";

/// Sub-directory of the output directory holding one seed file per statute.
pub const SEED_DIR_NAME: &str = "statutes";

/// User agent string identifying this harvester.
pub const USER_AGENT: &str = concat!("statute-harvester/", env!("CARGO_PKG_VERSION"));

/// `Accept` header sent with every request.
pub const ACCEPT: &str = "text/html,application/json,*/*";

/// Markup shape of the listing endpoint, which differs between portal skins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    /// Data table with one row per act, paged by page number.
    #[default]
    Table,
    /// Generic item list, paged by entry offset.
    List,
}

impl ListingMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::List => "list",
        }
    }
}

impl fmt::Display for ListingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingMode {
    type Err = HarvesterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "list" => Ok(Self::List),
            other => Err(HarvesterError::Config(format!(
                "unknown listing mode '{other}', expected 'table' or 'list'"
            ))),
        }
    }
}

/// Tunables for a harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub base_url: String,
    pub listing_path: String,
    pub content_path: String,
    pub listing_mode: ListingMode,
    pub page_size: u32,
    pub max_pages: u32,
    pub max_sections_per_act: usize,
    pub min_request_interval: Duration,
    pub max_retries: u32,
    pub backoff_unit: Duration,
    pub timeout: Duration,
    pub output_dir: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            listing_path: DEFAULT_LISTING_PATH.to_string(),
            content_path: DEFAULT_CONTENT_PATH.to_string(),
            listing_mode: ListingMode::default(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: MAX_LISTING_PAGES,
            max_sections_per_act: MAX_SECTIONS_PER_ACT,
            min_request_interval: Duration::from_millis(MIN_REQUEST_INTERVAL_MS),
            max_retries: MAX_RETRIES,
            backoff_unit: Duration::from_millis(BACKOFF_UNIT_MS),
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl HarvestConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_listing_mode(mut self, mode: ListingMode) -> Self {
        self.listing_mode = mode;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_max_sections_per_act(mut self, max_sections: usize) -> Self {
        self.max_sections_per_act = max_sections;
        self
    }

    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Check the configuration before any request is made.
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.base_url)?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(HarvesterError::Config(format!(
                "base URL must be http or https: {}",
                self.base_url
            )));
        }
        if self.page_size == 0 {
            return Err(HarvesterError::Config("page size must be at least 1".into()));
        }
        if self.max_pages == 0 {
            return Err(HarvesterError::Config("max pages must be at least 1".into()));
        }
        Ok(())
    }

    /// Resolve an href found on a portal page against the base URL.
    ///
    /// Absolute hrefs pass through unchanged.
    pub fn resolve_url(&self, href: &str) -> Result<String> {
        let base = Url::parse(&self.base_url)?;
        Ok(base.join(href.trim())?.to_string())
    }

    /// Build a listing URL with the common browse parameters plus one
    /// paging parameter chosen by the listing strategy.
    pub fn listing_url(&self, paging_param: &str, paging_value: u64) -> Result<String> {
        let mut url = Url::parse(&self.base_url)?.join(&self.listing_path)?;
        url.query_pairs_mut()
            .append_pair("type", "shorttitle")
            .append_pair("sort_by", "1")
            .append_pair("order", "ASC")
            .append_pair("rpp", &self.page_size.to_string())
            .append_pair(paging_param, &paging_value.to_string());
        Ok(url.to_string())
    }

    /// Build the content endpoint URL for one section.
    pub fn section_content_url(&self, act_id: &str, section_id: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_url)?.join(&self.content_path)?;
        url.query_pairs_mut()
            .append_pair("actid", act_id)
            .append_pair("sectionID", section_id);
        Ok(url.to_string())
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(INDEX_FILE_NAME)
    }

    #[must_use]
    pub fn seed_dir(&self) -> PathBuf {
        self.output_dir.join(SEED_DIR_NAME)
    }
}
