//! Statute Harvester - Download statutes from a government legal portal.
//!
//! This crate crawls the portal's listing into an index of statutes, then
//! turns each statute's act page and section content into one JSON seed
//! record. Runs are resumable: complete seeds are never fetched again and
//! failed acts leave a placeholder behind.
//!
//! # Example
//!
//! ```
//! use statute_harvester::text::{provision_ref, short_name};
//! use statute_harvester::types::record_id;
//!
//! assert_eq!(record_id("45", 1860), "act-45-1860");
//! assert_eq!(provision_ref("43A."), "s43A");
//! assert_eq!(short_name("The Indian Penal Code, 1860", 1860), "IPC 1860");
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration constants and [`HarvestConfig`]
//! - [`error`]: Error types and Result alias
//! - [`http`]: Rate-limited, retrying transport
//! - [`listing`]: Listing crawl and index deduplication
//! - [`extract`]: Act page metadata and section references
//! - [`content`]: Section content retrieval
//! - [`html`] and [`text`]: Markup and text helpers
//! - [`types`]: Index entries, provisions and seed records
//! - [`seed`]: On-disk index and seed files
//! - [`harvester`]: Pipeline orchestration
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod harvester;
pub mod html;
pub mod http;
pub mod listing;
pub mod seed;
pub mod text;
pub mod types;

pub use config::{HarvestConfig, ListingMode};
pub use error::{HarvesterError, Result};
pub use harvester::{Harvester, RunOptions, RunStats};
pub use http::{RateLimitedTransport, Response, Transport};
pub use seed::{CacheStatus, SeedStore};
pub use types::{IndexEntry, Provision, RecordState, StatuteRecord, StatuteStatus};
