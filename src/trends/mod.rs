//! Trend Fetching
//!
//! Reference skill: polls resource locators for trend signals and emits
//! alerts for those that clear a relevance threshold.
//!
//! # Architecture
//!
//! ```text
//! TrendFetchConfig ──► TrendFetcher ──► ResourceSource (per URI, concurrent)
//!                           │              ├── HttpSource   (reqwest)
//!                           │              ├── CachedSource (moka)
//!                           │              └── MemorySource (in-process)
//!                           ▼
//!                      FetchReport { alerts, failures }  |  TotalFetchFailure
//! ```

pub mod alert;
pub mod cache;
pub mod config;
pub mod fetcher;
pub mod http;
pub mod skill;
pub mod source;

pub use alert::{AlertKind, Trend, TrendAlert, TREND_ALERT_EVENT_TYPE};
pub use cache::{CacheStats, CachedSource};
pub use config::TrendFetchConfig;
pub use fetcher::{FetchError, FetchReport, ResourceFetchFailure, TrendFetcher};
pub use http::HttpSource;
pub use skill::TrendFetchSkill;
pub use source::{MemorySource, RawSignal, ResourceError, ResourceSource};
