//! Per-view orchestration over the query façade.
//!
//! Reads follow fetch → index → assemble, with the independent fetches of a
//! view issued concurrently. Writes follow normalize → validate → insert →
//! re-list; nothing is sent to the backend when validation fails.

pub mod account;
pub mod analytics;
pub mod entries;
pub mod exits;
pub mod labels;
pub mod products;
pub mod trace;
pub mod usage;

pub use account::{AccountService, AccountSummary};
pub use analytics::{AnalyticsReport, AnalyticsService};
pub use entries::EntryService;
pub use exits::ExitService;
pub use labels::{BatchLabel, LabelService};
pub use products::ProductService;
pub use trace::{TraceQuery, TraceReport, TraceService};
pub use usage::UsageService;
