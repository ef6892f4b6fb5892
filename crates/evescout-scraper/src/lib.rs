pub mod browser;
pub mod client;
pub mod error;
pub mod extract;
pub mod governor;
pub mod search;
pub mod targets;

mod retry;

pub use client::{EventbriteClient, FetchedPage};
pub use error::ScraperError;
pub use extract::{extract_detail, extract_events, extract_total_count};
pub use governor::RateGovernor;
pub use search::EventScout;
