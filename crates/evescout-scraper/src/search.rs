//! Search orchestration: target expansion, pagination, deduplication, and
//! detail lookup.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use evescout_core::{EventRecord, ResultPage, ScraperConfig, SearchFilter};

use crate::client::EventbriteClient;
use crate::error::ScraperError;
use crate::extract::{extract_detail, extract_events, extract_total_count};
use crate::governor::RateGovernor;
use crate::targets::{expand_targets, FetchTarget};

/// The fetch-and-extract pipeline's public surface.
///
/// One instance per process; concurrent `search` calls share the rate
/// governor, so the outbound request rate stays bounded no matter how many
/// are in flight. Callers cancel a search by dropping its future: no
/// further target is started, and a browser-path fetch still closes its
/// tab through the pool's guard.
pub struct EventScout {
    client: EventbriteClient,
    base_url: String,
    max_pages_per_target: usize,
}

impl EventScout {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ScraperConfig) -> Result<Self, ScraperError> {
        let governor = Arc::new(RateGovernor::new(Duration::from_secs_f64(
            config.request_delay_secs.max(0.0),
        )));
        let client = EventbriteClient::new(config, governor)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_pages_per_target: config.max_pages_per_target.max(1),
        })
    }

    /// Runs one search: expands the filter into fetch targets, walks their
    /// result pages, and assembles a deduplicated, order-preserving page of
    /// records.
    ///
    /// A failing target is logged and abandoned; the call only fails when
    /// every target failed.
    ///
    /// For a single-target search, `total_count` prefers the site-reported
    /// total from the first results page (header text, pagination, or card
    /// count); across multiple targets those numbers do not compose, so the
    /// matched-record count is reported instead.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::SearchUnavailable`] when no target completed
    /// a single fetch.
    pub async fn search(&self, filter: &SearchFilter) -> Result<ResultPage, ScraperError> {
        let started = Instant::now();
        let targets = expand_targets(filter);
        let target_count = targets.len();
        let page_size = filter.page_size as usize;
        // One page_size of slack beyond the requested slice, so the slice
        // is always satisfiable without over-fetching further targets.
        let wanted = filter.page as usize * page_size + page_size;

        let mut seen: HashSet<String> = HashSet::new();
        let mut collected: Vec<EventRecord> = Vec::new();
        let mut successful_targets = 0usize;
        let mut site_total: Option<usize> = None;

        'targets: for target in targets {
            let mut page_no = target.page;
            let mut target_succeeded = false;

            loop {
                let current = FetchTarget {
                    page: page_no,
                    ..target.clone()
                };
                let url = match current.url(&self.base_url, filter.start_date, filter.end_date) {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::warn!(error = %e, "unbuildable fetch target, abandoning");
                        break;
                    }
                };

                let page = match self.client.fetch(&url).await {
                    Ok(page) => page,
                    Err(e) => {
                        tracing::warn!(url, error = %e, "fetch target abandoned");
                        break;
                    }
                };
                target_succeeded = true;

                if target_count == 1 && site_total.is_none() {
                    site_total = Some(extract_total_count(&page.html, filter.page_size));
                }

                let records = extract_events(&page.html, &self.base_url);
                if records.is_empty() {
                    // Zero extracted records signals exhausted results.
                    break;
                }
                for record in records {
                    if seen.insert(record.id.clone()) {
                        collected.push(record);
                    }
                }

                if collected.len() >= wanted {
                    successful_targets += 1;
                    break 'targets;
                }

                page_no += 1;
                if (page_no - target.page) as usize >= self.max_pages_per_target {
                    tracing::debug!(
                        location = target.location,
                        keyword = target.keyword.as_deref().unwrap_or(""),
                        "page probe limit reached for target"
                    );
                    break;
                }
            }

            if target_succeeded {
                successful_targets += 1;
            }
        }

        if successful_targets == 0 {
            return Err(ScraperError::SearchUnavailable {
                targets_failed: target_count,
            });
        }

        let matched: Vec<EventRecord> = collected
            .into_iter()
            .filter(|r| matches_keywords(r, &filter.keywords))
            .filter(|r| within_date_range(r, filter.start_date, filter.end_date))
            .collect();

        // The site's own total covers pages the walk never reached; it is
        // only trusted when one target served the whole query.
        let total_count = match site_total {
            Some(site) => site.max(matched.len()),
            None => matched.len(),
        };
        let offset = (filter.page as usize - 1) * page_size;
        let mut events: Vec<EventRecord> =
            matched.into_iter().skip(offset).take(page_size).collect();
        if let Some(limit) = filter.limit {
            events.truncate(limit);
        }

        let search_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            events = events.len(),
            total_count,
            search_time_ms,
            "search complete"
        );
        Ok(ResultPage {
            events,
            total_count,
            page: filter.page,
            page_size: filter.page_size,
            search_time_ms,
        })
    }

    /// Fetches and extracts a single event's detail page.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::EventNotFound`]: the site reports the id does not
    ///   exist on either known detail URL shape.
    /// - [`ScraperError::Extraction`]: the page loaded but id/title could
    ///   not be established.
    /// - Any fetch error from the underlying client.
    pub async fn get_event(&self, event_id: &str) -> Result<EventRecord, ScraperError> {
        let primary = format!("{}/e/event-tickets-{event_id}", self.base_url);
        let page = match self.client.fetch(&primary).await {
            Ok(page) => page,
            Err(ScraperError::NotFound { .. }) => {
                // Older listings only answer on the short ticket URL.
                let fallback = format!("{}/e/tickets-{event_id}", self.base_url);
                match self.client.fetch(&fallback).await {
                    Ok(page) => page,
                    Err(ScraperError::NotFound { .. }) => {
                        return Err(ScraperError::EventNotFound {
                            event_id: event_id.to_string(),
                        });
                    }
                    Err(other) => return Err(other),
                }
            }
            Err(other) => return Err(other),
        };

        extract_detail(&page.html, &self.base_url)
    }
}

/// Case-insensitive keyword relevance: a record matches when any keyword
/// appears in its title or URL, or (for hyphenated compounds) when every
/// component word appears in the title. Title and URL are the only text a
/// card yields; richer fields like description or category are not
/// available at this stage, so matching is narrower than a full-text
/// relevance check.
fn matches_keywords(record: &EventRecord, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let title = record.title.to_lowercase();
    let url = record.url.to_lowercase();
    keywords.iter().any(|keyword| {
        let keyword = keyword.to_lowercase();
        if title.contains(&keyword) || url.contains(&keyword) {
            return true;
        }
        keyword.contains('-')
            && keyword
                .split('-')
                .filter(|w| !w.is_empty())
                .all(|w| title.contains(w))
    })
}

/// Best-effort date filtering: records without a captured date pass through.
fn within_date_range(
    record: &EventRecord,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> bool {
    let Some(dt) = record.start_date else {
        return true;
    };
    let date = dt.date_naive();
    if start.is_some_and(|s| date < s) {
        return false;
    }
    if end.is_some_and(|e| date > e) {
        return false;
    }
    true
}
