//! HTML extraction for search-result and event-detail pages.
//!
//! Everything here is a pure function of its input: no network access, no
//! retries, no rate limiting. The selector lists mirror the target site's
//! current markup; when the structure changes, this module is the only
//! place that needs to follow.
//!
//! Card extraction is lossy by contract: a fragment missing a required
//! field (id, title, link) is skipped with a warning and the rest of the
//! page still yields records. Only [`extract_detail`] can fail, because a
//! detail page has exactly one chance to produce its record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use evescout_core::EventRecord;

use crate::error::ScraperError;

static CARD_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "div[data-testid='event-card']",
        ".search-event-card-wrapper",
        ".eds-event-card-content",
        ".eds-event-card",
        "[data-spec='event-card']",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("card selector"))
    .collect()
});

static TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "[data-testid='event-card-title']",
        ".eds-event-card__formatted-name--is-clamped",
        ".eds-event-card__formatted-name",
        ".card-text--truncated__one",
        "h3",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("title selector"))
    .collect()
});

static COUNT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "[data-testid='search-results-header']",
        ".eds-text-hl",
        "h1",
        ".search-results-header",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("count selector"))
    .collect()
});

static PAGINATION_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [".pagination", ".eds-pagination", "[data-spec='pagination']"]
        .iter()
        .map(|s| Selector::parse(s).expect("pagination selector"))
        .collect()
});

static DETAIL_TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "[data-testid='event-title']",
        ".event-title",
        "h1",
        ".eds-text-hl",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("detail title selector"))
    .collect()
});

static EVENT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href*='/e/']").expect("event link selector"));
static TIME_TAG: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time[datetime]").expect("time selector"));
static PAGE_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").expect("li selector"));
static JSON_LD: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script[type='application/ld+json']").expect("json-ld selector")
});
static CANONICAL_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel='canonical']").expect("canonical selector"));
static DOC_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("title tag"));

/// The site-assigned event id is the trailing digit run of the detail URL
/// slug, e.g. `/e/jazz-night-tickets-1273996400529`.
static EVENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/e/[^/]+-(\d+)").expect("event id regex"));
static COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s+events?").expect("count regex"));

/// Extracts every legible event card from a search-results page.
///
/// Relative detail links are absolutized against `base_url`. Malformed
/// cards are dropped with a warning; the page as a whole never fails.
/// Calling this twice on identical content yields identical records in
/// identical order.
#[must_use]
pub fn extract_events(html: &str, base_url: &str) -> Vec<EventRecord> {
    let document = Html::parse_document(html);
    let cards = find_cards(&document);
    let mut records = Vec::with_capacity(cards.len());
    for card in cards {
        if let Some(record) = record_from_card(card, base_url) {
            records.push(record);
        }
    }
    tracing::debug!(count = records.len(), "extracted event records");
    records
}

/// Best-effort total result count for a search page.
///
/// Falls back through the site's three signals: the results-header text,
/// the pagination control (last page number x page size), and finally the
/// number of cards on the page itself.
#[must_use]
pub fn extract_total_count(html: &str, page_size: u32) -> usize {
    let document = Html::parse_document(html);

    for selector in COUNT_SELECTORS.iter() {
        for element in document.select(selector) {
            let text = inner_text(element);
            if let Some(caps) = COUNT_RE.captures(&text) {
                if let Ok(total) = caps[1].parse::<usize>() {
                    return total;
                }
            }
        }
    }

    for selector in PAGINATION_SELECTORS.iter() {
        if let Some(pagination) = document.select(selector).next() {
            let items: Vec<_> = pagination.select(&PAGE_ITEM).collect();
            // The last item is the "next" control; the one before it is the
            // highest page number.
            if items.len() >= 2 {
                if let Ok(pages) = inner_text(items[items.len() - 2]).parse::<usize>() {
                    return pages * page_size as usize;
                }
            }
        }
    }

    find_cards(&document).len()
}

/// Extracts the single event record from a detail page.
///
/// Prefers JSON-LD structured data, then falls back to the page's metadata
/// region (canonical link tag, heading/title text).
///
/// # Errors
///
/// Returns [`ScraperError::Extraction`] when the id or title cannot be
/// established from either source.
pub fn extract_detail(html: &str, base_url: &str) -> Result<EventRecord, ScraperError> {
    let document = Html::parse_document(html);

    if let Some(record) = record_from_json_ld(&document, base_url) {
        return Ok(record);
    }

    let url = canonical_url(&document, base_url).ok_or_else(|| ScraperError::Extraction {
        context: "event detail page".to_string(),
        reason: "no JSON-LD event data and no canonical link".to_string(),
    })?;
    let id = event_id_from_url(&url).ok_or_else(|| ScraperError::Extraction {
        context: "event detail page".to_string(),
        reason: format!("no event id in canonical URL {url}"),
    })?;

    let title = DETAIL_TITLE_SELECTORS
        .iter()
        .find_map(|sel| first_document_text(&document, sel))
        .or_else(|| first_document_text(&document, &DOC_TITLE))
        .ok_or_else(|| ScraperError::Extraction {
            context: format!("event detail page for {id}"),
            reason: "no title element found".to_string(),
        })?;

    let start_date = document
        .select(&TIME_TAG)
        .find_map(|el| el.value().attr("datetime"))
        .and_then(parse_event_datetime);

    Ok(EventRecord {
        id,
        title,
        url,
        start_date,
    })
}

/// Pulls the event id out of a detail URL, if present.
pub(crate) fn event_id_from_url(url: &str) -> Option<String> {
    EVENT_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
}

fn find_cards<'a>(document: &'a Html) -> Vec<ElementRef<'a>> {
    for selector in CARD_SELECTORS.iter() {
        let cards: Vec<_> = document.select(selector).collect();
        if !cards.is_empty() {
            return cards;
        }
    }

    // Last resort: climb from each detail link to the nearest div ancestor
    // and treat that as the card.
    let mut cards = Vec::new();
    for link in document.select(&EVENT_LINK) {
        let mut node = link.parent();
        for _ in 0..3 {
            let Some(n) = node else { break };
            if let Some(el) = ElementRef::wrap(n) {
                if el.value().name() == "div" {
                    cards.push(el);
                    break;
                }
            }
            node = n.parent();
        }
    }
    if cards.is_empty() {
        tracing::warn!("no event cards found in page");
    }
    cards
}

fn record_from_card(card: ElementRef<'_>, base_url: &str) -> Option<EventRecord> {
    let href = first_attr(&card, &EVENT_LINK, "href").or_else(|| {
        card.value()
            .attr("href")
            .filter(|h| h.contains("/e/"))
            .map(str::to_string)
    });
    let Some(href) = href else {
        tracing::warn!("event card without a detail link, skipping");
        return None;
    };

    let Some(url) = absolute_url(base_url, &href) else {
        tracing::warn!(href, "could not absolutize card link, skipping");
        return None;
    };

    let Some(id) = event_id_from_url(&url) else {
        tracing::warn!(url, "no event id in card link, skipping");
        return None;
    };

    let title = TITLE_SELECTORS
        .iter()
        .find_map(|sel| first_text(&card, sel));
    let Some(title) = title else {
        tracing::warn!(id, "event card missing title, skipping");
        return None;
    };

    let start_date = first_attr(&card, &TIME_TAG, "datetime").and_then(|v| parse_event_datetime(&v));

    Some(EventRecord {
        id,
        title,
        url,
        start_date,
    })
}

fn record_from_json_ld(document: &Html, base_url: &str) -> Option<EventRecord> {
    for script in document.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        let Ok(data) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        let Some(obj) = data.as_object() else {
            continue;
        };

        let type_ok = obj.get("@type").and_then(Value::as_str).is_some_and(|t| {
            matches!(
                t,
                "Event" | "SocialEvent" | "BusinessEvent" | "EducationEvent" | "MusicEvent"
            )
        });
        // Some pages omit @type but still carry event-shaped data.
        let shape_ok = obj.contains_key("startDate") && obj.contains_key("name");
        if !type_ok && !shape_ok {
            continue;
        }

        let Some(title) = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            continue;
        };

        let url = obj
            .get("url")
            .and_then(Value::as_str)
            .and_then(|u| absolute_url(base_url, u))
            .or_else(|| canonical_url(document, base_url));
        let Some(url) = url else { continue };
        let Some(id) = event_id_from_url(&url) else {
            continue;
        };

        let start_date = obj
            .get("startDate")
            .and_then(Value::as_str)
            .and_then(parse_event_datetime);

        return Some(EventRecord {
            id,
            title: title.to_string(),
            url,
            start_date,
        });
    }
    None
}

fn canonical_url(document: &Html, base_url: &str) -> Option<String> {
    document
        .select(&CANONICAL_LINK)
        .find_map(|el| el.value().attr("href"))
        .and_then(|href| absolute_url(base_url, href))
}

fn parse_event_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Timestamps without an offset are treated as UTC.
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).find_map(|el| {
        let text = inner_text(el);
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    })
}

fn first_document_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).find_map(|el| {
        let text = inner_text(el);
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    })
}

fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .find_map(|el| el.value().attr(attr))
        .map(str::to_string)
}

fn absolute_url(base: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    reqwest::Url::parse(base)
        .ok()?
        .join(href)
        .ok()
        .map(|u| u.to_string())
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
