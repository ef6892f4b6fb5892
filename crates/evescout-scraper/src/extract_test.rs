use super::*;

const BASE: &str = "https://www.eventbrite.com";

fn card(slug: &str, id: &str, title: &str) -> String {
    format!(
        r#"<div data-testid="event-card">
            <a href="/e/{slug}-{id}"><h3>{title}</h3></a>
        </div>"#
    )
}

fn search_page(cards: &[String]) -> String {
    format!(
        "<html><body><h1>{} events</h1>{}</body></html>",
        cards.len(),
        cards.join("\n")
    )
}

#[test]
fn extracts_id_title_and_absolute_url_from_cards() {
    let html = search_page(&[card("jazz-night-tickets", "1001", "Jazz Night")]);
    let records = extract_events(&html, BASE);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "1001");
    assert_eq!(records[0].title, "Jazz Night");
    assert_eq!(
        records[0].url,
        "https://www.eventbrite.com/e/jazz-night-tickets-1001"
    );
}

#[test]
fn keeps_already_absolute_urls() {
    let html = search_page(&[r#"<div data-testid="event-card">
            <a href="https://www.eventbrite.com/e/gala-tickets-2002"><h3>Gala</h3></a>
        </div>"#
        .to_string()]);
    let records = extract_events(&html, BASE);
    assert_eq!(
        records[0].url,
        "https://www.eventbrite.com/e/gala-tickets-2002"
    );
}

#[test]
fn malformed_card_is_dropped_and_rest_survive() {
    // Middle card's link has no trailing numeric id, so no id can be parsed.
    let html = search_page(&[
        card("jazz-night-tickets", "1001", "Jazz Night"),
        r#"<div data-testid="event-card"><a href="/e/broken-link"><h3>Broken</h3></a></div>"#
            .to_string(),
        card("blues-jam-tickets", "1003", "Blues Jam"),
    ]);
    let records = extract_events(&html, BASE);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "1001");
    assert_eq!(records[1].id, "1003");
}

#[test]
fn card_without_title_is_dropped() {
    let html = search_page(&[
        r#"<div data-testid="event-card"><a href="/e/untitled-tickets-5"></a></div>"#.to_string(),
        card("jazz-night-tickets", "1001", "Jazz Night"),
    ]);
    let records = extract_events(&html, BASE);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "1001");
}

#[test]
fn extraction_is_idempotent() {
    let html = search_page(&[
        card("jazz-night-tickets", "1001", "Jazz Night"),
        card("blues-jam-tickets", "1003", "Blues Jam"),
    ]);
    let first = extract_events(&html, BASE);
    let second = extract_events(&html, BASE);
    assert_eq!(first, second);
}

#[test]
fn falls_back_to_link_parents_when_no_known_card_markup() {
    let html = r#"<html><body>
        <div class="unknown-redesign-wrapper">
            <a href="/e/secret-show-tickets-7777">Secret Show</a>
        </div>
    </body></html>"#;
    let records = extract_events(html, BASE);

    // Title comes up empty (no h3/known class inside the div), so the
    // fallback still drops the card rather than inventing a title.
    assert!(records.is_empty());

    let html = r#"<html><body>
        <div class="unknown-redesign-wrapper">
            <a href="/e/secret-show-tickets-7777"><h3>Secret Show</h3></a>
        </div>
    </body></html>"#;
    let records = extract_events(html, BASE);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "7777");
}

#[test]
fn captures_machine_readable_card_date() {
    let html = search_page(&[r#"<div data-testid="event-card">
            <a href="/e/jazz-night-tickets-1001"><h3>Jazz Night</h3></a>
            <time datetime="2025-06-01T20:00:00Z">Sun, Jun 1</time>
        </div>"#
        .to_string()]);
    let records = extract_events(&html, BASE);
    let date = records[0].start_date.expect("date should be captured");
    assert_eq!(date.to_rfc3339(), "2025-06-01T20:00:00+00:00");
}

#[test]
fn card_without_date_yields_none() {
    let html = search_page(&[card("jazz-night-tickets", "1001", "Jazz Night")]);
    let records = extract_events(&html, BASE);
    assert!(records[0].start_date.is_none());
}

#[test]
fn total_count_from_results_header() {
    let html = "<html><body><h1>214 events in Barcelona</h1></body></html>";
    assert_eq!(extract_total_count(html, 20), 214);
}

#[test]
fn total_count_estimated_from_pagination() {
    let html = r#"<html><body>
        <ul class="pagination"><li>1</li><li>2</li><li>3</li><li>next</li></ul>
    </body></html>"#;
    assert_eq!(extract_total_count(html, 20), 60);
}

#[test]
fn total_count_falls_back_to_card_count() {
    let html = format!(
        "<html><body>{}{}</body></html>",
        card("a-tickets", "1", "A"),
        card("b-tickets", "2", "B")
    );
    assert_eq!(extract_total_count(&html, 20), 2);
}

#[test]
fn detail_prefers_json_ld() {
    let html = r#"<html><head>
        <script type="application/ld+json">
        {"@type":"Event","name":"Jazz Night",
         "url":"https://www.eventbrite.com/e/jazz-night-tickets-1273996400529",
         "startDate":"2025-06-01T20:00:00Z"}
        </script>
    </head><body><h1>Something else entirely</h1></body></html>"#;
    let record = extract_detail(html, BASE).unwrap();

    assert_eq!(record.id, "1273996400529");
    assert_eq!(record.title, "Jazz Night");
    assert!(record.url.contains("1273996400529"));
    assert!(record.start_date.is_some());
}

#[test]
fn detail_accepts_json_ld_without_type_but_with_event_shape() {
    let html = r#"<html><head>
        <script type="application/ld+json">
        {"name":"Jazz Night",
         "url":"/e/jazz-night-tickets-42",
         "startDate":"2025-06-01"}
        </script>
    </head><body></body></html>"#;
    let record = extract_detail(html, BASE).unwrap();
    assert_eq!(record.id, "42");
}

#[test]
fn detail_falls_back_to_canonical_link_and_heading() {
    let html = r#"<html><head>
        <link rel="canonical" href="https://www.eventbrite.com/e/gala-tickets-2002"/>
        <title>Gala | Eventbrite</title>
    </head><body><h1>Annual Gala</h1></body></html>"#;
    let record = extract_detail(html, BASE).unwrap();

    assert_eq!(record.id, "2002");
    assert_eq!(record.title, "Annual Gala");
    assert_eq!(record.url, "https://www.eventbrite.com/e/gala-tickets-2002");
}

#[test]
fn detail_fails_without_id_source() {
    let html = "<html><body><h1>Who knows</h1></body></html>";
    let err = extract_detail(html, BASE).unwrap_err();
    assert!(matches!(err, ScraperError::Extraction { .. }));
}

#[test]
fn detail_fails_when_canonical_has_no_id() {
    let html = r#"<html><head>
        <link rel="canonical" href="https://www.eventbrite.com/d/spain--barcelona/"/>
    </head><body><h1>Search results</h1></body></html>"#;
    let err = extract_detail(html, BASE).unwrap_err();
    assert!(matches!(err, ScraperError::Extraction { .. }));
}

#[test]
fn event_id_parses_from_slugged_urls() {
    assert_eq!(
        event_id_from_url("https://www.eventbrite.com/e/jazz-night-tickets-1273996400529"),
        Some("1273996400529".to_string())
    );
    assert_eq!(
        event_id_from_url("/e/a-b-c-9?aff=x"),
        Some("9".to_string())
    );
    assert_eq!(event_id_from_url("https://www.eventbrite.com/d/spain--barcelona/"), None);
}
