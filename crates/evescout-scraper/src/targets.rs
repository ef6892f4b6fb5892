//! Fetch-target expansion and search URL construction.
//!
//! A [`FetchTarget`] is one concrete (location, keyword, page) the pipeline
//! will request. Targets are generated per search call and consumed within
//! it; the orchestrator advances `page` as it walks a target's results.

use chrono::NaiveDate;

use evescout_core::SearchFilter;

use crate::error::ScraperError;

/// Location used when the filter names none.
pub(crate) const DEFAULT_LOCATION: &str = "spain--barcelona";

#[derive(Debug, Clone)]
pub struct FetchTarget {
    pub location: String,
    pub keyword: Option<String>,
    pub page: u32,
}

impl FetchTarget {
    /// Builds the search URL for this target, e.g.
    /// `{base}/d/spain--barcelona/jazz/?page=2`.
    ///
    /// The `page` query parameter is only added past page 1, matching the
    /// site's own URL shape.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] when `base_url` cannot serve as
    /// a URL base.
    pub fn url(
        &self,
        base_url: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<String, ScraperError> {
        let mut url =
            reqwest::Url::parse(base_url).map_err(|e| ScraperError::InvalidUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        {
            let mut segments =
                url.path_segments_mut()
                    .map_err(|()| ScraperError::InvalidUrl {
                        url: base_url.to_string(),
                        reason: "cannot be used as a URL base".to_string(),
                    })?;
            segments.push("d");
            segments.push(&self.location);
            if let Some(keyword) = &self.keyword {
                segments.push(keyword);
            }
            // Trailing slash, as the site serves it.
            segments.push("");
        }

        if start_date.is_some() || end_date.is_some() || self.page > 1 {
            let mut query = url.query_pairs_mut();
            if let Some(start) = start_date {
                query.append_pair("start_date", &start.to_string());
            }
            if let Some(end) = end_date {
                query.append_pair("end_date", &end.to_string());
            }
            if self.page > 1 {
                query.append_pair("page", &self.page.to_string());
            }
        }

        Ok(url.to_string())
    }
}

/// Expands a filter into its ordered fetch targets: the cross product of
/// locations and keywords, one axis alone when the other is empty, and a
/// single default target when neither is given. Every target starts at
/// page 1.
pub(crate) fn expand_targets(filter: &SearchFilter) -> Vec<FetchTarget> {
    let locations: Vec<&str> = if filter.locations.is_empty() {
        vec![DEFAULT_LOCATION]
    } else {
        filter.locations.iter().map(String::as_str).collect()
    };

    let mut targets = Vec::new();
    for location in locations {
        if filter.keywords.is_empty() {
            targets.push(FetchTarget {
                location: location.to_string(),
                keyword: None,
                page: 1,
            });
        } else {
            for keyword in &filter.keywords {
                targets.push(FetchTarget {
                    location: location.to_string(),
                    keyword: Some(keyword.clone()),
                    page: 1,
                });
            }
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> SearchFilter {
        SearchFilter::new(1, 20).unwrap()
    }

    #[test]
    fn no_axes_expands_to_single_default_target() {
        let targets = expand_targets(&filter());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].location, DEFAULT_LOCATION);
        assert_eq!(targets[0].keyword, None);
        assert_eq!(targets[0].page, 1);
    }

    #[test]
    fn locations_only_expands_one_per_location() {
        let targets = expand_targets(
            &filter().with_locations(vec!["spain--barcelona".into(), "spain--madrid".into()]),
        );
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].location, "spain--barcelona");
        assert_eq!(targets[1].location, "spain--madrid");
        assert!(targets.iter().all(|t| t.keyword.is_none()));
    }

    #[test]
    fn both_axes_expand_to_cross_product_in_order() {
        let targets = expand_targets(
            &filter()
                .with_locations(vec!["spain--barcelona".into(), "spain--madrid".into()])
                .with_keywords(vec!["jazz".into(), "blues".into()]),
        );
        let pairs: Vec<(&str, &str)> = targets
            .iter()
            .map(|t| (t.location.as_str(), t.keyword.as_deref().unwrap()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("spain--barcelona", "jazz"),
                ("spain--barcelona", "blues"),
                ("spain--madrid", "jazz"),
                ("spain--madrid", "blues"),
            ]
        );
    }

    #[test]
    fn url_for_first_page_has_no_page_param() {
        let target = FetchTarget {
            location: "spain--barcelona".to_string(),
            keyword: Some("jazz".to_string()),
            page: 1,
        };
        let url = target.url("https://www.eventbrite.com", None, None).unwrap();
        assert_eq!(url, "https://www.eventbrite.com/d/spain--barcelona/jazz/");
    }

    #[test]
    fn url_past_first_page_carries_page_param() {
        let target = FetchTarget {
            location: "spain--barcelona".to_string(),
            keyword: None,
            page: 3,
        };
        let url = target.url("https://www.eventbrite.com", None, None).unwrap();
        assert_eq!(url, "https://www.eventbrite.com/d/spain--barcelona/?page=3");
    }

    #[test]
    fn url_carries_date_range() {
        let target = FetchTarget {
            location: "spain--barcelona".to_string(),
            keyword: Some("jazz".to_string()),
            page: 1,
        };
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let url = target
            .url("https://www.eventbrite.com", Some(start), Some(end))
            .unwrap();
        assert_eq!(
            url,
            "https://www.eventbrite.com/d/spain--barcelona/jazz/?start_date=2025-06-01&end_date=2025-06-30"
        );
    }

    #[test]
    fn url_rejects_unusable_base() {
        let target = FetchTarget {
            location: "spain--barcelona".to_string(),
            keyword: None,
            page: 1,
        };
        assert!(matches!(
            target.url("not a url", None, None),
            Err(ScraperError::InvalidUrl { .. })
        ));
    }
}
