//! Shapes exchanged with the place-crawling API.
//!
//! Responses are parsed leniently: every record field is optional and unknown
//! fields are ignored.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

/// What the user asked the crawler for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacesQuery {
    pub location_query: String,
    /// Comma-separated search terms as typed.
    pub search_terms: String,
    pub max_places: u32,
    pub language: String,
    pub scrape_reviews_personal_data: bool,
    pub max_reviews: u32,
}

impl Default for PlacesQuery {
    fn default() -> Self {
        Self {
            location_query: String::new(),
            search_terms: String::new(),
            max_places: 10,
            language: "ar".to_string(),
            scrape_reviews_personal_data: true,
            max_reviews: 5,
        }
    }
}

impl PlacesQuery {
    pub fn search_strings(&self) -> Vec<String> {
        self.search_terms
            .split(',')
            .map(|term| term.trim().to_string())
            .collect()
    }

    /// Builds the actor input. Everything except the user's fields is pinned.
    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "includeWebResults": false,
            "language": self.language,
            "locationQuery": self.location_query,
            "maxCrawledPlacesPerSearch": self.max_places,
            "maxImages": 0,
            "maximumLeadsEnrichmentRecords": 0,
            "scrapeContacts": false,
            "scrapeDirectories": false,
            "scrapeImageAuthors": false,
            "scrapePlaceDetailPage": false,
            "scrapeReviewsPersonalData": self.scrape_reviews_personal_data,
            "scrapeTableReservationProvider": false,
            "searchStringsArray": self.search_strings(),
            "skipClosedPlaces": false,
            "searchMatching": "all",
            "placeMinimumStars": "",
            "website": "allPlaces",
            "maxQuestions": 0,
            "maxReviews": self.max_reviews,
            "reviewsSort": "newest",
            "reviewsFilterString": "",
            "reviewsOrigin": "all",
            "allPlacesNoSearchAction": "",
        })
    }
}

/// The parts of a submitted payload that are echoed back in summaries and in
/// the formatted result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollContext {
    pub location: String,
    pub search: String,
    pub max_places: Option<u64>,
}

impl PollContext {
    pub fn from_payload(payload: &Value) -> Self {
        let location = payload
            .get("locationQuery")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let search = match payload.get("searchStringsArray") {
            Some(Value::Array(terms)) => terms
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::String(terms)) => terms.clone(),
            _ => String::new(),
        };
        let max_places = payload
            .get("maxCrawledPlacesPerSearch")
            .and_then(Value::as_u64);

        Self {
            location,
            search,
            max_places,
        }
    }

    pub fn start_summary(&self) -> String {
        let mut summary = format!("Location: {} | Search: {}", self.location, self.search);
        if let Some(max) = self.max_places {
            summary.push_str(&format!(" | Results: {max}"));
        }
        summary
    }
}

/// Scratch state of one poll-mode job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pub run_id: Option<String>,
    pub wait_budget: Duration,
    pub result_count: Option<usize>,
}

impl PollState {
    pub fn new(wait_budget: Duration) -> Self {
        Self {
            run_id: None,
            wait_budget,
            result_count: None,
        }
    }
}

/// Wrapper the API puts around single objects.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub data: T,
}

/// Actor run metadata returned by the start call.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: Option<String>,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: Option<String>,
}

/// One place from the results dataset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaceRecord {
    pub title: Option<String>,
    pub address: Option<String>,
    pub rating: Option<f64>,
    #[serde(rename = "reviewsCount")]
    pub reviews_count: Option<u64>,
    pub phone: Option<String>,
    pub website: Option<String>,
    #[serde(rename = "categoryName")]
    pub category_name: Option<String>,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_user_fields_and_fixed_defaults() {
        let query = PlacesQuery {
            location_query: "Sabha, Libya".into(),
            search_terms: "pharmacy , clinic,".into(),
            max_places: 3,
            ..PlacesQuery::default()
        };
        let payload = query.to_payload();

        assert_eq!(payload["locationQuery"], "Sabha, Libya");
        assert_eq!(
            payload["searchStringsArray"],
            serde_json::json!(["pharmacy", "clinic", ""])
        );
        assert_eq!(payload["maxCrawledPlacesPerSearch"], 3);
        assert_eq!(payload["language"], "ar");
        assert_eq!(payload["scrapeReviewsPersonalData"], true);
        assert_eq!(payload["maxReviews"], 5);
        assert_eq!(payload["website"], "allPlaces");
        assert_eq!(payload["reviewsSort"], "newest");
        assert_eq!(payload["maxImages"], 0);
    }

    #[test]
    fn context_is_recovered_from_payload() {
        let query = PlacesQuery {
            location_query: "Tripoli".into(),
            search_terms: "cafe,bakery".into(),
            ..PlacesQuery::default()
        };
        let context = PollContext::from_payload(&query.to_payload());
        assert_eq!(context.location, "Tripoli");
        assert_eq!(context.search, "cafe, bakery");
        assert_eq!(context.max_places, Some(10));
        assert_eq!(
            context.start_summary(),
            "Location: Tripoli | Search: cafe, bakery | Results: 10"
        );
    }

    #[test]
    fn record_tolerates_missing_and_extra_fields() {
        let record: PlaceRecord = serde_json::from_value(serde_json::json!({
            "title": "Al Shifa",
            "rating": 4.5,
            "reviewsCount": null,
            "permanentlyClosed": false
        }))
        .unwrap();
        assert_eq!(record.title.as_deref(), Some("Al Shifa"));
        assert_eq!(record.rating, Some(4.5));
        assert_eq!(record.reviews_count, None);
        assert_eq!(record.address, None);
    }
}
