use std::fmt::Write as _;
use std::time::Duration;

use crate::places::{PlaceRecord, PollContext};

const SECTION_BREAK: &str = "---\n";

/// Renders fetched places as a Markdown document: a title, the query
/// metadata, then one section per record in the order received.
pub fn format_places(context: &PollContext, records: &[PlaceRecord], elapsed: Duration) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Google Maps results");
    let _ = writeln!(out, "**Location:** {}", context.location);
    let _ = writeln!(out, "**Search:** {}", context.search);
    let _ = writeln!(out, "**Results:** {}", records.len());
    let _ = writeln!(out, "**Elapsed:** {:.1} s", elapsed.as_secs_f64());
    out.push_str(SECTION_BREAK);

    for (index, place) in records.iter().enumerate() {
        write_place(&mut out, index + 1, place);
        out.push_str(SECTION_BREAK);
    }
    out
}

fn write_place(out: &mut String, number: usize, place: &PlaceRecord) {
    let title = place
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled");
    let _ = writeln!(out, "## {number}. {title}");

    if let Some(address) = non_empty(&place.address) {
        let _ = writeln!(out, "**Address:** {address}");
    }
    if let Some(rating) = place.rating.filter(|r| *r != 0.0) {
        let _ = writeln!(
            out,
            "**Rating:** {rating} ⭐ ({} reviews)",
            place.reviews_count.unwrap_or(0)
        );
    }
    if let Some(phone) = non_empty(&place.phone) {
        let _ = writeln!(out, "**Phone:** {phone}");
    }
    if let Some(website) = non_empty(&place.website) {
        let _ = writeln!(out, "**Website:** [{website}]({website})");
    }
    if let Some(category) = non_empty(&place.category_name) {
        let _ = writeln!(out, "**Category:** {category}");
    }
    if let Some(url) = non_empty(&place.url) {
        let _ = writeln!(out, "**Map:** [View on map]({url})");
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context() -> PollContext {
        PollContext {
            location: "Sabha".into(),
            search: "pharmacy".into(),
            max_places: Some(10),
        }
    }

    #[test]
    fn renders_present_fields_only() {
        let records = vec![
            PlaceRecord {
                title: Some("Al Amal Pharmacy".into()),
                address: Some("Main St".into()),
                rating: Some(4.5),
                reviews_count: Some(12),
                phone: Some("+218 71 000".into()),
                website: Some("https://amal.example".into()),
                category_name: Some("Pharmacy".into()),
                url: Some("https://maps.example/p/1".into()),
            },
            PlaceRecord {
                rating: Some(4.0),
                ..PlaceRecord::default()
            },
        ];

        let text = format_places(&context(), &records, Duration::from_millis(29_340));
        let expected = "\
# Google Maps results
**Location:** Sabha
**Search:** pharmacy
**Results:** 2
**Elapsed:** 29.3 s
---
## 1. Al Amal Pharmacy
**Address:** Main St
**Rating:** 4.5 ⭐ (12 reviews)
**Phone:** +218 71 000
**Website:** [https://amal.example](https://amal.example)
**Category:** Pharmacy
**Map:** [View on map](https://maps.example/p/1)
---
## 2. Untitled
**Rating:** 4 ⭐ (0 reviews)
---
";
        assert_eq!(text, expected);
    }

    #[test]
    fn zero_rating_is_omitted() {
        let records = vec![PlaceRecord {
            title: Some("Closed shop".into()),
            rating: Some(0.0),
            ..PlaceRecord::default()
        }];
        let text = format_places(&context(), &records, Duration::ZERO);
        assert!(!text.contains("Rating"));
        assert!(text.contains("**Results:** 1"));
    }

    #[test]
    fn empty_results_keep_the_header() {
        let text = format_places(&context(), &[], Duration::from_secs(1));
        assert_eq!(text.matches("## ").count(), 0);
        assert!(text.contains("**Results:** 0"));
        assert!(text.ends_with(SECTION_BREAK));
    }
}
