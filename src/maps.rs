use crate::model::SchoolRecord;
use reqwest::Url;

const EMBED_BASE: &str = "https://www.google.com/maps/embed/v1/place";

/// Google Maps embed URL pinned on the school's name and address.
///
/// A missing API key still produces a URL, with an empty `key` parameter.
pub fn embed_url(api_key: &str, school: &SchoolRecord) -> String {
    let place = format!("{}, {}", school.name, school.address());
    match Url::parse_with_params(EMBED_BASE, &[("key", api_key), ("q", place.as_str())]) {
        Ok(url) => url.into(),
        // Unreachable with a constant base.
        Err(_) => format!("{EMBED_BASE}?key={api_key}"),
    }
}
