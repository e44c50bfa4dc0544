//! Small text and URL routines shared by the markup parsers.

use reqwest::Url;
use rust_decimal::Decimal;
use scraper::{ElementRef, Selector};

/// Substrings that mark a thumbnail as a stand-in rather than a product photo.
const PLACEHOLDER_MARKERS: &[&str] = &["placeholder", "no-image", "noimage", "missing", "data:"];

/// Parses a displayed price such as `"12,50 лв."` or `"7.99"`.
///
/// Keeps digits and decimal separators, treats a comma as the decimal
/// point, and reads the longest leading `digits[.digits]` run. Text with no
/// leading digit yields `None`.
pub(crate) fn parse_price(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let bytes = cleaned.as_bytes();
    let mut end = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    if bytes.get(end) == Some(&b'.') {
        let fraction = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if fraction > 0 {
            end += 1 + fraction;
        }
    }

    cleaned[..end].parse::<Decimal>().ok()
}

/// Resolves `raw` against `base`, returning an absolute http(s) URL.
pub(crate) fn absolutize(raw: &str, base: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let resolved = Url::parse(base).ok()?.join(raw).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

pub(crate) fn is_placeholder_image(url: &str) -> bool {
    let lowered = url.to_ascii_lowercase();
    PLACEHOLDER_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Collapses runs of whitespace and trims.
pub(crate) fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized text of the first descendant matching `selector`,
/// or `None` when absent or blank.
pub(crate) fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| clean_text(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}
