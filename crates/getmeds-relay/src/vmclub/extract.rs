//! Pure extraction routines for VMClub pages.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use getmeds_scraper::{SessionLocation, SessionProduct};

const DEFAULT_CURRENCY: &str = "EUR";

static JSON_LD_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid json-ld script regex")
});
static DATA_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"data-text='(\{[^']+\})'").expect("valid data-text regex")
});

pub(super) fn extract_csrf_token(html: &str) -> Option<String> {
    let re = Regex::new(r#"name="csrf-token"\s+content="([^"]+)""#).expect("valid csrf regex");
    re.captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Builds a `Cookie` header value from `Set-Cookie` header values, keeping
/// only each `name=value` pair.
pub(super) fn cookie_header<'a>(set_cookies: impl IntoIterator<Item = &'a str>) -> String {
    set_cookies
        .into_iter()
        .filter_map(|raw| raw.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Product slugs linked from fast-search markup, deduplicated, in page order.
pub(super) fn extract_product_slugs(html: &str, limit: usize) -> Vec<String> {
    let re = Regex::new(r#"href="/pharmacy/([\w-]+)""#).expect("valid slug regex");
    let mut slugs: Vec<String> = Vec::new();
    for cap in re.captures_iter(html) {
        let Some(slug) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if !slugs.iter().any(|s| s == slug) {
            slugs.push(slug.to_string());
        }
        if slugs.len() >= limit {
            break;
        }
    }
    slugs
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First element of an array, or the value itself.
fn first(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    }
}

fn is_product_node(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t == "Product"),
        _ => value.get("productID").is_some(),
    }
}

fn find_product_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if is_product_node(value) {
                return Some(value);
            }
            map.values().find_map(find_product_node)
        }
        Value::Array(items) => items.iter().find_map(find_product_node),
        _ => None,
    }
}

/// Reads the `Product` JSON-LD block of a product page. Locations are left
/// empty for the caller to fill.
pub(super) fn extract_json_ld_product(html: &str, page_url: &str) -> Option<SessionProduct> {
    JSON_LD_SCRIPT_RE.captures_iter(html).find_map(|cap| {
        let raw = cap.get(1).map_or("", |m| m.as_str()).trim();
        let value: Value = serde_json::from_str(raw).ok()?;
        let node = find_product_node(&value)?;

        let name = node.get("name").and_then(value_as_string)?;
        let offers = node.get("offers").map(first);
        let brand = node.get("brand").map(first).and_then(|b| match b {
            Value::Object(_) => b.get("name").and_then(value_as_string),
            other => value_as_string(other),
        });

        Some(SessionProduct {
            id: node.get("productID").and_then(value_as_string),
            name,
            description: node.get("description").and_then(value_as_string),
            image: node.get("image").map(first).and_then(|img| match img {
                Value::Object(_) => img.get("url").and_then(value_as_string),
                other => value_as_string(other),
            }),
            sku: node.get("sku").and_then(value_as_string),
            brand,
            price: offers
                .and_then(|o| o.get("price"))
                .and_then(value_as_string),
            currency: Some(
                offers
                    .and_then(|o| o.get("priceCurrency"))
                    .and_then(value_as_string)
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            ),
            url: Some(page_url.to_string()),
            locations: Vec::new(),
        })
    })
}

/// Decodes one `data-text` payload. Some pages escape the whole object
/// (`{\"id\":1}`), so a failed parse is retried with `\"` unescaped.
fn decode_data_text(raw: &str) -> Option<Value> {
    serde_json::from_str(raw)
        .ok()
        .or_else(|| serde_json::from_str(&raw.replace("\\\"", "\"")).ok())
}

/// Parses the `data-text='{...}'` store entries of a store-locations page.
/// Entries that do not decode are skipped.
pub(super) fn extract_store_locations(html: &str) -> Vec<SessionLocation> {
    DATA_TEXT_RE
        .captures_iter(html)
        .filter_map(|cap| {
            let value = decode_data_text(cap.get(1)?.as_str())?;
            Some(SessionLocation {
                id: value.get("id").and_then(value_as_string),
                name: value.get("name").and_then(value_as_string),
                address: value.get("address").and_then(value_as_string),
                city: value.get("city").and_then(value_as_string),
                email: value.get("email").and_then(value_as_string),
                phone: value.get("phone").and_then(value_as_string),
                lat: value.get("lat").and_then(value_as_f64),
                lon: value.get("lon").and_then(value_as_f64),
                status: value.get("status").and_then(value_as_i64),
            })
        })
        .collect()
}
