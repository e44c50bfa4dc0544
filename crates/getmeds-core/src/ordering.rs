//! Deterministic result ordering.
//!
//! Every adapter returns its records in-stock first. Ties are broken by city
//! (live retailers) or by price (demo data). All sorts are stable, so records
//! that compare equal keep the order the adapter produced them in.

use std::cmp::Ordering;

use crate::results::CanonicalResult;

/// Sorts in-stock records first, then by city using Bulgarian collation.
/// Records without a city sort after those with one.
pub fn sort_by_stock_then_city(results: &mut [CanonicalResult]) {
    results.sort_by(|a, b| {
        stock_first(a, b).then_with(|| {
            match (a.pharmacy.city.as_deref(), b.pharmacy.city.as_deref()) {
                (Some(x), Some(y)) => compare_city_bg(x, y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
    });
}

/// Sorts in-stock records first, then by ascending price. Records without a
/// price sort last within their stock group.
pub fn sort_by_stock_then_price(results: &mut [CanonicalResult]) {
    results.sort_by(|a, b| {
        stock_first(a, b).then_with(|| match (a.price.value(), b.price.value()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
    });
}

fn stock_first(a: &CanonicalResult, b: &CanonicalResult) -> Ordering {
    b.stock.in_stock().cmp(&a.stock.in_stock())
}

/// Compares two place names the way a Bulgarian-locale collator would for
/// the characters that occur in city names: case-insensitive, Cyrillic
/// before Latin, `ѝ` folded onto `и`, then code-point order within a script.
///
/// Full equality falls back to the raw strings so the order is total.
#[must_use]
pub fn compare_city_bg(a: &str, b: &str) -> Ordering {
    let ka = a.trim().chars().map(collation_weight);
    let kb = b.trim().chars().map(collation_weight);
    ka.cmp(kb).then_with(|| a.cmp(b))
}

/// Primary weight for one character: `(script rank, folded code point)`.
fn collation_weight(c: char) -> (u8, u32) {
    let folded = c.to_lowercase().next().unwrap_or(c);
    let folded = match folded {
        'ѝ' => 'и',
        'ё' => 'е',
        other => other,
    };
    let rank = if folded.is_whitespace() || folded == '-' {
        0
    } else if folded.is_numeric() {
        1
    } else if ('\u{0400}'..='\u{04FF}').contains(&folded) {
        2
    } else if folded.is_alphabetic() {
        3
    } else {
        4
    };
    (rank, u32::from(folded))
}
