//! Markup and availability-payload parsing for sopharmacy.bg.

use regex::Regex;
use rust_decimal::Decimal;
use scraper::Html;
use serde::Deserialize;

use getmeds_core::{
    AvailabilityClass, CanonicalResult, Coordinates, Medicine, Pharmacy, Price, Stock, NO_DATA,
    NO_WORKING_HOURS,
};

use crate::parse_helpers::{absolutize, first_text, is_placeholder_image, parse_price, selector};

pub(crate) const UNKNOWN_PRODUCT: &str = "Неизвестен продукт";
const UNKNOWN_STATUS: &str = "Неизвестен статус";
const MANUFACTURER: &str = "SOpharmacy";
const CURRENCY: &str = "BGN";

/// A product card from the search page.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProductRef {
    pub external_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Option<Decimal>,
    pub detail_link: String,
}

/// Extracts up to `max_products` product cards from a search results page.
///
/// Cards without a `/bg/product/<digits>` link are skipped.
pub(crate) fn parse_search_results(html: &str, origin: &str, max_products: usize) -> Vec<ProductRef> {
    let document = Html::parse_document(html);
    let card_sel = selector(".products-item");
    let link_sel = selector(r#"a[href*="/bg/product/"]"#);
    let name_sel = selector(".products-item__name, .product-name, h3, h4");
    let img_sel = selector("img");
    let price_sel = selector(".price, .products-item__price");
    let id_re = Regex::new(r"/bg/product/(\d+)").expect("valid product id regex");

    document
        .select(&card_sel)
        .filter_map(|card| {
            let href = card
                .select(&link_sel)
                .find_map(|a| a.value().attr("href"))?;
            let external_id = id_re.captures(href)?.get(1)?.as_str().to_string();

            let name = first_text(card, &name_sel).unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());

            let image_url = card.select(&img_sel).next().and_then(|img| {
                ["src", "data-src"]
                    .iter()
                    .filter_map(|attr| img.value().attr(attr))
                    .filter(|raw| !is_placeholder_image(raw))
                    .find_map(|raw| absolutize(raw, origin))
            });

            let price = first_text(card, &price_sel).and_then(|text| parse_price(&text));

            let detail_link = absolutize(href, origin)
                .unwrap_or_else(|| format!("{origin}/bg/product/{external_id}"));

            Some(ProductRef {
                external_id,
                name,
                image_url,
                price,
                detail_link,
            })
        })
        .take(max_products)
        .collect()
}

/// Picks a product image from a product detail page: Open Graph first, then
/// the Twitter card, then the gallery markup.
pub(crate) fn extract_product_image(html: &str, origin: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let meta_candidates = [
        (r#"meta[property="og:image"]"#, "content"),
        (r#"meta[name="twitter:image"], meta[property="twitter:image"]"#, "content"),
        (
            ".product-image img, .product-detail__image img, .pdp-image img",
            "src",
        ),
    ];

    meta_candidates.iter().find_map(|(css, attr)| {
        let sel = selector(css);
        document
            .select(&sel)
            .filter_map(|el| el.value().attr(attr))
            .filter(|raw| !is_placeholder_image(raw))
            .find_map(|raw| absolutize(raw, origin))
    })
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AvailabilityResponse {
    #[serde(rename = "contact-map", default)]
    contact_map: Option<ContactMap>,
}

impl AvailabilityResponse {
    pub(crate) fn into_features(self) -> Vec<Feature> {
        self.contact_map.map(|m| m.features).unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ContactMap {
    #[serde(default)]
    features: Vec<Feature>,
}

/// One pharmacy location in the availability payload (GeoJSON feature).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Feature {
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: FeatureProperties,
}

#[derive(Debug, Default, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    name: Option<String>,
    address: Option<String>,
    city: Option<String>,
    contacts: Option<Contacts>,
    worktime: Option<Vec<String>>,
    status: Option<FeatureStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct Contacts {
    phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureStatus {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Maps one availability feature to a canonical record for `product`.
pub(crate) fn feature_to_result(
    retailer: &str,
    product: &ProductRef,
    image_url: Option<&str>,
    feature: &Feature,
) -> CanonicalResult {
    let props = &feature.properties;

    let (class, quantity) = match props.status.as_ref().and_then(|s| s.kind.as_deref()) {
        Some("success") => (AvailabilityClass::Available, 10),
        Some("warning") => (AvailabilityClass::Limited, 3),
        _ => (AvailabilityClass::Unavailable, 0),
    };
    let status_text = non_blank(props.status.as_ref().and_then(|s| s.text.as_deref()))
        .unwrap_or(UNKNOWN_STATUS);

    let city = non_blank(props.city.as_deref()).map(str::to_string);
    let address = [non_blank(props.address.as_deref()), city.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");

    let phone = non_blank(props.contacts.as_ref().and_then(|c| c.phone.as_deref()))
        .unwrap_or(NO_DATA)
        .to_string();

    let working_hours = props
        .worktime
        .as_ref()
        .filter(|hours| !hours.is_empty())
        .map_or_else(|| NO_WORKING_HOURS.to_string(), |hours| hours.join(", "));

    CanonicalResult {
        retailer: retailer.to_string(),
        medicine: Medicine {
            name: product.name.clone(),
            manufacturer: MANUFACTURER.to_string(),
            packaging: String::new(),
            prescription_required: false,
            image_url: image_url.map(str::to_string),
            product_link: Some(product.detail_link.clone()),
            sku: Some(product.external_id.clone()),
            description: None,
        },
        pharmacy: Pharmacy {
            name: non_blank(props.name.as_deref())
                .unwrap_or(MANUFACTURER)
                .to_string(),
            address,
            city,
            phone: Some(phone),
            working_hours,
            coordinates: feature
                .geometry
                .as_ref()
                .and_then(|g| Coordinates::from_geojson(&g.coordinates)),
        },
        stock: Stock::classified(class, quantity).with_status_text(status_text),
        price: Price::from_option(product.price, CURRENCY),
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
