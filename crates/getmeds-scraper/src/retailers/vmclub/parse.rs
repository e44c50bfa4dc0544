use scraper::Html;

use getmeds_core::{
    AvailabilityClass, CanonicalResult, Coordinates, Medicine, Pharmacy, Price, Stock, NO_DATA,
};

use super::response::{SessionLocation, SessionProduct, SessionSearchResponse};
use crate::parse_helpers::{absolutize, clean_text, first_text, parse_price, selector};

pub(crate) const ORIGIN: &str = "https://sofia.vmclub.bg";
const BRAND: &str = "VMClub";
const CURRENCY: &str = "EUR";
const WORKING_HOURS: &str = "Виж сайта за работно време";
const IN_STOCK_TEXT: &str = "Наличен";
const OUT_OF_STOCK_TEXT: &str = "Няма наличност";
const CHECK_SITE_TEXT: &str = "Провери наличността на сайта";
const IN_SOFIA_TEXT: &str = "Наличен в София";
/// Stand-in quantity; VMClub only says whether a location has stock.
const PLACEHOLDER_QUANTITY: u32 = 5;

/// Converts a relay payload into canonical records. Structured products win
/// over raw markup; a payload with neither yields nothing.
pub(crate) fn response_to_results(
    retailer: &str,
    response: &SessionSearchResponse,
) -> Vec<CanonicalResult> {
    if let Some(products) = &response.products {
        return products
            .iter()
            .filter(|p| !p.name.trim().is_empty())
            .flat_map(|p| product_results(retailer, p))
            .collect();
    }
    if let Some(html) = &response.html {
        return markup_results(retailer, html);
    }
    Vec::new()
}

/// Retailer-wide location used when a product has no per-store data.
fn default_pharmacy() -> Pharmacy {
    Pharmacy {
        name: "VMClub София".to_string(),
        address: "Различни локации в София".to_string(),
        city: Some("София".to_string()),
        phone: Some("0700 20 888".to_string()),
        working_hours: WORKING_HOURS.to_string(),
        coordinates: None,
    }
}

fn product_results(retailer: &str, product: &SessionProduct) -> Vec<CanonicalResult> {
    let medicine = Medicine {
        name: clean_text(&product.name),
        manufacturer: product
            .brand
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(BRAND)
            .to_string(),
        packaging: String::new(),
        prescription_required: false,
        image_url: product
            .image
            .as_deref()
            .and_then(|raw| absolutize(raw, ORIGIN)),
        product_link: product.url.as_deref().and_then(|raw| absolutize(raw, ORIGIN)),
        sku: product.sku.clone(),
        description: product.description.clone(),
    };
    let price = Price::from_option(
        product.price.as_deref().and_then(parse_price),
        product.currency.as_deref().unwrap_or(CURRENCY),
    );

    if product.locations.is_empty() {
        return vec![CanonicalResult {
            retailer: retailer.to_string(),
            medicine,
            pharmacy: default_pharmacy(),
            stock: Stock::unknown().with_status_text(CHECK_SITE_TEXT),
            price,
        }];
    }

    product
        .locations
        .iter()
        .map(|location| CanonicalResult {
            retailer: retailer.to_string(),
            medicine: medicine.clone(),
            pharmacy: location_pharmacy(location),
            stock: location_stock(location),
            price: price.clone(),
        })
        .collect()
}

fn location_stock(location: &SessionLocation) -> Stock {
    if location.status == Some(0) {
        Stock::classified(AvailabilityClass::Available, PLACEHOLDER_QUANTITY)
            .with_status_text(IN_STOCK_TEXT)
    } else {
        Stock::classified(AvailabilityClass::Unavailable, 0).with_status_text(OUT_OF_STOCK_TEXT)
    }
}

fn location_pharmacy(location: &SessionLocation) -> Pharmacy {
    let text = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Pharmacy {
        name: text(&location.name).unwrap_or_else(|| BRAND.to_string()),
        address: text(&location.address).unwrap_or_else(|| NO_DATA.to_string()),
        city: text(&location.city),
        phone: Some(text(&location.phone).unwrap_or_else(|| NO_DATA.to_string())),
        working_hours: WORKING_HOURS.to_string(),
        coordinates: match (location.lat, location.lon) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(Coordinates { lat, lng })
            }
            _ => None,
        },
    }
}

/// Parses the fast-search result markup. Items without a name are skipped.
fn markup_results(retailer: &str, html: &str) -> Vec<CanonicalResult> {
    let document = Html::parse_fragment(html);
    let item_sel = selector(".product-item, .search-result-item, [data-product-id]");
    let name_sel = selector(".product-name, h3, h4, .name");
    let price_sel = selector(".price, .product-price");
    let link_sel = selector(r#"a[href*="/product/"], a[href*="/products/"]"#);
    let img_sel = selector("img");

    document
        .select(&item_sel)
        .filter_map(|item| {
            let name = first_text(item, &name_sel)?;
            let price = first_text(item, &price_sel).and_then(|t| parse_price(&t));
            let product_link = item
                .select(&link_sel)
                .find_map(|a| a.value().attr("href"))
                .and_then(|href| absolutize(href, ORIGIN));
            let image_url = item
                .select(&img_sel)
                .find_map(|img| img.value().attr("src"))
                .and_then(|src| absolutize(src, ORIGIN));

            Some(CanonicalResult {
                retailer: retailer.to_string(),
                medicine: Medicine {
                    name,
                    manufacturer: BRAND.to_string(),
                    packaging: String::new(),
                    prescription_required: false,
                    image_url,
                    product_link,
                    sku: item.value().attr("data-product-id").map(str::to_string),
                    description: None,
                },
                pharmacy: default_pharmacy(),
                stock: Stock::classified(AvailabilityClass::Available, PLACEHOLDER_QUANTITY)
                    .with_status_text(IN_SOFIA_TEXT),
                price: Price::from_option(price, CURRENCY),
            })
        })
        .collect()
}
