//! Synthetic results served when no retailer is enabled.

use rand::Rng;
use rust_decimal::Decimal;

use getmeds_core::{
    sort_by_stock_then_price, CanonicalResult, Medicine, Pharmacy, Price, Stock,
};

/// Retailer name stamped on demo records.
pub const DEMO_RETAILER: &str = "Demo";

const CURRENCY: &str = "BGN";
const CITY: &str = "София";
const IN_STOCK_PROBABILITY: f64 = 0.7;

struct CatalogMedicine {
    name: &'static str,
    manufacturer: &'static str,
    packaging: &'static str,
}

struct CatalogPharmacy {
    name: &'static str,
    address: &'static str,
    phone: &'static str,
    working_hours: &'static str,
}

const MEDICINES: &[CatalogMedicine] = &[
    CatalogMedicine {
        name: "Парацетамол 500мг",
        manufacturer: "Sopharma",
        packaging: "20 таблетки",
    },
    CatalogMedicine {
        name: "Ибупрофен 400мг",
        manufacturer: "Actavis",
        packaging: "30 таблетки",
    },
    CatalogMedicine {
        name: "Аспирин 100мг",
        manufacturer: "Bayer",
        packaging: "28 таблетки",
    },
];

const PHARMACIES: &[CatalogPharmacy] = &[
    CatalogPharmacy {
        name: "Аптека Sopharmacy",
        address: "бул. Витоша 15, София",
        phone: "02 123 4567",
        working_hours: "Пон-Пет: 8:00-20:00, Съб: 9:00-18:00",
    },
    CatalogPharmacy {
        name: "Аптека Remedium",
        address: "ул. Граф Игнатиев 32, София",
        phone: "02 234 5678",
        working_hours: "Пон-Нед: 8:00-22:00",
    },
    CatalogPharmacy {
        name: "Аптека Субра",
        address: "бул. Христо Ботев 48, София",
        phone: "02 345 6789",
        working_hours: "Пон-Пет: 8:30-19:00",
    },
];

/// Generates demo results for `query` using the thread-local RNG.
#[must_use]
pub fn generate(query: &str) -> Vec<CanonicalResult> {
    generate_with_rng(query, &mut rand::rng())
}

/// Generates demo results with the supplied RNG.
///
/// Medicines whose name contains `query` (case-insensitive) are crossed with
/// every pharmacy; with no match the whole catalog is used. Output is sorted
/// in-stock first, then by ascending price.
pub fn generate_with_rng<R: Rng + ?Sized>(query: &str, rng: &mut R) -> Vec<CanonicalResult> {
    let needle = query.trim().to_lowercase();
    let matched: Vec<&CatalogMedicine> = MEDICINES
        .iter()
        .filter(|m| m.name.to_lowercase().contains(&needle))
        .collect();
    let medicines = if matched.is_empty() {
        MEDICINES.iter().collect()
    } else {
        matched
    };

    let mut results = Vec::with_capacity(medicines.len() * PHARMACIES.len());
    for medicine in medicines {
        for pharmacy in PHARMACIES {
            let quantity = if rng.random_bool(IN_STOCK_PROBABILITY) {
                rng.random_range(1..=50)
            } else {
                0
            };
            let cents: i64 = rng.random_range(500..2000);

            results.push(CanonicalResult {
                retailer: DEMO_RETAILER.to_string(),
                medicine: Medicine {
                    name: medicine.name.to_string(),
                    manufacturer: medicine.manufacturer.to_string(),
                    packaging: medicine.packaging.to_string(),
                    prescription_required: false,
                    image_url: None,
                    product_link: None,
                    sku: None,
                    description: None,
                },
                pharmacy: Pharmacy {
                    name: pharmacy.name.to_string(),
                    address: pharmacy.address.to_string(),
                    city: Some(CITY.to_string()),
                    phone: Some(pharmacy.phone.to_string()),
                    working_hours: pharmacy.working_hours.to_string(),
                    coordinates: None,
                },
                stock: Stock::from_quantity(quantity),
                price: Price::amount(Decimal::new(cents, 2), CURRENCY),
            });
        }
    }

    sort_by_stock_then_price(&mut results);
    results
}
