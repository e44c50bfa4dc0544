//! Canonical search result records shared by every retailer adapter and the
//! demo generator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

/// Rendered in place of a price when the retailer exposes none.
pub const NO_PRICE: &str = "Няма цена";
/// Rendered in place of a missing phone number.
pub const NO_DATA: &str = "Няма данни";
/// Rendered in place of missing working hours.
pub const NO_WORKING_HOURS: &str = "Няма информация";

/// One medicine at one pharmacy location, as returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResult {
    /// Name of the retailer whose adapter produced this record.
    pub retailer: String,
    pub medicine: Medicine,
    pub pharmacy: Pharmacy,
    pub stock: Stock,
    pub price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub name: String,
    /// Manufacturer or, for retailers that do not expose one, the pharmacy
    /// network name.
    pub manufacturer: String,
    pub packaging: String,
    pub prescription_required: bool,
    pub image_url: Option<String>,
    pub product_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    pub name: String,
    pub address: String,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub working_hours: String,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Builds coordinates from a GeoJSON `[lng, lat]` pair.
    #[must_use]
    pub fn from_geojson(pair: &[f64]) -> Option<Self> {
        match pair {
            [lng, lat, ..] if lat.is_finite() && lng.is_finite() => Some(Self {
                lat: *lat,
                lng: *lng,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityClass {
    Available,
    Limited,
    Unavailable,
    Unknown,
}

impl AvailabilityClass {
    /// Whether this class counts as "in stock".
    #[must_use]
    pub fn is_in_stock(self) -> bool {
        matches!(self, Self::Available | Self::Limited)
    }

    /// Bulgarian label shown next to a result.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "Налично",
            Self::Limited => "Ограничено количество",
            Self::Unavailable => "Няма наличност",
            Self::Unknown => "Неизвестна наличност",
        }
    }

    /// Parses the lowercase wire name (`"available"`, `"limited"`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "available" => Some(Self::Available),
            "limited" => Some(Self::Limited),
            "unavailable" => Some(Self::Unavailable),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for AvailabilityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Limited => write!(f, "limited"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Stock signal for one record.
///
/// Fields are read-only; values are built through [`Stock::classified`] and
/// friends so that `in_stock` always agrees with `availability_class` and a
/// zero quantity never claims availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    in_stock: bool,
    quantity: u32,
    availability_class: AvailabilityClass,
    status_text: Option<String>,
}

impl Stock {
    /// Builds a stock value from a retailer classification and quantity.
    ///
    /// `Available`/`Limited` with a zero quantity is downgraded to
    /// `Unavailable`; `Unavailable`/`Unknown` always carry quantity 0.
    #[must_use]
    pub fn classified(class: AvailabilityClass, quantity: u32) -> Self {
        let (class, quantity) = match class {
            AvailabilityClass::Available | AvailabilityClass::Limited if quantity == 0 => {
                (AvailabilityClass::Unavailable, 0)
            }
            AvailabilityClass::Unavailable | AvailabilityClass::Unknown => (class, 0),
            _ => (class, quantity),
        };
        Self {
            in_stock: class.is_in_stock(),
            quantity,
            availability_class: class,
            status_text: None,
        }
    }

    /// Classifies a raw quantity: more than 20 is available, any positive
    /// amount is limited, zero is unavailable.
    #[must_use]
    pub fn from_quantity(quantity: u32) -> Self {
        let class = match quantity {
            q if q > 20 => AvailabilityClass::Available,
            q if q > 0 => AvailabilityClass::Limited,
            _ => AvailabilityClass::Unavailable,
        };
        Self::classified(class, quantity)
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self::classified(AvailabilityClass::Unknown, 0)
    }

    #[must_use]
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.in_stock
    }

    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub fn availability_class(&self) -> AvailabilityClass {
        self.availability_class
    }

    #[must_use]
    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }
}

/// A price as scraped, or the "no price" sentinel.
///
/// Serializes as its display string (`"12.50 BGN"` or `"Няма цена"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Price {
    Amount { amount: Decimal, currency: String },
    Unavailable,
}

impl Price {
    /// Builds an amount rounded to two decimal places. Negative amounts are
    /// treated as missing.
    #[must_use]
    pub fn amount(amount: Decimal, currency: impl Into<String>) -> Self {
        if amount.is_sign_negative() {
            return Self::Unavailable;
        }
        Self::Amount {
            amount: amount.round_dp(2),
            currency: currency.into(),
        }
    }

    /// Builds a price from an optional amount.
    #[must_use]
    pub fn from_option(amount: Option<Decimal>, currency: &str) -> Self {
        amount.map_or(Self::Unavailable, |a| Self::amount(a, currency))
    }

    #[must_use]
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Self::Amount { amount, .. } => Some(*amount),
            Self::Unavailable => None,
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Amount { amount, currency } => write!(f, "{amount:.2} {currency}"),
            Self::Unavailable => f.write_str(NO_PRICE),
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
