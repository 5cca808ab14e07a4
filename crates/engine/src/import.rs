//! Admission filter for the bulk location feed.
//!
//! The feed is a JSON array exported by different sources, so every field
//! may appear under several names. [`admit`] turns one raw record into a
//! [`Candidate`] or tells why it was rejected. Field-level problems (a
//! malformed percentage, broken coordinates) only make that field absent;
//! they never fail the record on their own.
//!
//! Duplicate detection needs the database and lives in the importer.

use encoding_rs::WINDOWS_1251;
use serde_json::{Map, Value};

use crate::{EngineError, ResultEngine, discount::bounds_display};

/// A record is kept only if its category contains one of these.
pub const ALLOWED_CATEGORIES: [&str; 11] = [
    "Аптека",
    "Магазин",
    "Продовольственные",
    "Предприятия услуг",
    "Общественное питание",
    "Кафе",
    "Столовая",
    "Бытовые услуги",
    "Книги",
    "Одежда",
    "Обувь",
];

/// Lowercase stem of the target city, matched inside the address.
const CITY_MARKER: &str = "москв";

const NAME_KEYS: [&str; 2] = ["Name", "CommonName"];
const ADDRESS_KEYS: [&str; 2] = ["Address", "AddressString"];
const CATEGORY_KEYS: [&str; 2] = ["Category", "ObjectCategory"];
const DISCOUNT_TEXT_KEYS: [&str; 2] = ["Discount", "DiscountSize"];
const DESCRIPTION_KEYS: [&str; 2] = ["Description", "Note"];

const MIN_DISCOUNT_KEYS: [&str; 7] = [
    "Минимальный размер скидки, %",
    "Минимальный размер скидки",
    "MinDiscountSize",
    "MinDiscount",
    "DiscountMin",
    "discount_min",
    "MinimumDiscount",
];

const MAX_DISCOUNT_KEYS: [&str; 7] = [
    "Максимальный размер скидки, %",
    "Максимальный размер скидки",
    "MaxDiscountSize",
    "MaxDiscount",
    "DiscountMax",
    "discount_max",
    "MaximumDiscount",
];

/// Why a feed record did not become a location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    NotAnObject,
    MissingNameOrAddress,
    CategoryNotAllowed,
    OutsideCity,
    NoDiscount,
    Duplicate,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotAnObject => "not_an_object",
            Self::MissingNameOrAddress => "missing_name_or_address",
            Self::CategoryNotAllowed => "category_not_allowed",
            Self::OutsideCity => "outside_city",
            Self::NoDiscount => "no_discount",
            Self::Duplicate => "duplicate",
        }
    }
}

/// A record that passed every check not involving the database.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub address: String,
    pub category: String,
    pub discount_value: String,
    pub discount_min: Option<f64>,
    pub discount_max: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
}

/// Decode a Windows-1251 feed into its top-level array of records.
pub fn decode_feed(bytes: &[u8]) -> ResultEngine<Vec<Value>> {
    let (text, _) = WINDOWS_1251.decode_without_bom_handling(bytes);
    let value: Value = serde_json::from_str(&text)
        .map_err(|err| EngineError::InvalidFeed(format!("malformed JSON: {err}")))?;

    match value {
        Value::Array(records) => Ok(records),
        _ => Err(EngineError::InvalidFeed(
            "expected a JSON array of records".to_string(),
        )),
    }
}

/// Apply the admission filter to one raw record.
pub fn admit(record: &Value) -> Result<Candidate, SkipReason> {
    let record = record.as_object().ok_or(SkipReason::NotAnObject)?;

    let name = first_text(record, &NAME_KEYS);
    let address = first_text(record, &ADDRESS_KEYS);
    if name.is_empty() || address.is_empty() {
        return Err(SkipReason::MissingNameOrAddress);
    }

    let category = first_text(record, &CATEGORY_KEYS);
    let category_lower = category.to_lowercase();
    if !ALLOWED_CATEGORIES
        .iter()
        .any(|allowed| category_lower.contains(&allowed.to_lowercase()))
    {
        return Err(SkipReason::CategoryNotAllowed);
    }

    if !address.to_lowercase().contains(CITY_MARKER) {
        return Err(SkipReason::OutsideCity);
    }

    let discount_min = first_percent(record, &MIN_DISCOUNT_KEYS);
    let discount_max = first_percent(record, &MAX_DISCOUNT_KEYS);
    let discount_text = first_text(record, &DISCOUNT_TEXT_KEYS);
    let discount_value = match bounds_display(discount_min, discount_max) {
        Some(bounds) => bounds,
        None if !discount_text.is_empty() => discount_text,
        None => return Err(SkipReason::NoDiscount),
    };

    let (latitude, longitude) = match coordinates(record) {
        Some((lat, lon)) => (Some(lat), Some(lon)),
        None => (None, None),
    };
    let description = Some(first_text(record, &DESCRIPTION_KEYS)).filter(|d| !d.is_empty());

    Ok(Candidate {
        name,
        address,
        category,
        discount_value,
        discount_min,
        discount_max,
        latitude,
        longitude,
        description,
    })
}

/// First non-empty string among `keys`, trimmed. Empty when none.
fn first_text(record: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| record.get(*key).and_then(Value::as_str))
        .find(|value| !value.is_empty())
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// First value among `keys` that parses as a percentage.
fn first_percent(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(parse_percent)
}

/// Parse `10`, `"10%"`, `"7,5 %"`. Null, malformed and non-finite values are `None`.
fn parse_percent(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text
            .replace('%', "")
            .replace(',', ".")
            .trim()
            .parse::<f64>()
            .ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite())
}

/// `geoData.coordinates` holds `[longitude, latitude]`.
fn coordinates(record: &Map<String, Value>) -> Option<(f64, f64)> {
    let pair = record.get("geoData")?.get("coordinates")?.as_array()?;
    let longitude = coordinate(pair.first()?)?;
    let latitude = coordinate(pair.get(1)?)?;
    Some((latitude, longitude))
}

fn coordinate(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite())
}
