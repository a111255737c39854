// Data structures shared by the engine: advert records, filter and sort specifications

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

// A scalar as the backend sends it. Numeric columns sometimes arrive as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Loose {
    Number(f64),
    Text(String),
    Other(Value), // booleans, arrays, objects
}

// Accepts strings, numbers and booleans for text columns; null and anything else is absent
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// One vehicle advertisement. Every field may be absent; unknown fields are kept in
/// `extra` so the JSON view hands them back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Advert {
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub gearbox: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub advert_created_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<Loose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Loose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Loose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Loose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_price_min_price: Option<Loose>,
    #[serde(rename = "minPrice20Below", skip_serializing_if = "Option::is_none")]
    pub min_price_20_below: Option<Loose>,
    #[serde(rename = "minPrice25Below", skip_serializing_if = "Option::is_none")]
    pub min_price_25_below: Option<Loose>,
    #[serde(rename = "minPrice30Below", skip_serializing_if = "Option::is_none")]
    pub min_price_30_below: Option<Loose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_difference: Option<Loose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advert_id: Option<Loose>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Borrowed view of a sortable column
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    Text(Option<&'a str>),
    Number(Option<&'a Loose>),
}

impl Advert {
    pub fn field(&self, key: SortKey) -> Field<'_> {
        match key {
            SortKey::Title => Field::Text(self.title.as_deref()),
            SortKey::AdvertCreatedAt => Field::Text(self.advert_created_at.as_deref()),
            SortKey::Brand => Field::Text(self.brand.as_deref()),
            SortKey::FuelType => Field::Text(self.fuel_type.as_deref()),
            SortKey::Gearbox => Field::Text(self.gearbox.as_deref()),
            SortKey::Price => Field::Number(self.price.as_ref()),
            SortKey::MinPrice => Field::Number(self.min_price.as_ref()),
            SortKey::MinPrice20Below => Field::Number(self.min_price_20_below.as_ref()),
            SortKey::MinPrice25Below => Field::Number(self.min_price_25_below.as_ref()),
            SortKey::MinPrice30Below => Field::Number(self.min_price_30_below.as_ref()),
            SortKey::MaxPrice => Field::Number(self.max_price.as_ref()),
            SortKey::DiffPriceMinPrice => Field::Number(self.diff_price_min_price.as_ref()),
            SortKey::Year => Field::Number(self.year.as_ref()),
        }
    }
}

// --- Sorting ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Title,
    AdvertCreatedAt,
    Price,
    MinPrice,
    #[serde(rename = "minPrice20Below")]
    MinPrice20Below,
    #[serde(rename = "minPrice25Below")]
    MinPrice25Below,
    #[serde(rename = "minPrice30Below")]
    MinPrice30Below,
    MaxPrice,
    DiffPriceMinPrice,
    Brand,
    FuelType,
    Gearbox,
    Year,
}

impl SortKey {
    // Column order of the advert table
    pub const ALL: [SortKey; 13] = [
        SortKey::Title,
        SortKey::AdvertCreatedAt,
        SortKey::Price,
        SortKey::MinPrice,
        SortKey::MinPrice20Below,
        SortKey::MinPrice25Below,
        SortKey::MinPrice30Below,
        SortKey::MaxPrice,
        SortKey::DiffPriceMinPrice,
        SortKey::Brand,
        SortKey::FuelType,
        SortKey::Gearbox,
        SortKey::Year,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::AdvertCreatedAt => "advertCreatedAt",
            SortKey::Price => "price",
            SortKey::MinPrice => "minPrice",
            SortKey::MinPrice20Below => "minPrice20Below",
            SortKey::MinPrice25Below => "minPrice25Below",
            SortKey::MinPrice30Below => "minPrice30Below",
            SortKey::MaxPrice => "maxPrice",
            SortKey::DiffPriceMinPrice => "diffPriceMinPrice",
            SortKey::Brand => "brand",
            SortKey::FuelType => "fuelType",
            SortKey::Gearbox => "gearbox",
            SortKey::Year => "year",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            SortKey::Price
                | SortKey::MinPrice
                | SortKey::MinPrice30Below
                | SortKey::MinPrice25Below
                | SortKey::MinPrice20Below
                | SortKey::MaxPrice
                | SortKey::DiffPriceMinPrice
                | SortKey::Year
        )
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort column '{0}'")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownSortKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    // Newest adverts first
    fn default() -> Self {
        SortSpec { key: SortKey::AdvertCreatedAt, direction: SortDirection::Descending }
    }
}

impl SortSpec {
    /// Column-header click: the active column flips direction, any other column
    /// becomes active in ascending order.
    pub fn request(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            *self = SortSpec { key, direction: SortDirection::Ascending };
        }
    }
}

// --- Filtering ---

// Raw filter input as typed by the user. Empty strings and an unchecked toggle mean
// "no constraint"; numeric bounds are coerced when the filter is evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub brand: String,
    pub fuel_type: String,
    pub gearbox: String,
    pub year_min: String,
    pub year_max: String,
    pub price_min: String,
    pub price_max: String,
    pub diff_max: String, // upper bound on diffPriceMinPrice
    pub text: String,
    pub only_missing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn advert_tolerates_loose_payloads() {
        let advert: Advert = serde_json::from_value(json!({
            "title": "Golf 1.6 TDI",
            "brand": "VW",
            "year": "2018",
            "price": 10500,
            "minPrice": null,
            "minPrice20Below": 8000.5,
            "advertId": "abc-1",
            "sellerName": "Stand X"
        }))
        .unwrap();

        assert_eq!(advert.title.as_deref(), Some("Golf 1.6 TDI"));
        assert_eq!(advert.year, Some(Loose::Text("2018".into())));
        assert_eq!(advert.price, Some(Loose::Number(10500.0)));
        assert_eq!(advert.min_price, None);
        assert_eq!(advert.min_price_20_below, Some(Loose::Number(8000.5)));
        assert_eq!(advert.gearbox, None);
        assert_eq!(advert.extra.get("sellerName"), Some(&json!("Stand X")));
    }

    #[test]
    fn numeric_text_columns_are_kept_as_text() {
        let advert: Advert = serde_json::from_value(json!({ "brand": 42, "gearbox": false })).unwrap();
        assert_eq!(advert.brand.as_deref(), Some("42"));
        assert_eq!(advert.gearbox.as_deref(), Some("false"));
    }

    #[test]
    fn sort_request_flips_or_resets() {
        let mut sort = SortSpec::default();
        assert_eq!(sort.key, SortKey::AdvertCreatedAt);
        assert_eq!(sort.direction, SortDirection::Descending);

        sort.request(SortKey::AdvertCreatedAt);
        assert_eq!(sort.direction, SortDirection::Ascending);

        sort.request(SortKey::Price);
        assert_eq!(sort, SortSpec { key: SortKey::Price, direction: SortDirection::Ascending });

        sort.request(SortKey::Price);
        assert_eq!(sort.direction, SortDirection::Descending);

        sort.request(SortKey::Year);
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn sort_keys_parse_from_column_names() {
        for key in SortKey::ALL {
            assert_eq!(key.as_str().parse::<SortKey>(), Ok(key));
            assert_eq!(serde_json::to_value(key).unwrap(), json!(key.as_str()));
        }
        assert!("lastDifference".parse::<SortKey>().is_err());
    }

    #[test]
    fn filter_spec_defaults_missing_fields() {
        let spec: FilterSpec = serde_json::from_value(json!({ "brand": "VW", "onlyMissing": true })).unwrap();
        assert_eq!(spec.brand, "VW");
        assert!(spec.only_missing);
        assert_eq!(spec.year_min, "");
    }
}
