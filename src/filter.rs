// Per-record predicate built from the user's filter input

use crate::{
    coerce::{numeric_value, parse_bound},
    models::{Advert, FilterSpec, Loose},
};

// Inclusive numeric range; either end may be unset
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Bounds {
    min: Option<f64>,
    max: Option<f64>,
}

impl Bounds {
    fn new(min: &str, max: &str) -> Self {
        Bounds { min: parse_bound(min), max: parse_bound(max) }
    }

    fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    // A record without a usable number cannot satisfy an active range
    fn admits(&self, value: Option<&Loose>) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(n) = numeric_value(value) else {
            return false;
        };
        self.min.is_none_or(|min| n >= min) && self.max.is_none_or(|max| n <= max)
    }
}

/// Filter input with bounds coerced and the text query normalized once, so
/// evaluating it against every record is cheap.
#[derive(Debug, Clone)]
pub struct RecordFilter<'a> {
    brand: Option<&'a str>,
    fuel_type: Option<&'a str>,
    gearbox: Option<&'a str>,
    year: Bounds,
    price: Bounds,
    diff: Bounds,
    query: Option<String>,
    only_incomplete: bool,
}

fn selection(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

impl<'a> RecordFilter<'a> {
    pub fn new(spec: &'a FilterSpec) -> Self {
        let query = spec.text.trim().to_lowercase();
        RecordFilter {
            brand: selection(&spec.brand),
            fuel_type: selection(&spec.fuel_type),
            gearbox: selection(&spec.gearbox),
            year: Bounds::new(&spec.year_min, &spec.year_max),
            price: Bounds::new(&spec.price_min, &spec.price_max),
            diff: Bounds { min: None, max: parse_bound(&spec.diff_max) },
            query: (!query.is_empty()).then_some(query),
            only_incomplete: spec.only_missing,
        }
    }

    pub fn matches(&self, advert: &Advert) -> bool {
        // Categorical selections are exact matches; an absent value never matches
        if let Some(brand) = self.brand {
            if advert.brand.as_deref() != Some(brand) {
                return false;
            }
        }
        if let Some(fuel) = self.fuel_type {
            if advert.fuel_type.as_deref() != Some(fuel) {
                return false;
            }
        }
        if let Some(gearbox) = self.gearbox {
            if advert.gearbox.as_deref() != Some(gearbox) {
                return false;
            }
        }

        if !self.year.admits(advert.year.as_ref()) || !self.price.admits(advert.price.as_ref()) {
            return false;
        }
        if !self.diff.admits(advert.diff_price_min_price.as_ref()) {
            return false;
        }

        if let Some(query) = &self.query {
            let haystack = format!(
                "{} {}",
                advert.title.as_deref().unwrap_or(""),
                advert.brand.as_deref().unwrap_or("")
            )
            .to_lowercase();
            if !haystack.contains(query.as_str()) {
                return false;
            }
        }

        if self.only_incomplete && !is_incomplete(advert) {
            return false;
        }

        true
    }
}

/// True when the advert lacks at least one of the market-analysis columns.
/// Zero counts as present; only absent or null values are missing.
pub fn is_incomplete(advert: &Advert) -> bool {
    [
        &advert.advert_id,
        &advert.min_price,
        &advert.max_price,
        &advert.diff_price_min_price,
        &advert.last_difference,
        &advert.min_price_20_below,
        &advert.min_price_30_below,
        &advert.min_price_25_below,
    ]
    .iter()
    .any(|value| value.is_none())
}
