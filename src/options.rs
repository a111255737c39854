// Dropdown choices derived from the loaded adverts

use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{Advert, FilterSpec};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub brands: Vec<String>,
    pub fuel_types: Vec<String>,
    pub gearboxes: Vec<String>,
}

impl FilterOptions {
    /// Distinct, sorted, non-empty values of each categorical column, in one pass.
    pub fn derive(dataset: &[Advert]) -> Self {
        let mut brands = BTreeSet::new();
        let mut fuel_types = BTreeSet::new();
        let mut gearboxes = BTreeSet::new();

        for advert in dataset {
            collect(&mut brands, advert.brand.as_deref());
            collect(&mut fuel_types, advert.fuel_type.as_deref());
            collect(&mut gearboxes, advert.gearbox.as_deref());
        }

        FilterOptions {
            brands: brands.into_iter().collect(),
            fuel_types: fuel_types.into_iter().collect(),
            gearboxes: gearboxes.into_iter().collect(),
        }
    }

    /// Clears every categorical selection that no option represents any more.
    /// Returns whether anything was reset.
    pub fn reconcile(&self, filters: &mut FilterSpec) -> bool {
        let mut changed = false;
        changed |= clear_unlisted(&mut filters.brand, &self.brands);
        changed |= clear_unlisted(&mut filters.fuel_type, &self.fuel_types);
        changed |= clear_unlisted(&mut filters.gearbox, &self.gearboxes);
        changed
    }
}

fn collect(set: &mut BTreeSet<String>, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        if !set.contains(v) {
            set.insert(v.to_string());
        }
    }
}

fn clear_unlisted(selection: &mut String, options: &[String]) -> bool {
    if selection.is_empty() || options.binary_search(&*selection).is_ok() {
        return false;
    }
    tracing::debug!(selection = %selection, "Selected filter value no longer available, clearing");
    selection.clear();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advert(brand: Option<&str>, fuel: Option<&str>, gearbox: Option<&str>) -> Advert {
        Advert {
            brand: brand.map(str::to_string),
            fuel_type: fuel.map(str::to_string),
            gearbox: gearbox.map(str::to_string),
            ..Advert::default()
        }
    }

    #[test]
    fn derives_sorted_distinct_non_empty_values() {
        let dataset = vec![
            advert(Some("VW"), Some("Diesel"), Some("Manual")),
            advert(Some("Audi"), None, Some("")),
            advert(Some("VW"), Some("Electric"), Some("Automatic")),
            advert(None, Some("Diesel"), None),
            advert(Some(""), Some("Petrol"), Some("Manual")),
        ];

        let options = FilterOptions::derive(&dataset);
        assert_eq!(options.brands, vec!["Audi", "VW"]);
        assert_eq!(options.fuel_types, vec!["Diesel", "Electric", "Petrol"]);
        assert_eq!(options.gearboxes, vec!["Automatic", "Manual"]);
    }

    #[test]
    fn empty_dataset_has_no_options() {
        assert_eq!(FilterOptions::derive(&[]), FilterOptions::default());
    }

    #[test]
    fn reconcile_drops_only_vanished_selections() {
        let options = FilterOptions::derive(&[advert(Some("VW"), Some("Diesel"), None)]);
        let mut filters = FilterSpec {
            brand: "BMW".into(),
            fuel_type: "Diesel".into(),
            gearbox: "Manual".into(),
            year_min: "2015".into(),
            ..FilterSpec::default()
        };

        assert!(options.reconcile(&mut filters));
        assert_eq!(filters.brand, "");
        assert_eq!(filters.fuel_type, "Diesel");
        assert_eq!(filters.gearbox, "");
        assert_eq!(filters.year_min, "2015");

        assert!(!options.reconcile(&mut filters));
    }
}
