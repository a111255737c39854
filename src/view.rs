// Filtered, sorted view over the dataset

use crate::{
    filter::RecordFilter,
    models::{Advert, FilterSpec, SortSpec},
    sort::order_by,
};

/// Positions into `dataset` of the records that pass `filters`, in display order.
/// Pure: the same inputs always give the same positions.
pub fn project_positions(dataset: &[Advert], filters: &FilterSpec, sort: &SortSpec) -> Vec<usize> {
    let filter = RecordFilter::new(filters);
    let passing = (0..dataset.len()).filter(|&i| filter.matches(&dataset[i]));
    order_by(passing, sort, |&i| &dataset[i])
}

pub fn project<'a>(dataset: &'a [Advert], filters: &FilterSpec, sort: &SortSpec) -> Vec<&'a Advert> {
    project_positions(dataset, filters, sort)
        .into_iter()
        .map(|i| &dataset[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SortDirection, SortKey};
    use serde_json::json;

    #[test]
    fn filters_then_sorts() {
        let dataset: Vec<Advert> = serde_json::from_value(json!([
            { "title": "Polo", "brand": "VW", "price": 7000, "year": 2016 },
            { "title": "A3", "brand": "Audi", "price": 15000, "year": 2019 },
            { "title": "Golf", "brand": "VW", "price": 10000, "year": 2018 },
            { "title": "Up", "brand": "VW", "price": 9000, "year": null }
        ]))
        .unwrap();
        let filters = FilterSpec { brand: "VW".into(), year_min: "2015".into(), ..FilterSpec::default() };
        let sort = SortSpec { key: SortKey::Price, direction: SortDirection::Descending };

        let titles: Vec<_> = project(&dataset, &filters, &sort)
            .iter()
            .map(|a| a.title.as_deref().unwrap())
            .collect();
        assert_eq!(titles, vec!["Golf", "Polo"]);
        assert_eq!(project_positions(&dataset, &filters, &sort), vec![2, 0]);
    }

    #[test]
    fn empty_dataset_projects_to_nothing() {
        assert!(project(&[], &FilterSpec::default(), &SortSpec::default()).is_empty());
    }
}
