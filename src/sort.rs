// Column ordering with a fixed nulls-last policy

use feruca::Collator;
use std::cmp::Ordering;

use crate::{
    coerce::{comparable_text, numeric_value},
    models::{Advert, Field, SortDirection, SortKey, SortSpec},
};

// Comparison key of one record for the active column. `None` is a null for sorting:
// absent, non-numeric in a numeric column, or blank in a text column.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Number(f64),
    Text(String),
}

impl SortValue {
    fn of(advert: &Advert, key: SortKey) -> Option<Self> {
        match advert.field(key) {
            Field::Number(value) => numeric_value(value).map(SortValue::Number),
            Field::Text(value) => comparable_text(value).map(|s| SortValue::Text(s.to_lowercase())),
        }
    }

    fn compare(&self, other: &Self, collator: &mut Collator) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            // Unicode collation: "Škoda" sorts between "Seat" and "Toyota"
            (SortValue::Text(a), SortValue::Text(b)) => collator.collate(a, b),
            // Both sides always come from the same column
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        }
    }
}

// Nulls go last in either direction; only the non-null comparison is reversed
fn compare_keys(
    a: Option<&SortValue>,
    b: Option<&SortValue>,
    direction: SortDirection,
    collator: &mut Collator,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = a.compare(b, collator);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        }
    }
}

/// Orders `items` by the advert each one refers to. Keys are computed once per item
/// and the sort is stable, so equal keys keep their input order in both directions.
pub fn order_by<'a, T, F>(items: impl IntoIterator<Item = T>, spec: &SortSpec, advert_of: F) -> Vec<T>
where
    F: Fn(&T) -> &'a Advert,
{
    let mut keyed: Vec<(Option<SortValue>, T)> = items
        .into_iter()
        .map(|item| (SortValue::of(advert_of(&item), spec.key), item))
        .collect();
    let mut collator = Collator::default();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a.as_ref(), b.as_ref(), spec.direction, &mut collator));
    keyed.into_iter().map(|(_, item)| item).collect()
}

pub fn sort_adverts<'a>(records: impl IntoIterator<Item = &'a Advert>, spec: &SortSpec) -> Vec<&'a Advert> {
    order_by(records, spec, |advert| *advert)
}
