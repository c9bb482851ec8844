//! In-memory fallback sorting for deployments whose database rejects
//! sorting on fields excluded from its sort indexes.
//!
//! The fallback fetches the unsorted filtered set, orders it here and slices
//! the requested page. Missing sort values map to -infinity for ascending and
//! +infinity for descending, so the visible ordering matches a native sort
//! for records that do carry the field.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

/// Sort direction parsed from the `sortOrder` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than "asc" sorts descending
    pub fn from_param(param: Option<&str>) -> Self {
        if param == Some("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A comparable sort key extracted from a record field
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            SortValue::Int(_) => 0,
            SortValue::Text(_) => 1,
            SortValue::Time(_) => 2,
        }
    }

    fn cmp_same_field(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Int(a), SortValue::Int(b)) => a.cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            // A single field never mixes these; fall back to a stable rank
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn cmp_optional(a: &Option<SortValue>, b: &Option<SortValue>, order: SortOrder) -> Ordering {
    // Missing values map to -infinity for ascending and +infinity for
    // descending, so the direction reversal below leaves them first either way
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => match order {
            SortOrder::Asc => Ordering::Less,
            SortOrder::Desc => Ordering::Greater,
        },
        (Some(_), None) => match order {
            SortOrder::Asc => Ordering::Greater,
            SortOrder::Desc => Ordering::Less,
        },
        (Some(a), Some(b)) => a.cmp_same_field(b),
    }
}

/// Sort `records` by the key function and slice out the requested page
pub fn sort_and_page<T, F>(
    mut records: Vec<T>,
    order: SortOrder,
    skip: usize,
    limit: usize,
    key: F,
) -> Vec<T>
where
    F: Fn(&T) -> Option<SortValue>,
{
    records.sort_by(|a, b| {
        let ordering = cmp_optional(&key(a), &key(b), order);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    records.into_iter().skip(skip).take(limit).collect()
}

/// Page count for a list response: ceil(total / limit)
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Detect the order-by rejection raised by the deployment target whose sort
/// indexes exclude some fields
pub fn is_sort_unsupported(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.message().contains("order-by item is excluded"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq)]
    struct Rec {
        id: i32,
        views: Option<i64>,
    }

    fn recs() -> Vec<Rec> {
        vec![
            Rec { id: 1, views: Some(10) },
            Rec { id: 2, views: None },
            Rec { id: 3, views: Some(3) },
            Rec { id: 4, views: Some(25) },
            Rec { id: 5, views: None },
        ]
    }

    fn ids(records: Vec<Rec>) -> Vec<i32> {
        records.into_iter().map(|r| r.id).collect()
    }

    #[test]
    fn ascending_sort_places_missing_values_first() {
        let sorted = sort_and_page(recs(), SortOrder::Asc, 0, 10, |r| {
            r.views.map(SortValue::Int)
        });
        // None maps to -infinity for ascending
        assert_eq!(ids(sorted), vec![2, 5, 3, 1, 4]);
    }

    #[test]
    fn descending_sort_places_missing_values_first() {
        let sorted = sort_and_page(recs(), SortOrder::Desc, 0, 10, |r| {
            r.views.map(SortValue::Int)
        });
        // None maps to +infinity for descending
        assert_eq!(ids(sorted), vec![2, 5, 4, 1, 3]);
    }

    #[test]
    fn matches_native_ordering_when_no_values_are_missing() {
        let records: Vec<Rec> = recs().into_iter().filter(|r| r.views.is_some()).collect();
        let sorted = sort_and_page(records, SortOrder::Desc, 0, 10, |r| {
            r.views.map(SortValue::Int)
        });
        assert_eq!(ids(sorted), vec![4, 1, 3]);
    }

    #[test]
    fn pagination_slices_after_sorting() {
        let page2 = sort_and_page(recs(), SortOrder::Asc, 2, 2, |r| {
            r.views.map(SortValue::Int)
        });
        assert_eq!(ids(page2), vec![3, 1]);
    }

    #[test]
    fn concatenated_pages_reproduce_the_full_set() {
        let full = ids(sort_and_page(recs(), SortOrder::Asc, 0, 10, |r| {
            r.views.map(SortValue::Int)
        }));
        let mut pages = Vec::new();
        for page in 0..3 {
            pages.extend(ids(sort_and_page(recs(), SortOrder::Asc, page * 2, 2, |r| {
                r.views.map(SortValue::Int)
            })));
        }
        assert_eq!(pages, full);
    }

    #[test]
    fn time_values_sort_most_recent_first_when_descending() {
        let t = |secs| Utc.timestamp_opt(secs, 0).unwrap();
        let records = vec![(1, t(100)), (2, t(300)), (3, t(200))];
        let sorted = sort_and_page(records, SortOrder::Desc, 0, 10, |(_, ts)| {
            Some(SortValue::Time(*ts))
        });
        let ids: Vec<i32> = sorted.into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn never_borrowed_records_lead_both_directions() {
        let t = |secs| Utc.timestamp_opt(secs, 0).unwrap();
        let records = vec![
            (1, Some(t(100))),
            (2, None),
            (3, Some(t(300))),
            (4, None),
        ];

        let desc = sort_and_page(records.clone(), SortOrder::Desc, 0, 10, |(_, ts)| {
            ts.map(SortValue::Time)
        });
        let ids: Vec<i32> = desc.into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);

        let asc = sort_and_page(records, SortOrder::Asc, 0, 10, |(_, ts)| {
            ts.map(SortValue::Time)
        });
        let ids: Vec<i32> = asc.into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 6), 0);
        assert_eq!(total_pages(6, 6), 1);
        assert_eq!(total_pages(7, 6), 2);
        assert_eq!(total_pages(13, 5), 3);
    }
}
