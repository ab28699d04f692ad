//! h-index computations.

use std::collections::BTreeMap;

/// Largest `h` such that `h` items have at least `h` citations each.
///
/// Negative counts are treated as zero.
#[must_use]
pub fn h_index(citations: &[i64]) -> usize {
    let mut sorted: Vec<i64> = citations.iter().map(|&c| c.max(0)).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.iter().enumerate().take_while(|&(i, &c)| c > i as i64).count()
}

/// Publication year and yearly citations of one work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationRecord {
    /// Publication year; records without one are ignored.
    pub year_published: Option<i32>,
    /// `(year, citations received that year)`.
    pub citations_by_year: Vec<(i32, i64)>,
}

/// h-index of a body of work as it stood at the end of each year.
///
/// Year `y` considers works published up to `y` and the citations they had
/// received up to `y`. The series runs from the first publication year to the
/// last year with either a publication or a citation.
#[must_use]
pub fn h_index_by_year(records: &[CitationRecord]) -> Vec<(i32, usize)> {
    let dated: Vec<(i32, BTreeMap<i32, i64>)> = records
        .iter()
        .filter_map(|r| {
            let year = r.year_published?;
            let mut yearly = BTreeMap::new();
            for &(y, count) in &r.citations_by_year {
                *yearly.entry(y).or_insert(0) += count.max(0);
            }
            Some((year, yearly))
        })
        .collect();

    let Some(first) = dated.iter().map(|(y, _)| *y).min() else {
        return Vec::new();
    };
    let last = dated
        .iter()
        .flat_map(|(y, yearly)| std::iter::once(*y).chain(yearly.keys().copied()))
        .max()
        .unwrap_or(first);

    (first..=last)
        .map(|year| {
            let cumulative: Vec<i64> = dated
                .iter()
                .filter(|(published, _)| *published <= year)
                .map(|(_, yearly)| yearly.range(..=year).map(|(_, c)| c).sum())
                .collect();
            (year, h_index(&cumulative))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h_index_basic() {
        assert_eq!(h_index(&[]), 0);
        assert_eq!(h_index(&[0, 0]), 0);
        assert_eq!(h_index(&[10, 8, 5, 4, 3]), 4);
        assert_eq!(h_index(&[25, 8, 5, 3, 3]), 3);
        assert_eq!(h_index(&[1]), 1);
        assert_eq!(h_index(&[100]), 1);
        assert_eq!(h_index(&[3, 3, 3]), 3);
    }

    #[test]
    fn test_h_index_ignores_order_and_negatives() {
        assert_eq!(h_index(&[3, 10, -4, 5, 4, 8]), 4);
    }

    #[test]
    fn test_h_index_by_year() {
        let records = vec![
            CitationRecord { year_published: Some(2018), citations_by_year: vec![(2019, 2), (2020, 3)] },
            CitationRecord { year_published: Some(2019), citations_by_year: vec![(2020, 1), (2021, 4)] },
            CitationRecord { year_published: None, citations_by_year: vec![(2020, 100)] },
        ];
        let series = h_index_by_year(&records);
        assert_eq!(series, vec![(2018, 0), (2019, 1), (2020, 1), (2021, 2)]);
    }

    #[test]
    fn test_h_index_by_year_empty() {
        assert!(h_index_by_year(&[]).is_empty());
        let undated = vec![CitationRecord { year_published: None, citations_by_year: vec![(2020, 1)] }];
        assert!(h_index_by_year(&undated).is_empty());
    }
}
