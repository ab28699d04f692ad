//! Request parameters, filters and pagination.
//!
//! Query strings arrive untyped; every value is parsed and validated here so
//! the pipeline builder only ever sees well-formed filters.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::enums::{EntityKind, SortOrder};
use crate::config::limits;
use crate::error::{ServiceError, ServiceResult};

static YEARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{4})\s*(?:-\s*(\d{4})\s*)?$").expect("valid years regex"));

static COUNTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2}$").expect("valid country regex"));

/// The entity a computation is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Entity kind.
    pub kind: EntityKind,
    /// Entity ID.
    pub id: String,
}

impl Target {
    /// Create a target.
    #[must_use]
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

/// Raw query parameters of the research products endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductsParams {
    /// Plot to compute instead of listing products.
    pub plot: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub years: Option<String>,
    pub start_year: Option<String>,
    pub end_year: Option<String>,
    pub subject: Option<String>,
    pub country: Option<String>,
    pub ranking: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub max: Option<String>,
    pub sort: Option<String>,
}

impl ProductsParams {
    /// Parse the work filters.
    pub fn filters(&self) -> ServiceResult<WorkFilters> {
        let (mut start_year, mut end_year) = match non_empty(self.years.as_deref()) {
            Some(years) => parse_years(years)?,
            None => (None, None),
        };
        if let Some(start) = non_empty(self.start_year.as_deref()) {
            start_year = Some(parse_year("start_year", start)?);
        }
        if let Some(end) = non_empty(self.end_year.as_deref()) {
            end_year = Some(parse_year("end_year", end)?);
        }
        if let (Some(start), Some(end)) = (start_year, end_year) {
            if start > end {
                return Err(ServiceError::validation(
                    "years",
                    format!("start year {start} is after end year {end}"),
                ));
            }
        }

        let countries = split_list(self.country.as_deref());
        if let Some(bad) = countries.iter().find(|c| !COUNTRY_RE.is_match(c)) {
            return Err(ServiceError::validation(
                "country",
                format!("'{bad}' is not an ISO-3166 alpha-2 code"),
            ));
        }

        Ok(WorkFilters {
            product_type: non_empty(self.product_type.as_deref()).map(str::to_string),
            start_year,
            end_year,
            subject: non_empty(self.subject.as_deref()).map(str::to_string),
            countries: countries.into_iter().map(|c| c.to_ascii_uppercase()).collect(),
            rankings: split_list(self.ranking.as_deref()),
            statuses: split_list(self.status.as_deref())
                .into_iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        })
    }

    /// Parse the pagination options.
    pub fn pagination(&self) -> ServiceResult<Pagination> {
        let page = match non_empty(self.page.as_deref()) {
            Some(p) => p
                .parse::<i64>()
                .ok()
                .filter(|p| (1..=limits::MAX_PAGE).contains(p))
                .ok_or_else(|| {
                    ServiceError::validation(
                        "page",
                        format!("must be between 1 and {}", limits::MAX_PAGE),
                    )
                })?,
            None => 1,
        };
        let max = match non_empty(self.max.as_deref()) {
            Some(m) => m
                .parse::<i64>()
                .ok()
                .filter(|m| (1..=limits::MAX_PAGE_SIZE).contains(m))
                .ok_or_else(|| {
                    ServiceError::validation(
                        "max",
                        format!("must be between 1 and {}", limits::MAX_PAGE_SIZE),
                    )
                })?,
            None => limits::DEFAULT_PAGE_SIZE,
        };
        let sort = match non_empty(self.sort.as_deref()) {
            Some(s) => s.parse().map_err(|e: String| ServiceError::validation("sort", e))?,
            None => SortOrder::default(),
        };
        Ok(Pagination { page, max, sort })
    }
}

/// Validated filters applied to work queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkFilters {
    /// Product type (`types.type`).
    pub product_type: Option<String>,
    /// Inclusive first publication year.
    pub start_year: Option<i32>,
    /// Inclusive last publication year.
    pub end_year: Option<i32>,
    /// Subject name.
    pub subject: Option<String>,
    /// ISO-3166 alpha-2 codes of co-author affiliations.
    pub countries: Vec<String>,
    /// Source ranks (e.g. Q1).
    pub rankings: Vec<String>,
    /// Open access statuses.
    pub statuses: Vec<String>,
}

impl WorkFilters {
    /// Filters restricted to a year range.
    #[must_use]
    pub fn years(start: Option<i32>, end: Option<i32>) -> Self {
        Self { start_year: start, end_year: end, ..Self::default() }
    }

    /// True when no filter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Stable textual form used in cache keys.
    #[must_use]
    pub fn cache_fragment(&self) -> String {
        let join = |v: &[String]| {
            let mut sorted = v.to_vec();
            sorted.sort();
            sorted.join(",")
        };
        format!(
            "type={};years={}-{};subject={};country={};ranking={};status={}",
            self.product_type.as_deref().unwrap_or(""),
            self.start_year.map_or(String::new(), |y| y.to_string()),
            self.end_year.map_or(String::new(), |y| y.to_string()),
            self.subject.as_deref().unwrap_or(""),
            join(&self.countries),
            join(&self.rankings),
            join(&self.statuses),
        )
    }
}

/// Page selection for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number.
    pub page: i64,
    /// Page size.
    pub max: i64,
    /// Sort order.
    pub sort: SortOrder,
}

impl Pagination {
    /// Documents to skip.
    #[must_use]
    pub const fn skip(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.max)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, max: limits::DEFAULT_PAGE_SIZE, sort: SortOrder::default() }
    }
}

/// Raw query parameters of the search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub keywords: Option<String>,
    /// Narrow affiliation searches to one kind.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<String>,
    pub max: Option<String>,
}

impl SearchParams {
    /// Parse pagination using the product rules (sort is ignored).
    pub fn pagination(&self) -> ServiceResult<Pagination> {
        ProductsParams { page: self.page.clone(), max: self.max.clone(), ..Default::default() }
            .pagination()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

fn parse_year(field: &str, value: &str) -> ServiceResult<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|y| (1000..=9999).contains(y))
        .ok_or_else(|| ServiceError::validation(field, format!("'{value}' is not a year")))
}

fn parse_years(value: &str) -> ServiceResult<(Option<i32>, Option<i32>)> {
    let caps = YEARS_RE.captures(value).ok_or_else(|| {
        ServiceError::validation("years", format!("'{value}' must be YYYY or YYYY-YYYY"))
    })?;
    let start = parse_year("years", &caps[1])?;
    let end = match caps.get(2) {
        Some(m) => parse_year("years", m.as_str())?,
        None => start,
    };
    Ok((Some(start), Some(end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ProductsParams {
        ProductsParams::default()
    }

    #[test]
    fn test_years_range() {
        let p = ProductsParams { years: Some("2010-2020".into()), ..params() };
        let filters = p.filters().unwrap();
        assert_eq!(filters.start_year, Some(2010));
        assert_eq!(filters.end_year, Some(2020));

        let p = ProductsParams { years: Some("2015".into()), ..params() };
        let filters = p.filters().unwrap();
        assert_eq!((filters.start_year, filters.end_year), (Some(2015), Some(2015)));
    }

    #[test]
    fn test_explicit_bounds_override_range() {
        let p = ProductsParams {
            years: Some("2010-2020".into()),
            end_year: Some("2012".into()),
            ..params()
        };
        let filters = p.filters().unwrap();
        assert_eq!((filters.start_year, filters.end_year), (Some(2010), Some(2012)));
    }

    #[test]
    fn test_reversed_years_rejected() {
        let p = ProductsParams { years: Some("2020-2010".into()), ..params() };
        let err = p.filters().unwrap_err();
        assert!(err.to_user_message().contains("years"));
    }

    #[test]
    fn test_malformed_inputs_rejected() {
        assert!(ProductsParams { years: Some("20-10".into()), ..params() }.filters().is_err());
        assert!(ProductsParams { start_year: Some("abc".into()), ..params() }.filters().is_err());
        assert!(ProductsParams { country: Some("CO,COL".into()), ..params() }.filters().is_err());
    }

    #[test]
    fn test_lists_are_normalized() {
        let p = ProductsParams {
            country: Some("co, us".into()),
            status: Some("Gold,,green".into()),
            ranking: Some("Q1, Q2".into()),
            ..params()
        };
        let filters = p.filters().unwrap();
        assert_eq!(filters.countries, vec!["CO", "US"]);
        assert_eq!(filters.statuses, vec!["gold", "green"]);
        assert_eq!(filters.rankings, vec!["Q1", "Q2"]);
    }

    #[test]
    fn test_empty_filters() {
        let filters = ProductsParams { subject: Some("  ".into()), ..params() }.filters().unwrap();
        assert!(filters.is_empty());
    }

    #[test]
    fn test_cache_fragment_is_order_independent() {
        let a = WorkFilters { countries: vec!["US".into(), "CO".into()], ..WorkFilters::default() };
        let b = WorkFilters { countries: vec!["CO".into(), "US".into()], ..WorkFilters::default() };
        assert_eq!(a.cache_fragment(), b.cache_fragment());
    }

    #[test]
    fn test_pagination() {
        let p = ProductsParams {
            page: Some("3".into()),
            max: Some("20".into()),
            sort: Some("year_asc".into()),
            ..params()
        };
        let pagination = p.pagination().unwrap();
        assert_eq!(pagination.skip(), 40);
        assert_eq!(pagination.sort, SortOrder::YearAsc);

        assert_eq!(params().pagination().unwrap(), Pagination::default());
        assert!(ProductsParams { max: Some("251".into()), ..params() }.pagination().is_err());
        assert!(ProductsParams { page: Some("0".into()), ..params() }.pagination().is_err());
        assert!(ProductsParams { sort: Some("random".into()), ..params() }.pagination().is_err());
    }

    #[test]
    fn test_page_upper_bound() {
        let last = ProductsParams {
            page: Some(limits::MAX_PAGE.to_string()),
            max: Some(limits::MAX_PAGE_SIZE.to_string()),
            ..params()
        };
        let pagination = last.pagination().unwrap();
        assert_eq!(pagination.skip(), (limits::MAX_PAGE - 1) * limits::MAX_PAGE_SIZE);

        let huge = ProductsParams {
            page: Some(i64::MAX.to_string()),
            max: Some("250".into()),
            ..params()
        };
        let err = huge.pagination().unwrap_err();
        assert!(err.to_user_message().contains("page"));

        let unchecked = Pagination { page: i64::MAX, max: 250, sort: SortOrder::default() };
        assert_eq!(unchecked.skip(), i64::MAX);
    }
}
