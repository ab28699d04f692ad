//! Aggregation pipeline construction.
//!
//! Every work query starts from the target `$match` and then layers filter
//! stages, lookups, sorting and pagination on top. The builder only appends;
//! stages already pushed are never reordered.

pub mod plots;

use bson::{Bson, Document, doc};

use crate::config::{DISPLAY_LANG, collections};
use crate::models::common::TITLE_SOURCE_PRIORITY;
use crate::models::{Pagination, SortOrder, Target, WorkFilters};
use crate::store::id_value;

/// `$match` stage.
#[must_use]
pub fn match_stage(filter: Document) -> Document {
    doc! { "$match": filter }
}

/// `$unwind` stage dropping documents where the path is missing or empty.
#[must_use]
pub fn unwind(path: &str) -> Document {
    doc! { "$unwind": path }
}

/// `$unwind` stage keeping documents where the path is missing or empty.
#[must_use]
pub fn unwind_preserving(path: &str) -> Document {
    doc! { "$unwind": { "path": path, "preserveNullAndEmptyArrays": true } }
}

/// `$group` stage.
#[must_use]
pub fn group(spec: Document) -> Document {
    doc! { "$group": spec }
}

/// `$sort` stage.
#[must_use]
pub fn sort(spec: Document) -> Document {
    doc! { "$sort": spec }
}

/// `$limit` stage.
#[must_use]
pub fn limit(n: i64) -> Document {
    doc! { "$limit": n }
}

/// `$skip` stage.
#[must_use]
pub fn skip(n: i64) -> Document {
    doc! { "$skip": n }
}

/// `$project` stage.
#[must_use]
pub fn project(spec: Document) -> Document {
    doc! { "$project": spec }
}

/// `$lookup` stage joining on one field.
#[must_use]
pub fn lookup(from: &str, local_field: &str, foreign_field: &str, as_field: &str) -> Document {
    doc! {
        "$lookup": {
            "from": from,
            "localField": local_field,
            "foreignField": foreign_field,
            "as": as_field,
        }
    }
}

/// `$lookup` stage joining on one field and reshaping the joined documents.
#[must_use]
pub fn lookup_with(
    from: &str,
    local_field: &str,
    foreign_field: &str,
    as_field: &str,
    pipeline: Vec<Document>,
) -> Document {
    doc! {
        "$lookup": {
            "from": from,
            "localField": local_field,
            "foreignField": foreign_field,
            "as": as_field,
            "pipeline": pipeline,
        }
    }
}

/// Single-field filter document.
#[must_use]
pub fn field_eq(field: &str, value: impl Into<Bson>) -> Document {
    let mut filter = Document::new();
    filter.insert(field, value.into());
    filter
}

/// `$match` selecting the works of a target.
#[must_use]
pub fn target_match(target: &Target) -> Document {
    match_stage(field_eq(target.kind.work_field(), id_value(&target.id)))
}

/// Stages implementing the work filters.
#[must_use]
pub fn filter_stages(filters: &WorkFilters) -> Vec<Document> {
    let mut stages = Vec::new();
    let mut conditions = Document::new();

    if let Some(product_type) = &filters.product_type {
        conditions.insert("types.type", product_type.as_str());
    }

    let mut years = Document::new();
    if let Some(start) = filters.start_year {
        years.insert("$gte", start);
    }
    if let Some(end) = filters.end_year {
        years.insert("$lte", end);
    }
    if !years.is_empty() {
        conditions.insert("year_published", years);
    }

    if let Some(subject) = &filters.subject {
        conditions.insert("subjects.subjects.name", subject.as_str());
    }

    if !filters.statuses.is_empty() {
        conditions.insert("open_access.open_access_status", doc! { "$in": filters.statuses.clone() });
    }

    if !conditions.is_empty() {
        stages.push(match_stage(conditions));
    }

    if !filters.countries.is_empty() {
        stages.push(lookup_with(
            collections::AFFILIATIONS,
            "authors.affiliations.id",
            "_id",
            "affiliations_data",
            vec![project(doc! { "addresses.country_code": 1 })],
        ));
        stages.push(match_stage(doc! {
            "affiliations_data.addresses.country_code": { "$in": filters.countries.clone() }
        }));
        stages.push(project(doc! { "affiliations_data": 0 }));
    }

    if !filters.rankings.is_empty() {
        stages.push(lookup_with(
            collections::SOURCES,
            "source.id",
            "_id",
            "source_ranking",
            vec![project(doc! { "ranking.rank": 1 })],
        ));
        stages.push(match_stage(doc! {
            "source_ranking.ranking.rank": { "$in": filters.rankings.clone() }
        }));
        stages.push(project(doc! { "source_ranking": 0 }));
    }

    stages
}

/// Fluent builder for work pipelines.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    stages: Vec<Document>,
}

impl PipelineBuilder {
    /// Empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline starting with the target match.
    #[must_use]
    pub fn for_target(target: &Target) -> Self {
        Self { stages: vec![target_match(target)] }
    }

    /// Append the filter stages.
    #[must_use]
    pub fn filters(mut self, filters: &WorkFilters) -> Self {
        self.stages.extend(filter_stages(filters));
        self
    }

    /// Append one stage.
    #[must_use]
    pub fn stage(mut self, stage: Document) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append several stages.
    #[must_use]
    pub fn stages(mut self, stages: impl IntoIterator<Item = Document>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Join the work's source as `source_data` (kept when the work has no source).
    #[must_use]
    pub fn lookup_source(self) -> Self {
        self.stage(lookup(collections::SOURCES, "source.id", "_id", "source_data"))
            .stage(unwind_preserving("$source_data"))
    }

    /// Add a `citations` field: the largest count reported by any provenance.
    #[must_use]
    pub fn with_citations(self) -> Self {
        self.stage(doc! {
            "$addFields": { "citations": { "$ifNull": [{ "$max": "$citations_count.count" }, 0] } }
        })
    }

    /// Sort works; citation orders require [`Self::with_citations`] first.
    #[must_use]
    pub fn sorted(self, order: SortOrder) -> Self {
        match order {
            SortOrder::CitationsDesc => self.stage(sort(doc! { "citations": -1, "_id": 1 })),
            SortOrder::CitationsAsc => self.stage(sort(doc! { "citations": 1, "_id": 1 })),
            SortOrder::YearDesc => self.stage(sort(doc! { "year_published": -1, "_id": 1 })),
            SortOrder::YearAsc => self.stage(sort(doc! { "year_published": 1, "_id": 1 })),
            SortOrder::AlphabeticalAsc | SortOrder::AlphabeticalDesc => {
                let direction = if order == SortOrder::AlphabeticalAsc { 1 } else { -1 };
                self.stage(doc! { "$addFields": { "sort_title": display_title(DISPLAY_LANG) } })
                    .stage(sort(doc! { "sort_title": direction, "_id": 1 }))
            }
        }
    }

    /// Sort and page.
    #[must_use]
    pub fn paginated(self, pagination: &Pagination) -> Self {
        self.sorted(pagination.sort).stage(skip(pagination.skip())).stage(limit(pagination.max))
    }

    /// Cap the number of documents.
    #[must_use]
    pub fn limit(self, n: i64) -> Self {
        self.stage(limit(n))
    }

    /// Finish with a `$count` into the `total` field.
    #[must_use]
    pub fn count(mut self) -> Vec<Document> {
        self.stages.push(doc! { "$count": "total" });
        self.stages
    }

    /// Number of stages so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True when no stage was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Finish the pipeline.
    #[must_use]
    pub fn build(self) -> Vec<Document> {
        self.stages
    }
}

/// Lowercased display title of a work, chosen server-side the same way
/// `select_title` picks it: provenance priority, then language, then order.
#[must_use]
pub fn display_title(lang: &str) -> Document {
    let priority: Vec<&str> = TITLE_SOURCE_PRIORITY.to_vec();
    let unranked = i64::try_from(priority.len()).unwrap_or(i64::MAX);
    let usable = doc! {
        "$filter": {
            "input": { "$ifNull": ["$titles", []] },
            "as": "t",
            "cond": { "$ne": [{ "$trim": { "input": { "$ifNull": ["$$t.title", ""] } } }, ""] },
        }
    };
    let rank = doc! {
        "$let": {
            "vars": { "idx": { "$indexOfArray": [priority, { "$toLower": "$$t.source" }] } },
            "in": { "$cond": [{ "$eq": ["$$idx", -1] }, unranked, "$$idx"] },
        }
    };
    let lang_miss = doc! {
        "$cond": [{ "$eq": [{ "$toLower": { "$ifNull": ["$$t.lang", ""] } }, lang.to_lowercase()] }, 0, 1]
    };
    // Strict comparison keeps the first title among equal keys.
    let best = doc! {
        "$reduce": {
            "input": {
                "$map": {
                    "input": usable,
                    "as": "t",
                    "in": {
                        "title": "$$t.title",
                        "key": { "$add": [{ "$multiply": [rank, 2] }, lang_miss] },
                    },
                }
            },
            "initialValue": Bson::Null,
            "in": {
                "$cond": [
                    { "$or": [{ "$eq": ["$$value", Bson::Null] }, { "$lt": ["$$this.key", "$$value.key"] }] },
                    "$$this",
                    "$$value",
                ]
            },
        }
    };
    doc! {
        "$toLower": {
            "$trim": {
                "input": { "$let": { "vars": { "best": best }, "in": { "$ifNull": ["$$best.title", ""] } } }
            }
        }
    }
}

/// Text search over a collection, best matches first.
#[must_use]
pub fn text_search(keywords: &str, extra: Option<Document>, pagination: &Pagination) -> Vec<Document> {
    let mut filter = doc! { "$text": { "$search": keywords } };
    for (key, value) in extra.into_iter().flatten() {
        filter.insert(key, value);
    }
    vec![
        match_stage(filter),
        doc! { "$addFields": { "score": { "$meta": "textScore" } } },
        sort(doc! { "score": -1, "_id": 1 }),
        skip(pagination.skip()),
        limit(pagination.max),
    ]
}

/// Count the matches of a text search.
#[must_use]
pub fn text_search_count(keywords: &str, extra: Option<Document>) -> Vec<Document> {
    let mut filter = doc! { "$text": { "$search": keywords } };
    for (key, value) in extra.into_iter().flatten() {
        filter.insert(key, value);
    }
    vec![match_stage(filter), doc! { "$count": "total" }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityKind;

    fn first_key(stage: &Document) -> &str {
        stage.keys().next().map(String::as_str).unwrap_or("")
    }

    #[test]
    fn test_target_match_fields() {
        let stage = target_match(&Target::new(EntityKind::Person, "p1"));
        assert_eq!(stage, doc! { "$match": { "authors.id": "p1" } });

        let stage = target_match(&Target::new(EntityKind::Group, "g1"));
        assert_eq!(stage, doc! { "$match": { "authors.affiliations.id": "g1" } });

        let stage = target_match(&Target::new(EntityKind::Source, "s1"));
        assert_eq!(stage, doc! { "$match": { "source.id": "s1" } });
    }

    #[test]
    fn test_no_filters_no_stages() {
        assert!(filter_stages(&WorkFilters::default()).is_empty());
    }

    #[test]
    fn test_simple_filters_share_one_match() {
        let filters = WorkFilters {
            product_type: Some("article".into()),
            start_year: Some(2010),
            end_year: Some(2020),
            subject: Some("Medicine".into()),
            statuses: vec!["gold".into()],
            ..WorkFilters::default()
        };
        let stages = filter_stages(&filters);
        assert_eq!(stages.len(), 1);
        assert_eq!(
            stages[0],
            doc! {
                "$match": {
                    "types.type": "article",
                    "year_published": { "$gte": 2010, "$lte": 2020 },
                    "subjects.subjects.name": "Medicine",
                    "open_access.open_access_status": { "$in": ["gold"] },
                }
            }
        );
    }

    #[test]
    fn test_open_year_bounds() {
        let stages = filter_stages(&WorkFilters::years(None, Some(2015)));
        assert_eq!(stages[0], doc! { "$match": { "year_published": { "$lte": 2015 } } });
    }

    #[test]
    fn test_country_filter_joins_affiliations() {
        let filters = WorkFilters { countries: vec!["CO".into()], ..WorkFilters::default() };
        let stages = filter_stages(&filters);
        let keys: Vec<_> = stages.iter().map(first_key).collect();
        assert_eq!(keys, vec!["$lookup", "$match", "$project"]);
        let lookup = stages[0].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), "affiliations");
        assert_eq!(lookup.get_str("localField").unwrap(), "authors.affiliations.id");
    }

    #[test]
    fn test_ranking_filter_joins_sources() {
        let filters = WorkFilters { rankings: vec!["Q1".into()], ..WorkFilters::default() };
        let stages = filter_stages(&filters);
        let lookup = stages[0].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), "sources");
        assert_eq!(
            stages[1],
            doc! { "$match": { "source_ranking.ranking.rank": { "$in": ["Q1"] } } }
        );
    }

    #[test]
    fn test_builder_order() {
        let target = Target::new(EntityKind::Institution, "i1");
        let filters = WorkFilters::years(Some(2000), None);
        let pagination = Pagination { page: 2, max: 25, sort: SortOrder::CitationsDesc };
        let stages = PipelineBuilder::for_target(&target)
            .filters(&filters)
            .with_citations()
            .paginated(&pagination)
            .build();

        let keys: Vec<_> = stages.iter().map(first_key).collect();
        assert_eq!(keys, vec!["$match", "$match", "$addFields", "$sort", "$skip", "$limit"]);
        assert_eq!(stages[0], target_match(&target));
        assert_eq!(stages[4], doc! { "$skip": 25_i64 });
        assert_eq!(stages[5], doc! { "$limit": 25_i64 });
    }

    #[test]
    fn test_count_is_last() {
        let stages = PipelineBuilder::for_target(&Target::new(EntityKind::Person, "p"))
            .filters(&WorkFilters { countries: vec!["US".into()], ..WorkFilters::default() })
            .count();
        assert_eq!(stages.last(), Some(&doc! { "$count": "total" }));
    }

    #[test]
    fn test_alphabetical_sort() {
        let stages = PipelineBuilder::new().sorted(SortOrder::AlphabeticalDesc).build();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[1], doc! { "$sort": { "sort_title": -1, "_id": 1 } });
        assert_eq!(stages[0], doc! { "$addFields": { "sort_title": display_title("es") } });
    }

    #[test]
    fn test_display_title_follows_provenance_priority() {
        let expr = display_title("es");
        let rendered = Bson::Document(expr).into_relaxed_extjson().to_string();
        assert!(rendered.contains(r#"["scienti","minciencias","ranking","openalex"]"#));
        assert!(rendered.contains(r#""es""#));
        assert!(rendered.contains("$reduce"));
    }

    #[test]
    fn test_text_search() {
        let pagination = Pagination::default();
        let stages = text_search("antioquia", Some(doc! { "types.type": "group" }), &pagination);
        assert_eq!(
            stages[0],
            doc! { "$match": { "$text": { "$search": "antioquia" }, "types.type": "group" } }
        );
        assert_eq!(text_search_count("x", None).len(), 2);
    }
}
