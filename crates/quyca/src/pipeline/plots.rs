//! Pipelines feeding the dashboard plots.
//!
//! Each function returns the stages whose output the matching parser in
//! `crate::plots` expects. Grouping is pushed to MongoDB wherever the
//! statistic is a plain sum; anything needing disambiguation or currency
//! conversion is grouped coarsely here and finished in Rust.

use bson::{Bson, Document, Regex, doc};

use super::{
    PipelineBuilder, field_eq, group, lookup_with, match_stage, project, sort, unwind,
    unwind_preserving,
};
use crate::config::collections;
use crate::models::{EntityKind, Target, WorkFilters};
use crate::store::{id_value, id_values};

/// Affiliation types that mark sub-units rather than institutions.
pub const SUB_UNIT_TYPES: &[&str] = &["faculty", "department", "group"];

/// Case-insensitive pattern matching any of `types` exactly.
#[must_use]
pub fn type_pattern(types: &[&str]) -> Bson {
    Bson::RegularExpression(Regex {
        pattern: format!("^({})$", types.join("|")),
        options: "i".to_string(),
    })
}

/// Whether an affiliation type tag marks a sub-unit.
#[must_use]
pub fn is_sub_unit_type(name: &str) -> bool {
    SUB_UNIT_TYPES.iter().any(|t| t.eq_ignore_ascii_case(name))
}

fn base(target: &Target, filters: &WorkFilters) -> PipelineBuilder {
    PipelineBuilder::for_target(target).filters(filters)
}

/// Works grouped by year and raw type list.
#[must_use]
pub fn year_type(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .stage(group(doc! {
            "_id": { "year": "$year_published", "types": "$types" },
            "count": { "$sum": 1 },
        }))
        .build()
}

/// Citations received per year.
#[must_use]
pub fn year_citations(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .stage(unwind("$citations_by_year"))
        .stage(group(doc! {
            "_id": "$citations_by_year.year",
            "citations": { "$sum": "$citations_by_year.cited_by_count" },
        }))
        .stage(sort(doc! { "_id": 1 }))
        .build()
}

/// APC charges grouped by publication year and currency.
#[must_use]
pub fn year_apc(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .lookup_source()
        .stage(match_stage(doc! { "source_data.apc.charges": { "$gt": 0 } }))
        .stage(group(doc! {
            "_id": { "year": "$year_published", "currency": "$source_data.apc.currency" },
            "charges": { "$sum": "$source_data.apc.charges" },
        }))
        .build()
}

/// Works grouped by year and open access status.
#[must_use]
pub fn year_open_access(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .stage(group(doc! {
            "_id": { "year": "$year_published", "status": "$open_access.open_access_status" },
            "count": { "$sum": 1 },
        }))
        .build()
}

/// Works grouped by year and publisher.
#[must_use]
pub fn year_publisher(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .lookup_source()
        .stage(group(doc! {
            "_id": { "year": "$year_published", "publisher": "$source_data.publisher.name" },
            "count": { "$sum": 1 },
        }))
        .build()
}

/// Publication year and yearly citations of every work.
#[must_use]
pub fn citation_history(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .stage(project(doc! { "year_published": 1, "citations_by_year": 1 }))
        .build()
}

/// Works per level-0 OpenAlex subject.
#[must_use]
pub fn by_subject(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .stage(unwind("$subjects"))
        .stage(match_stage(doc! { "subjects.source": "openalex" }))
        .stage(unwind("$subjects.subjects"))
        .stage(match_stage(doc! { "subjects.subjects.level": 0 }))
        .stage(group(doc! { "_id": "$subjects.subjects.name", "count": { "$sum": 1 } }))
        .build()
}

/// Works per contributing provenance.
#[must_use]
pub fn by_database(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .stage(unwind("$updated"))
        .stage(group(doc! { "_id": "$updated.source", "count": { "$sum": 1 } }))
        .build()
}

/// Works per open access status.
#[must_use]
pub fn by_open_access(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .stage(group(doc! { "_id": "$open_access.open_access_status", "count": { "$sum": 1 } }))
        .build()
}

/// Works per publisher.
#[must_use]
pub fn by_publisher(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .lookup_source()
        .stage(group(doc! { "_id": "$source_data.publisher.name", "count": { "$sum": 1 } }))
        .build()
}

/// Authorships of the target's members joined with one person field.
fn member_authorships(target: &Target, filters: &WorkFilters, person_field: &str) -> PipelineBuilder {
    let mut joined = Document::new();
    joined.insert(person_field, 1);

    base(target, filters)
        .stage(project(doc! { "authors": 1, "year_published": 1 }))
        .stage(unwind("$authors"))
        .stage(match_stage(field_eq("authors.affiliations.id", id_value(&target.id))))
        .stage(lookup_with(
            collections::PERSON,
            "authors.id",
            "_id",
            "author_data",
            vec![project(joined)],
        ))
        .stage(unwind_preserving("$author_data"))
}

/// Authorships of affiliation members per registered sex.
#[must_use]
pub fn by_author_sex(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    member_authorships(target, filters, "sex")
        .stage(group(doc! { "_id": "$author_data.sex", "count": { "$sum": 1 } }))
        .build()
}

/// Authorships of affiliation members grouped by birth date and publication year.
#[must_use]
pub fn by_author_age(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    member_authorships(target, filters, "birthdate")
        .stage(group(doc! {
            "_id": { "birthdate": "$author_data.birthdate", "year": "$year_published" },
            "count": { "$sum": 1 },
        }))
        .build()
}

/// Works per Scienti product category.
#[must_use]
pub fn by_scienti_rank(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .stage(unwind("$ranking"))
        .stage(match_stage(doc! { "ranking.source": "scienti" }))
        .stage(group(doc! { "_id": "$ranking.rank", "count": { "$sum": 1 } }))
        .build()
}

/// Works grouped by publication year and source, carrying the source ranking.
#[must_use]
pub fn by_journal_rank(target: &Target, filters: &WorkFilters) -> Vec<Document> {
    base(target, filters)
        .stage(lookup_with(
            collections::SOURCES,
            "source.id",
            "_id",
            "source_data",
            vec![project(doc! { "ranking": 1 })],
        ))
        .stage(unwind_preserving("$source_data"))
        .stage(group(doc! {
            "_id": { "year": "$year_published", "source": "$source.id" },
            "ranking": { "$first": "$source_data.ranking" },
            "count": { "$sum": 1 },
        }))
        .build()
}

/// Sub-units of an affiliation: affiliations related to it, or member persons of a group.
#[must_use]
pub fn children(target: &Target, child_kind: EntityKind) -> (&'static str, Vec<Document>) {
    if child_kind == EntityKind::Person {
        let pipeline = vec![
            match_stage(field_eq("affiliations.id", id_value(&target.id))),
            project(doc! { "full_name": 1 }),
        ];
        (collections::PERSON, pipeline)
    } else {
        let mut filter = field_eq("relations.id", id_value(&target.id));
        filter.insert("types.type", type_pattern(&[child_kind.as_str()]));
        let pipeline = vec![match_stage(filter), project(doc! { "names": 1 })];
        (collections::AFFILIATIONS, pipeline)
    }
}

/// Statistic computed per sub-unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitMetric {
    /// Distinct works.
    Products,
    /// Sum of work citations.
    Citations,
    /// APC charges by year and currency.
    Apc,
    /// Citation list for the h-index.
    HIndex,
}

/// Works of the target attributed to each sub-unit, reduced by `metric`.
///
/// A work co-authored by two members of the same sub-unit counts once for it.
#[must_use]
pub fn by_unit(
    target: &Target,
    filters: &WorkFilters,
    child_kind: EntityKind,
    child_ids: &[String],
    metric: UnitMetric,
) -> Vec<Document> {
    let mut builder = base(target, filters);
    builder = match metric {
        UnitMetric::Apc => builder.lookup_source(),
        UnitMetric::Citations | UnitMetric::HIndex => builder.with_citations(),
        UnitMetric::Products => builder,
    };

    let ids: Vec<Bson> = id_values(child_ids);
    let unit_field = if child_kind == EntityKind::Person {
        builder = builder.stage(unwind("$authors"));
        "$authors.id"
    } else {
        builder = builder.stage(unwind("$authors")).stage(unwind("$authors.affiliations"));
        "$authors.affiliations.id"
    };
    let unit_path = unit_field.trim_start_matches('$');
    builder = builder.stage(match_stage(field_eq(unit_path, doc! { "$in": ids })));

    let mut dedup = doc! { "_id": { "unit": unit_field, "work": "$_id" } };
    match metric {
        UnitMetric::Products => {}
        UnitMetric::Citations | UnitMetric::HIndex => {
            dedup.insert("citations", doc! { "$first": "$citations" });
        }
        UnitMetric::Apc => {
            dedup.insert("year", doc! { "$first": "$year_published" });
            dedup.insert("apc", doc! { "$first": "$source_data.apc" });
        }
    }
    builder = builder.stage(group(dedup));

    let reduce = match metric {
        UnitMetric::Products => doc! { "_id": "$_id.unit", "count": { "$sum": 1 } },
        UnitMetric::Citations => doc! { "_id": "$_id.unit", "citations": { "$sum": "$citations" } },
        UnitMetric::HIndex => doc! { "_id": "$_id.unit", "citations": { "$push": "$citations" } },
        UnitMetric::Apc => doc! {
            "_id": { "unit": "$_id.unit", "year": "$year", "currency": "$apc.currency" },
            "charges": { "$sum": "$apc.charges" },
        },
    };
    builder.stage(group(reduce)).build()
}

/// Co-authoring institutions with the number of works shared with the target.
///
/// `home` lists the affiliations standing for the target itself; they are
/// never counted as collaborators.
fn coauthor_institutions(target: &Target, filters: &WorkFilters, home: &[String]) -> PipelineBuilder {
    let mut builder = base(target, filters)
        .stage(project(doc! { "authors.affiliations.id": 1, "authors.affiliations.types": 1 }))
        .stage(unwind("$authors"))
        .stage(unwind("$authors.affiliations"))
        .stage(match_stage(doc! {
            "authors.affiliations.types.type": { "$not": type_pattern(SUB_UNIT_TYPES) },
        }));
    if !home.is_empty() {
        builder = builder.stage(match_stage(doc! {
            "authors.affiliations.id": { "$nin": id_values(home) }
        }));
    }
    builder
        .stage(group(doc! { "_id": { "affiliation": "$authors.affiliations.id", "work": "$_id" } }))
        .stage(group(doc! { "_id": "$_id.affiliation", "count": { "$sum": 1 } }))
        .stage(lookup_with(
            collections::AFFILIATIONS,
            "_id",
            "_id",
            "affiliation",
            vec![project(doc! { "addresses": 1 })],
        ))
        .stage(unwind("$affiliation"))
        .stage(unwind("$affiliation.addresses"))
}

/// Collaborations per country.
#[must_use]
pub fn collaboration_countries(target: &Target, filters: &WorkFilters, home: &[String]) -> Vec<Document> {
    coauthor_institutions(target, filters, home)
        .stage(group(doc! {
            "_id": "$affiliation.addresses.country_code",
            "country": { "$first": "$affiliation.addresses.country" },
            "count": { "$sum": "$count" },
        }))
        .build()
}

/// Collaborations per city of one country.
#[must_use]
pub fn collaboration_cities(
    target: &Target,
    filters: &WorkFilters,
    home: &[String],
    country_code: &str,
) -> Vec<Document> {
    coauthor_institutions(target, filters, home)
        .stage(match_stage(doc! { "affiliation.addresses.country_code": country_code }))
        .stage(group(doc! {
            "_id": "$affiliation.addresses.city",
            "lat": { "$first": "$affiliation.addresses.lat" },
            "lng": { "$first": "$affiliation.addresses.lng" },
            "count": { "$sum": "$count" },
        }))
        .build()
}

/// Authors and affiliations of the target's works, capped at `work_limit` works.
#[must_use]
pub fn collaboration_participants(target: &Target, filters: &WorkFilters, work_limit: i64) -> Vec<Document> {
    base(target, filters)
        .limit(work_limit)
        .stage(project(doc! {
            "authors.id": 1,
            "authors.full_name": 1,
            "authors.affiliations.id": 1,
            "authors.affiliations.name": 1,
            "authors.affiliations.types": 1,
        }))
        .build()
}

/// Product count, citation sum and citation list of a target.
#[must_use]
pub fn indicators(target: &Target) -> Vec<Document> {
    PipelineBuilder::for_target(target)
        .with_citations()
        .stage(group(doc! {
            "_id": Bson::Null,
            "products": { "$sum": 1 },
            "citations_sum": { "$sum": "$citations" },
            "citations": { "$push": "$citations" },
        }))
        .build()
}
