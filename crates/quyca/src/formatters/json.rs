//! Compact JSON summaries of KAHI records.

use serde_json::{Value, json};

use crate::config::DISPLAY_LANG;
use crate::models::{Affiliation, CatalogItem, EntityKind, Person, Source, Work};

/// Create a compact work representation for listings.
#[must_use]
pub fn compact_work(work: &Work) -> Value {
    let mut obj = json!({
        "id": work.id,
        "title": work.title(DISPLAY_LANG),
        "year_published": work.year_published,
        "citations_count": work.citations(),
    });

    if let Some(product_type) = work.product_type() {
        obj["product_type"] = json!({ "name": product_type.r#type, "source": product_type.source });
    }

    if !work.authors.is_empty() {
        obj["authors"] = json!(
            work.authors
                .iter()
                .map(|a| json!({ "id": a.id, "full_name": a.full_name }))
                .collect::<Vec<_>>()
        );
    }

    if let Some(source) = &work.source {
        obj["source"] = json!({ "id": source.id, "name": source.name });
    }

    if let Some(doi) = work.doi() {
        obj["doi"] = json!(doi);
    }

    if let Some(status) = work.open_access_status() {
        obj["open_access_status"] = json!(status);
    }

    if let Some(info) = work.bibliographic_info.as_ref().filter(|i| !i.is_empty()) {
        obj["bibliographic_info"] = json!(info);
    }

    obj
}

/// Create a compact person representation.
#[must_use]
pub fn compact_person(person: &Person) -> Value {
    let mut obj = json!({
        "id": person.id,
        "full_name": person.name(),
    });

    let current: Vec<Value> = person
        .current_affiliations()
        .map(|a| json!({ "id": a.id, "name": a.name }))
        .collect();
    if !current.is_empty() {
        obj["affiliations"] = json!(current);
    }

    if let Some(orcid) = person.orcid() {
        obj["orcid"] = json!(orcid);
    }

    if !person.external_ids.is_empty() {
        obj["external_ids"] = json!(person.external_ids);
    }

    obj
}

/// Create a compact affiliation representation.
#[must_use]
pub fn compact_affiliation(affiliation: &Affiliation) -> Value {
    let mut obj = json!({
        "id": affiliation.id,
        "name": affiliation.name(DISPLAY_LANG),
        "kind": affiliation.kind(),
    });

    if let Some(address) = affiliation.addresses.first() {
        obj["country_code"] = json!(address.country_code);
        obj["city"] = json!(address.city);
    }

    if !affiliation.relations.is_empty() {
        obj["relations"] = json!(
            affiliation
                .relations
                .iter()
                .map(|r| json!({
                    "id": r.id,
                    "name": r.name,
                    "kind": EntityKind::from_affiliation_types(&r.types),
                }))
                .collect::<Vec<_>>()
        );
    }

    if !affiliation.external_ids.is_empty() {
        obj["external_ids"] = json!(affiliation.external_ids);
    }

    obj
}

/// Create a compact source representation.
#[must_use]
pub fn compact_source(source: &Source) -> Value {
    let mut obj = json!({
        "id": source.id,
        "name": source.name(DISPLAY_LANG),
    });

    if let Some(publisher) = &source.publisher {
        obj["publisher"] = json!(publisher.name);
    }

    if let Some(apc) = &source.apc {
        if apc.charges.is_some() {
            obj["apc"] = json!(apc);
        }
    }

    if !source.external_ids.is_empty() {
        obj["external_ids"] = json!(source.external_ids);
    }

    obj
}

/// Create a compact patent or project representation.
#[must_use]
pub fn compact_catalog_item(item: &CatalogItem) -> Value {
    let mut obj = json!({
        "id": item.id,
        "title": item.title(DISPLAY_LANG),
        "year_published": item.year_published,
    });

    if let Some(label) = item.type_label() {
        obj["product_type"] = json!(label);
    }

    if !item.authors.is_empty() {
        obj["authors"] = json!(
            item.authors
                .iter()
                .map(|a| json!({ "id": a.id, "full_name": a.full_name }))
                .collect::<Vec<_>>()
        );
    }

    obj
}
