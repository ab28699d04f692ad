//! Service tests: entity summaries, listings, exports and search.

mod common;

use std::sync::Arc;

use bson::{Bson, doc};

use quyca::config::collections;
use quyca::error::{ServiceError, StoreError};
use quyca::models::{EntityKind, ExportFormat, Pagination, Resource, Target, WorkFilters};

use common::{FixtureStore, faculty, institution, person, services, work};

// =============================================================================
// Target resolution
// =============================================================================

#[tokio::test]
async fn test_resolve_affiliation_kind_from_types() {
    let store = Arc::new(
        FixtureStore::new()
            .with_document(collections::AFFILIATIONS, institution("i1", "Universidad de Antioquia"))
            .with_document(collections::AFFILIATIONS, faculty("f1", "Facultad de Medicina")),
    );
    let services = services(store);

    let target = services.target(Resource::Affiliation, "i1").await.unwrap();
    assert_eq!(target, Target::new(EntityKind::Institution, "i1"));

    let target = services.target(Resource::Affiliation, "f1").await.unwrap();
    assert_eq!(target.kind, EntityKind::Faculty);
}

#[tokio::test]
async fn test_resolve_missing_and_invalid_targets() {
    let services = services(Arc::new(FixtureStore::new()));

    let err = services.target(Resource::Person, "nobody").await.unwrap_err();
    assert!(err.is_not_found());

    let err = services.target(Resource::Person, "  ").await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::InvalidId(_))));

    let err = services.target(Resource::Work, "w1").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));
}

// =============================================================================
// Entity summaries
// =============================================================================

#[tokio::test]
async fn test_institution_info_with_indicators() {
    let store = Arc::new(
        FixtureStore::new()
            .with_document(collections::AFFILIATIONS, institution("i1", "Universidad de Antioquia"))
            .with_result(
                collections::WORKS,
                vec![doc! { "_id": null, "products": 3, "citations_sum": 12, "citations": [6, 4, 2] }],
            ),
    );
    let services = services(Arc::clone(&store));

    let info = services.entities.info(Resource::Affiliation, "i1").await.unwrap();
    let data = &info["data"];
    assert_eq!(data["name"], "Universidad de Antioquia");
    assert_eq!(data["kind"], "institution");
    assert_eq!(data["country_code"], "CO");
    assert_eq!(data["products_count"], 3);
    assert_eq!(data["citations_count"], 12);
    assert_eq!(data["h_index"], 2);
    assert_eq!(store.pipelines().len(), 1);
}

#[tokio::test]
async fn test_work_info_has_no_indicators() {
    let store = Arc::new(FixtureStore::new().with_document(collections::WORKS, work("w1", "Deep learning", 2020, 7)));
    let services = services(Arc::clone(&store));

    let info = services.entities.info(Resource::Work, "w1").await.unwrap();
    assert_eq!(info["data"]["title"], "Deep learning");
    assert_eq!(info["data"]["citations_count"], 7);
    assert!(info["data"].get("h_index").is_none());
    assert!(store.pipelines().is_empty());
}

#[tokio::test]
async fn test_person_without_products_has_zero_indicators() {
    let store = Arc::new(FixtureStore::new().with_document(collections::PERSON, person("p1", "Ana Pérez")));
    let services = services(store);

    let info = services.entities.info(Resource::Person, "p1").await.unwrap();
    assert_eq!(info["data"]["full_name"], "Ana Pérez");
    assert_eq!(info["data"]["products_count"], 0);
    assert_eq!(info["data"]["h_index"], 0);
}

// =============================================================================
// Listings and exports
// =============================================================================

#[tokio::test]
async fn test_products_page() {
    let store = Arc::new(
        FixtureStore::new()
            .with_result(
                collections::WORKS,
                vec![work("w1", "Deep learning", 2020, 7), work("w2", "Malaria vaccines", 2018, 3)],
            )
            .with_result(collections::WORKS, vec![doc! { "total": 12 }]),
    );
    let services = services(Arc::clone(&store));
    let target = Target::new(EntityKind::Person, "p1");
    let pagination = Pagination { max: 2, ..Pagination::default() };

    let page = services.products.list(&target, &WorkFilters::default(), &pagination).await.unwrap();
    assert_eq!(page.total_results, 12);
    assert_eq!(page.count, 2);
    assert_eq!(page.page, 1);
    assert_eq!(page.data[0]["title"], "Deep learning");
    assert_eq!(page.data[0]["doi"], "10.1000/w1");
    assert_eq!(page.data[1]["open_access_status"], "gold");

    let pipelines = store.pipelines();
    assert_eq!(pipelines.len(), 2);
    assert!(pipelines[0].1.iter().any(|stage| matches!(stage.get_i64("$limit"), Ok(2))));
    assert!(pipelines[1].1.last().unwrap().contains_key("$count"));
}

#[tokio::test]
async fn test_products_page_with_country_and_ranking_filters() {
    let store = Arc::new(
        FixtureStore::new()
            .with_result(collections::WORKS, vec![work("w1", "Deep learning", 2020, 7)])
            .with_result(collections::WORKS, vec![doc! { "total": 1 }]),
    );
    let services = services(Arc::clone(&store));
    let target = Target::new(EntityKind::Institution, "i1");
    let filters = WorkFilters {
        countries: vec!["US".into()],
        rankings: vec!["Q1".into()],
        ..WorkFilters::default()
    };

    let page = services.products.list(&target, &filters, &Pagination::default()).await.unwrap();
    assert_eq!(page.total_results, 1);

    for (collection, pipeline) in store.pipelines() {
        assert_eq!(collection, collections::WORKS);
        assert!(pipeline.contains(&doc! {
            "$match": { "affiliations_data.addresses.country_code": { "$in": ["US"] } }
        }));
        assert!(pipeline.contains(&doc! {
            "$match": { "source_ranking.ranking.rank": { "$in": ["Q1"] } }
        }));
    }
    assert_eq!(store.pipelines().len(), 2);
}

#[tokio::test]
async fn test_csv_export() {
    let store = Arc::new(FixtureStore::new().with_result(
        collections::WORKS,
        vec![work("w1", "Deep learning, revisited", 2020, 7)],
    ));
    let services = services(store);
    let target = Target::new(EntityKind::Source, "s1");

    let output = services
        .export
        .export(&target, &WorkFilters::default(), ExportFormat::Csv)
        .await
        .unwrap();
    assert!(output.content_type.starts_with("text/csv"));

    let mut lines = output.body.lines();
    assert!(lines.next().unwrap().starts_with("id,title,product_type"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("w1,\"Deep learning, revisited\",article,2020,"));
    assert!(lines.next().is_none());
}

#[tokio::test]
async fn test_json_export() {
    let store = Arc::new(FixtureStore::new().with_result(
        collections::WORKS,
        vec![work("w1", "Deep learning", 2020, 7), work("w2", "Malaria vaccines", 2018, 3)],
    ));
    let services = services(store);
    let target = Target::new(EntityKind::Group, "g1");

    let output = services
        .export
        .export(&target, &WorkFilters::default(), ExportFormat::Json)
        .await
        .unwrap();
    assert_eq!(output.content_type, "application/json");
    let parsed: serde_json::Value = serde_json::from_str(&output.body).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
    assert_eq!(parsed[1]["id"], "w2");
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_requires_keywords() {
    let store = Arc::new(FixtureStore::new());
    let services = services(Arc::clone(&store));

    let err = services
        .search
        .search(Resource::Person, "   ", None, &Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));
    assert!(store.pipelines().is_empty());
}

#[tokio::test]
async fn test_search_affiliations_by_kind() {
    let store = Arc::new(
        FixtureStore::new()
            .with_result(collections::AFFILIATIONS, vec![faculty("f1", "Facultad de Medicina")])
            .with_result(collections::AFFILIATIONS, vec![doc! { "total": 1 }]),
    );
    let services = services(Arc::clone(&store));

    let page = services
        .search
        .search(Resource::Affiliation, "medicina", Some(EntityKind::Faculty), &Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total_results, 1);
    assert_eq!(page.data[0]["kind"], "faculty");
    assert_eq!(page.data[0]["name"], "Facultad de Medicina");

    let pipelines = store.pipelines();
    let filter = pipelines[0].1[0].get_document("$match").unwrap();
    assert_eq!(filter.get_document("$text").unwrap().get_str("$search").unwrap(), "medicina");
    match filter.get("types.type") {
        Some(Bson::RegularExpression(regex)) => {
            assert_eq!(regex.pattern, "^(faculty)$");
            assert_eq!(regex.options, "i");
        }
        other => panic!("unexpected kind filter {other:?}"),
    }
}

#[tokio::test]
async fn test_search_kind_only_for_affiliations() {
    let services = services(Arc::new(FixtureStore::new()));
    let err = services
        .search
        .search(Resource::Source, "nature", Some(EntityKind::Group), &Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));
}
