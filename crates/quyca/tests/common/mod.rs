//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bson::{Document, doc};

use quyca::config::Config;
use quyca::error::{StoreError, StoreResult};
use quyca::plots::PlotContext;
use quyca::services::Services;
use quyca::stats::CurrencyConverter;
use quyca::store::Store;

/// In-memory store returning canned documents.
///
/// `find_one` matches on `_id`; `aggregate` pops queued results per
/// collection in call order and returns an empty result once the queue is
/// drained. Every pipeline is recorded.
#[derive(Default)]
pub struct FixtureStore {
    documents: Mutex<HashMap<String, Vec<Document>>>,
    results: Mutex<HashMap<String, VecDeque<Vec<Document>>>>,
    pipelines: Mutex<Vec<(String, Vec<Document>)>>,
    down: bool,
}

impl FixtureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails with a connection error.
    pub fn unavailable() -> Self {
        Self { down: true, ..Self::default() }
    }

    pub fn with_document(self, collection: &str, document: Document) -> Self {
        self.documents.lock().unwrap().entry(collection.to_string()).or_default().push(document);
        self
    }

    pub fn with_result(self, collection: &str, rows: Vec<Document>) -> Self {
        self.results.lock().unwrap().entry(collection.to_string()).or_default().push_back(rows);
        self
    }

    /// Pipelines run so far, in order.
    pub fn pipelines(&self) -> Vec<(String, Vec<Document>)> {
        self.pipelines.lock().unwrap().clone()
    }

    fn check(&self) -> StoreResult<()> {
        if self.down {
            let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "fixture store is down");
            return Err(StoreError::Mongo(mongodb::error::Error::from(io)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for FixtureStore {
    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>> {
        self.check()?;
        let documents = self.documents.lock().unwrap();
        Ok(documents
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.get("_id") == filter.get("_id")))
            .cloned())
    }

    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> StoreResult<Vec<Document>> {
        self.check()?;
        self.pipelines.lock().unwrap().push((collection.to_string(), pipeline));
        Ok(self
            .results
            .lock()
            .unwrap()
            .get_mut(collection)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }
}

pub fn plot_context(store: Arc<FixtureStore>) -> PlotContext {
    PlotContext::new(store, CurrencyConverter::default(), Config::for_testing())
}

pub fn services(store: Arc<FixtureStore>) -> Services {
    Services::new(store, Config::for_testing(), CurrencyConverter::default())
}

/// Services with the result cache enabled.
pub fn caching_services(store: Arc<FixtureStore>) -> Services {
    let config = Config {
        cache_ttl: Duration::from_secs(60),
        cache_max_size: 100,
        ..Config::for_testing()
    };
    Services::new(store, config, CurrencyConverter::default())
}

pub fn institution(id: &str, name: &str) -> Document {
    doc! {
        "_id": id,
        "names": [{"name": name, "lang": "es", "source": "ror"}],
        "types": [{"source": "ror", "type": "Education"}],
        "addresses": [{"country": "Colombia", "country_code": "CO", "city": "Medellín"}],
    }
}

pub fn faculty(id: &str, name: &str) -> Document {
    doc! {
        "_id": id,
        "names": [{"name": name, "lang": "es", "source": "staff"}],
        "types": [{"source": "staff", "type": "faculty"}],
    }
}

pub fn group(id: &str, name: &str, institution_id: &str) -> Document {
    doc! {
        "_id": id,
        "names": [{"name": name, "lang": "es", "source": "minciencias"}],
        "types": [{"source": "minciencias", "type": "group"}],
        "relations": [
            {"id": institution_id, "name": "Universidad de Antioquia", "types": [{"source": "ror", "type": "Education"}]},
        ],
    }
}

pub fn person(id: &str, full_name: &str) -> Document {
    doc! { "_id": id, "full_name": full_name }
}

pub fn work(id: &str, title: &str, year: i32, citations: i64) -> Document {
    doc! {
        "_id": id,
        "titles": [{"title": title, "lang": "en", "source": "openalex"}],
        "types": [{"source": "openalex", "type": "article"}],
        "year_published": year,
        "citations_count": [{"source": "openalex", "count": citations}],
        "authors": [{"id": "p1", "full_name": "Ana Pérez", "affiliations": []}],
        "source": {"id": "s1", "name": "Revista Colombiana"},
        "external_ids": [{"source": "doi", "id": format!("10.1000/{id}")}],
        "open_access": {"is_open_access": true, "open_access_status": "gold"},
    }
}
