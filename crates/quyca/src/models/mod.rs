//! Data models for KAHI documents and request inputs.
//!
//! All document models use `#[serde(default)]` so partially populated
//! records from any provenance decode without errors.

mod affiliation;
pub mod common;
mod enums;
mod inputs;
mod person;
mod product;
mod source;
mod work;

pub use affiliation::{Address, Affiliation, Relation};
pub use common::{ExternalId, Name, Rank, Title, TypeTag, Updated, select_name, select_title, select_type};
pub use enums::{EntityKind, ExportFormat, Resource, SortOrder};
pub use inputs::{Pagination, ProductsParams, SearchParams, Target, WorkFilters};
pub use person::{Person, PersonAffiliation, birth_year};
pub use product::CatalogItem;
pub use source::{Apc, Publisher, QUARTILE_SOURCE, Source, SourceRank, quartile_at};
pub use work::{
    AffiliationRef, BibliographicInfo, CitationCount, OpenAccess, SourceRef, Subject, SubjectGroup, Work, WorkAuthor,
    YearCitations,
};
