//! Affiliation model: institutions, faculties, departments and research groups.

use serde::{Deserialize, Serialize};

use super::common::{ExternalId, Name, TypeTag, Updated, de_id, de_opt_f64, de_opt_i32, select_name};
use super::enums::EntityKind;

/// An affiliation of any level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Affiliation {
    /// Document ID.
    #[serde(rename = "_id", deserialize_with = "de_id")]
    pub id: String,

    /// Localized names.
    pub names: Vec<Name>,

    /// Types per provenance ("Education", "faculty", "group", ...).
    pub types: Vec<TypeTag>,

    /// Postal and geographic addresses.
    pub addresses: Vec<Address>,

    /// Parent and child affiliations.
    pub relations: Vec<Relation>,

    /// External identifiers (ROR, GRID, Minciencias, ...).
    pub external_ids: Vec<ExternalId>,

    /// Year the affiliation was established.
    #[serde(deserialize_with = "de_opt_i32")]
    pub year_established: Option<i32>,

    /// Provenances that contributed to this record.
    pub updated: Vec<Updated>,
}

impl Affiliation {
    /// Display name in the requested language.
    #[must_use]
    pub fn name(&self, lang: &str) -> &str {
        select_name(&self.names, lang).unwrap_or("Unknown")
    }

    /// Entity kind derived from the type tags.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        EntityKind::from_affiliation_types(&self.types)
    }

    /// Related affiliations of the given kind.
    pub fn relations_of(&self, kind: EntityKind) -> impl Iterator<Item = &Relation> {
        self.relations.iter().filter(move |r| EntityKind::from_affiliation_types(&r.types) == kind)
    }
}

/// Address of an affiliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub country: String,
    pub country_code: String,
    pub city: String,
    #[serde(deserialize_with = "de_opt_f64")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub lng: Option<f64>,
}

/// Relation to another affiliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Relation {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub types: Vec<TypeTag>,
}
