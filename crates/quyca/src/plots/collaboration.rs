//! Co-authorship maps and networks.

use bson::Document;
use serde::Serialize;
use serde_json::json;

use super::{Plot, PlotContext, decode_list};
use crate::config::{DISPLAY_LANG, collections};
use crate::error::ServiceResult;
use crate::models::{Affiliation, EntityKind, Target, TypeTag, WorkFilters};
use crate::pipeline::plots::{self as pipelines, is_sub_unit_type};
use crate::stats::{CoauthorshipNetwork, round2};
use crate::store::{DocExt, get_by_id};

/// Collaboration count of one place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceCount {
    /// ISO code for countries, omitted for cities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub name: String,
    pub value: i64,
    /// `ln(1 + value)`, used for the color scale.
    pub log_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl PlaceCount {
    fn new(code: Option<String>, name: String, value: i64) -> Self {
        Self { code, name, value, log_value: log_scale(value), lat: None, lng: None }
    }
}

/// Natural log of `1 + value`, rounded to two decimals.
#[must_use]
pub fn log_scale(value: i64) -> f64 {
    round2((value.max(0) as f64).ln_1p())
}

fn sort_places(places: &mut [PlaceCount]) {
    places.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
}

fn supports_collaboration(kind: EntityKind) -> bool {
    kind.is_affiliation() || kind == EntityKind::Person
}

/// The target as it appears in co-authorship data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Home {
    /// Network node label of the target.
    label: String,
    /// Affiliations standing for the target: itself and, for sub-units, the
    /// institutions it belongs to.
    affiliations: Vec<String>,
}

impl Home {
    async fn resolve(ctx: &PlotContext, target: &Target) -> ServiceResult<Self> {
        match target.kind {
            EntityKind::Person | EntityKind::Source => Ok(Self::default()),
            EntityKind::Institution => {
                Ok(Self { label: String::new(), affiliations: vec![target.id.clone()] })
            }
            EntityKind::Faculty | EntityKind::Department | EntityKind::Group => {
                let affiliation: Affiliation =
                    get_by_id(ctx.store.as_ref(), collections::AFFILIATIONS, &target.id).await?;
                Ok(Self::for_sub_unit(&target.id, &affiliation))
            }
        }
    }

    fn for_sub_unit(id: &str, affiliation: &Affiliation) -> Self {
        let mut affiliations = vec![id.to_string()];
        affiliations.extend(
            affiliation
                .relations_of(EntityKind::Institution)
                .map(|r| r.id.clone())
                .filter(|parent| !parent.is_empty() && parent != id),
        );
        Self { label: affiliation.name(DISPLAY_LANG).to_string(), affiliations }
    }
}

/// Collaborating institutions per country.
pub struct WorldMapPlot;

#[async_trait::async_trait]
impl Plot for WorldMapPlot {
    fn name(&self) -> &'static str {
        "collaboration_worldmap"
    }

    fn description(&self) -> &'static str {
        "Collaborations per country of co-authoring institutions"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        supports_collaboration(kind)
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let home = Home::resolve(ctx, target).await?;
        let docs = ctx
            .works(pipelines::collaboration_countries(target, filters, &home.affiliations))
            .await?;

        let mut places: Vec<PlaceCount> = docs
            .iter()
            .filter_map(|doc| {
                let code = doc.text("_id")?.to_ascii_uppercase();
                let name = doc.text("country").map_or_else(|| code.clone(), str::to_string);
                Some(PlaceCount::new(Some(code), name, doc.int("count")))
            })
            .collect();
        sort_places(&mut places);
        let total: i64 = places.iter().map(|p| p.value).sum();

        Ok(json!({ "plot": places, "total": total }))
    }
}

/// Collaborating institutions per city of the home country.
pub struct CityMapPlot;

#[async_trait::async_trait]
impl Plot for CityMapPlot {
    fn name(&self) -> &'static str {
        "collaboration_citymap"
    }

    fn description(&self) -> &'static str {
        "Collaborations per city of the home country"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        supports_collaboration(kind)
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let country = ctx.config.home_country.as_str();
        let home = Home::resolve(ctx, target).await?;
        let docs = ctx
            .works(pipelines::collaboration_cities(target, filters, &home.affiliations, country))
            .await?;

        let mut places: Vec<PlaceCount> = docs
            .iter()
            .filter_map(|doc| {
                let mut place = PlaceCount::new(None, doc.text("_id")?.to_string(), doc.int("count"));
                place.lat = doc.contains_key("lat").then(|| doc.float("lat"));
                place.lng = doc.contains_key("lng").then(|| doc.float("lng"));
                Some(place)
            })
            .collect();
        sort_places(&mut places);
        let total: i64 = places.iter().map(|p| p.value).sum();

        Ok(json!({ "plot": places, "total": total, "country": country }))
    }
}

/// Participants of one work: co-authors for persons, institutions otherwise.
///
/// For affiliation targets the target joins every work and the affiliations
/// standing for it are folded into that single node.
fn participants(work: &Document, target: &Target, home: &Home) -> Vec<(String, String)> {
    let authors = work.list("authors").iter().filter_map(|a| a.as_document());
    if target.kind == EntityKind::Person {
        return authors
            .filter_map(|author| {
                let id = author.id_string("id")?;
                Some((id, author.text("full_name").unwrap_or_default().to_string()))
            })
            .collect();
    }
    let mut found: Vec<(String, String)> = authors
        .flat_map(|author| author.list("affiliations").iter().filter_map(|a| a.as_document()))
        .filter(|affiliation| {
            let types: Vec<TypeTag> = decode_list(affiliation.list("types"));
            !types.iter().any(|t| is_sub_unit_type(&t.r#type))
        })
        .filter_map(|affiliation| {
            let id = affiliation.id_string("id")?;
            let name = affiliation.text("name").unwrap_or_default().to_string();
            if id == target.id {
                return Some((id, name));
            }
            (!home.affiliations.contains(&id)).then_some((id, name))
        })
        .collect();
    if target.kind.is_affiliation() {
        found.insert(0, (target.id.clone(), home.label.clone()));
    }
    found
}

/// Co-authorship network around the target.
pub struct NetworkPlot;

#[async_trait::async_trait]
impl Plot for NetworkPlot {
    fn name(&self) -> &'static str {
        "collaboration_network"
    }

    fn description(&self) -> &'static str {
        "Co-authorship network of institutions or researchers"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        supports_collaboration(kind)
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let limit = ctx.config.network_work_limit;
        let home = Home::resolve(ctx, target).await?;
        let works = ctx
            .works(pipelines::collaboration_participants(target, filters, limit))
            .await?;

        let mut network = CoauthorshipNetwork::new();
        for work in &works {
            network.add_work(&participants(work, target, &home));
        }
        tracing::debug!(
            works = works.len(),
            nodes = network.node_count(),
            edges = network.edge_count(),
            "Built co-authorship network"
        );

        let graph = network.prune(Some(target.id.as_str()), ctx.config.network_max_nodes);
        Ok(json!({
            "plot": graph,
            "works_scanned": works.len(),
            "truncated": i64::try_from(works.len()).unwrap_or(i64::MAX) >= limit,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_log_scale() {
        assert_eq!(log_scale(0), 0.0);
        assert_eq!(log_scale(-3), 0.0);
        assert!((log_scale(9) - 2.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_participants_for_person() {
        let work = doc! {
            "authors": [
                {"id": "p1", "full_name": "Ana"},
                {"id": "p2", "full_name": "Luis"},
                {"full_name": "No id"},
            ]
        };
        let target = Target::new(EntityKind::Person, "p1");
        let people = participants(&work, &target, &Home::default());
        assert_eq!(people, vec![("p1".to_string(), "Ana".to_string()), ("p2".to_string(), "Luis".to_string())]);
    }

    #[test]
    fn test_participants_skip_sub_units() {
        let work = doc! {
            "authors": [{
                "id": "p1",
                "affiliations": [
                    {"id": "udea", "name": "Universidad de Antioquia", "types": [{"source": "ror", "type": "Education"}]},
                    {"id": "fac", "name": "Facultad de Medicina", "types": [{"source": "staff", "type": "faculty"}]},
                ],
            }]
        };
        let target = Target::new(EntityKind::Institution, "udea");
        let home = Home { label: String::new(), affiliations: vec!["udea".to_string()] };
        let institutions = participants(&work, &target, &home);
        let ids: Vec<&str> = institutions.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["udea", "udea"]);
        assert_eq!(institutions[1].1, "Universidad de Antioquia");
    }

    #[test]
    fn test_sub_unit_stands_in_for_its_institution() {
        let affiliation: Affiliation = bson::from_document(doc! {
            "_id": "g1",
            "names": [{"name": "Grupo de Epidemiología", "lang": "es"}],
            "types": [{"source": "minciencias", "type": "Group"}],
            "relations": [
                {"id": "udea", "name": "Universidad de Antioquia", "types": [{"source": "ror", "type": "Education"}]},
                {"id": "f1", "name": "Facultad de Medicina", "types": [{"source": "staff", "type": "Faculty"}]},
            ],
        })
        .unwrap();
        let home = Home::for_sub_unit("g1", &affiliation);
        assert_eq!(home.affiliations, vec!["g1", "udea"]);
        assert_eq!(home.label, "Grupo de Epidemiología");

        let work = doc! {
            "authors": [{
                "id": "p1",
                "affiliations": [
                    {"id": "g1", "name": "Grupo de Epidemiología", "types": [{"source": "minciencias", "type": "Group"}]},
                    {"id": "udea", "name": "Universidad de Antioquia", "types": [{"source": "ror", "type": "Education"}]},
                    {"id": "unal", "name": "Universidad Nacional", "types": [{"source": "ror", "type": "Education"}]},
                ],
            }]
        };
        let target = Target::new(EntityKind::Group, "g1");
        let ids: Vec<String> = participants(&work, &target, &home).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["g1", "unal"]);
    }
}
