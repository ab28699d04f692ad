//! Co-authorship network construction and pruning.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

/// Participants beyond this count in a single work are ignored; large
/// consortium papers would otherwise dominate every degree.
pub const MAX_PARTICIPANTS_PER_WORK: usize = 100;

const NODE_SIZE_MIN: f64 = 10.0;
const NODE_SIZE_MAX: f64 = 50.0;
const EDGE_SIZE_MIN: f64 = 1.0;
const EDGE_SIZE_MAX: f64 = 10.0;

/// Undirected graph weighted by the number of shared works.
#[derive(Debug, Clone, Default)]
pub struct CoauthorshipNetwork {
    labels: HashMap<String, String>,
    weights: BTreeMap<(String, String), i64>,
}

/// Graph node ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkNode {
    pub id: String,
    pub label: String,
    /// Weighted degree within the pruned graph.
    pub degree: i64,
    pub size: f64,
}

/// Graph edge ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkEdge {
    pub source: String,
    pub target: String,
    pub coauthorships: i64,
    pub size: f64,
}

/// Pruned network.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkGraph {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

fn scale(value: i64, min: i64, max: i64, lo: f64, hi: f64) -> f64 {
    if max <= min {
        return lo;
    }
    lo + (hi - lo) * (value - min) as f64 / (max - min) as f64
}

fn edge_key(a: &str, b: &str) -> (String, String) {
    if a <= b { (a.to_string(), b.to_string()) } else { (b.to_string(), a.to_string()) }
}

impl CoauthorshipNetwork {
    /// Empty network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the `(id, label)` participants of one work.
    ///
    /// Repeated ids within a work count once; every pair gains one
    /// co-authorship.
    pub fn add_work(&mut self, participants: &[(String, String)]) {
        let mut ids = BTreeSet::new();
        for (id, label) in participants.iter().take(MAX_PARTICIPANTS_PER_WORK) {
            if id.is_empty() {
                continue;
            }
            self.labels
                .entry(id.clone())
                .and_modify(|current| {
                    if current.is_empty() {
                        current.clone_from(label);
                    }
                })
                .or_insert_with(|| label.clone());
            ids.insert(id.as_str());
        }
        let ids: Vec<&str> = ids.into_iter().collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                *self.weights.entry(edge_key(a, b)).or_insert(0) += 1;
            }
        }
    }

    /// Number of distinct participants.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of distinct pairs.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.weights.len()
    }

    fn degrees<'a>(edges: impl Iterator<Item = (&'a (String, String), &'a i64)>) -> HashMap<&'a str, i64> {
        let mut degrees = HashMap::new();
        for ((a, b), w) in edges {
            *degrees.entry(a.as_str()).or_insert(0) += w;
            *degrees.entry(b.as_str()).or_insert(0) += w;
        }
        degrees
    }

    /// Keep `keep` (when present) and the highest weighted-degree nodes up to
    /// `max_nodes`, ties broken by id. Edges touching dropped nodes are
    /// removed and degrees recomputed over what remains.
    #[must_use]
    pub fn prune(&self, keep: Option<&str>, max_nodes: usize) -> NetworkGraph {
        if max_nodes == 0 {
            return NetworkGraph::default();
        }
        let full = Self::degrees(self.weights.iter());
        let mut ranked: Vec<(&str, i64)> = self
            .labels
            .keys()
            .map(|id| (id.as_str(), full.get(id.as_str()).copied().unwrap_or(0)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut kept: BTreeSet<&str> = BTreeSet::new();
        if let Some(pinned) = keep.filter(|k| self.labels.contains_key(*k)) {
            kept.insert(pinned);
        }
        for &(id, _) in &ranked {
            if kept.len() >= max_nodes {
                break;
            }
            kept.insert(id);
        }

        let kept_edges: Vec<(&(String, String), &i64)> = self
            .weights
            .iter()
            .filter(|((a, b), _)| kept.contains(a.as_str()) && kept.contains(b.as_str()))
            .collect();
        let degrees = Self::degrees(kept_edges.iter().copied());

        let node_degree = |id: &str| degrees.get(id).copied().unwrap_or(0);
        let (min_d, max_d) = kept
            .iter()
            .map(|id| node_degree(*id))
            .fold((i64::MAX, i64::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)));

        let mut nodes: Vec<NetworkNode> = kept
            .iter()
            .map(|id| {
                let degree = node_degree(*id);
                NetworkNode {
                    id: (*id).to_string(),
                    label: self.labels.get(*id).cloned().unwrap_or_default(),
                    degree,
                    size: scale(degree, min_d, max_d, NODE_SIZE_MIN, NODE_SIZE_MAX),
                }
            })
            .collect();
        nodes.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.id.cmp(&b.id)));

        let min_w = kept_edges.iter().map(|(_, w)| **w).min().unwrap_or(0);
        let max_w = kept_edges.iter().map(|(_, w)| **w).max().unwrap_or(0);
        let mut edges: Vec<NetworkEdge> = kept_edges
            .into_iter()
            .map(|((a, b), w)| NetworkEdge {
                source: a.clone(),
                target: b.clone(),
                coauthorships: *w,
                size: scale(*w, min_w, max_w, EDGE_SIZE_MIN, EDGE_SIZE_MAX),
            })
            .collect();
        edges.sort_by(|a, b| {
            b.coauthorships
                .cmp(&a.coauthorships)
                .then_with(|| a.source.cmp(&b.source))
                .then_with(|| a.target.cmp(&b.target))
        });

        NetworkGraph { nodes, edges }
    }
}
