//! Road network graph
//!
//! Vertices are road intersections and way nodes; edges are undirected road
//! pieces stored as symmetric adjacency lists. The graph is filled once during
//! ingestion, pruned by [`SpatialGraph::cleanup`], and is read-only afterwards.

use crate::utils;
use geo::Point;
use smallvec::SmallVec;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a graph vertex, stable for the lifetime of the map
pub type VertexId = u64;

/// Most road vertices have at most four neighbours
type Neighbors = SmallVec<[VertexId; 4]>;

/// A single road vertex
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    id: VertexId,
    location: Point<f64>,
    name: Option<String>,
}

impl Vertex {
    /// Create an unnamed vertex
    pub fn new(id: VertexId, lon: f64, lat: f64) -> Self {
        Self {
            id,
            location: Point::new(lon, lat),
            name: None,
        }
    }

    /// Attach a display name to the vertex
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn id(&self) -> VertexId {
        self.id
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.location.x()
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    /// Position as a `geo::Point` (x = longitude, y = latitude)
    #[inline]
    pub fn location(&self) -> Point<f64> {
        self.location
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Weighted planar graph of the road network
#[derive(Debug, Clone, Default)]
pub struct SpatialGraph {
    vertices: HashMap<VertexId, Vertex>,
    adjacency: HashMap<VertexId, Neighbors>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SpatialGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex keyed by its id. The first insertion of an id wins.
    pub fn add_vertex(&mut self, vertex: Vertex) {
        if self.vertices.contains_key(&vertex.id) {
            return;
        }
        self.adjacency.insert(vertex.id, Neighbors::new());
        self.vertices.insert(vertex.id, vertex);
    }

    /// Add a symmetric edge between every consecutive pair of `ids`
    ///
    /// Pairs referencing a vertex that was never added are skipped, as are
    /// self-loops and edges that already exist.
    pub fn add_edge_chain(&mut self, ids: &[VertexId]) {
        for pair in ids.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if !self.vertices.contains_key(&a) || !self.vertices.contains_key(&b) {
                tracing::debug!("Skipping edge {} -> {}: undeclared endpoint", a, b);
                continue;
            }
            if a == b {
                continue;
            }
            self.link(a, b);
            self.link(b, a);
        }
    }

    fn link(&mut self, from: VertexId, to: VertexId) {
        if let Some(neighbors) = self.adjacency.get_mut(&from)
            && !neighbors.contains(&to)
        {
            neighbors.push(to);
        }
    }

    /// Remove every vertex that has no neighbour. Returns how many were removed.
    ///
    /// Must run once after all vertices and edges are loaded and before any
    /// query. Vertices with a single neighbour are dead-end roads and stay.
    pub fn cleanup(&mut self) -> usize {
        let isolated: Vec<VertexId> = self
            .adjacency
            .iter()
            .filter(|(_, neighbors)| neighbors.is_empty())
            .map(|(&id, _)| id)
            .collect();

        for id in &isolated {
            self.adjacency.remove(id);
            self.vertices.remove(id);
        }

        tracing::debug!(
            "Graph cleanup removed {} isolated vertices, {} remain",
            isolated.len(),
            self.vertices.len()
        );
        isolated.len()
    }

    /// Vertex closest to the given position, by Euclidean lon/lat distance
    ///
    /// Linear scan over all vertices. Ties resolve to whichever vertex the
    /// scan meets first, which is unspecified. `None` on an empty graph.
    pub fn nearest_vertex(&self, lon: f64, lat: f64) -> Option<VertexId> {
        let target = Point::new(lon, lat);
        let mut best: Option<(VertexId, f64)> = None;

        for vertex in self.vertices.values() {
            let dist = utils::planar_distance(vertex.location, target);
            if best.is_none_or(|(_, best_dist)| dist < best_dist) {
                best = Some((vertex.id, dist));
            }
        }

        best.map(|(id, _)| id)
    }

    /// Euclidean distance between two vertices, `None` if either is unknown
    pub fn distance(&self, a: VertexId, b: VertexId) -> Option<f64> {
        let a = self.vertices.get(&a)?;
        let b = self.vertices.get(&b)?;
        Some(utils::planar_distance(a.location, b.location))
    }

    /// Ids adjacent to `id`, or `None` if the vertex does not exist
    #[inline]
    pub fn neighbors(&self, id: VertexId) -> Option<&[VertexId]> {
        self.adjacency.get(&id).map(|n| n.as_slice())
    }

    #[inline]
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    /// Iterate over all vertex ids in unspecified order
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|n| n.len()).sum::<usize>() / 2
    }

    /// Total length of a path given as consecutive vertex ids
    ///
    /// Returns `None` if any vertex is unknown or two consecutive vertices are
    /// not adjacent. An empty or single-vertex path has length zero.
    pub fn path_distance(&self, path: &[VertexId]) -> Option<f64> {
        path.windows(2).try_fold(0.0, |total, pair| {
            if !self.neighbors(pair[0])?.contains(&pair[1]) {
                return None;
            }
            Some(total + self.distance(pair[0], pair[1])?)
        })
    }
}
