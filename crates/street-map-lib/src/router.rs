//! Shortest-path routing over the road graph
//!
//! A* search between the graph vertices nearest to two positions, using the
//! straight-line distance to the destination as heuristic. Edge weights use
//! the same Euclidean lon/lat metric, so the heuristic never overestimates and
//! the first time the destination is popped its distance is optimal.
//!
//! All search state (best distances, predecessors, frontier) is local to one
//! call, so any number of searches can run against a shared graph.

use crate::{SpatialGraph, VertexId};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A computed route
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Route {
    /// Vertex ids from start to destination inclusive; empty when unreachable
    pub path: Vec<VertexId>,
    /// Total edge length of `path`
    pub distance: f64,
}

impl Route {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Frontier entry: (priority, vertex, distance from start at insertion)
///
/// Ordered by priority, then by vertex id so that ties resolve deterministically.
type FrontierEntry = Reverse<(OrderedFloat<f64>, VertexId, OrderedFloat<f64>)>;

/// A* router bound to a graph
#[derive(Debug, Clone, Copy)]
pub struct Router<'a> {
    graph: &'a SpatialGraph,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<'a> Router<'a> {
    pub fn new(graph: &'a SpatialGraph) -> Self {
        Self { graph }
    }

    /// Route between the vertices nearest to the two positions
    pub fn route(&self, start_lon: f64, start_lat: f64, dest_lon: f64, dest_lat: f64) -> Route {
        let (Some(start), Some(dest)) = (
            self.graph.nearest_vertex(start_lon, start_lat),
            self.graph.nearest_vertex(dest_lon, dest_lat),
        ) else {
            tracing::debug!("Routing on an empty graph");
            return Route::default();
        };

        self.route_between(start, dest)
    }

    /// Route between two known vertices
    ///
    /// Returns an empty route if either vertex is unknown or the destination
    /// cannot be reached from the start.
    pub fn route_between(&self, start: VertexId, dest: VertexId) -> Route {
        let Some(dest_location) = self.graph.vertex(dest).map(|v| v.location()) else {
            return Route::default();
        };
        if !self.graph.contains(start) {
            return Route::default();
        }

        let heuristic = |id: VertexId| {
            self.graph
                .vertex(id)
                .map(|v| crate::utils::planar_distance(v.location(), dest_location))
                .unwrap_or(0.0)
        };

        let mut best: HashMap<VertexId, f64> = HashMap::new();
        let mut previous: HashMap<VertexId, VertexId> = HashMap::new();
        let mut frontier: BinaryHeap<FrontierEntry> = BinaryHeap::new();

        best.insert(start, 0.0);
        frontier.push(Reverse((
            OrderedFloat(heuristic(start)),
            start,
            OrderedFloat(0.0),
        )));

        let mut expanded = 0usize;
        while let Some(Reverse((_, current, OrderedFloat(distance)))) = frontier.pop() {
            // Lazy deletion: a newer entry with a better distance superseded this one
            if best.get(&current).is_some_and(|&d| d < distance) {
                continue;
            }
            if current == dest {
                tracing::debug!(
                    "Route {} -> {} found after expanding {} vertices",
                    start,
                    dest,
                    expanded
                );
                return Route {
                    path: reconstruct(&previous, start, dest),
                    distance,
                };
            }
            expanded += 1;

            let Some(neighbors) = self.graph.neighbors(current) else {
                continue;
            };
            for &next in neighbors {
                let Some(edge) = self.graph.distance(current, next) else {
                    continue;
                };
                let candidate = distance + edge;
                if best.get(&next).is_none_or(|&d| candidate < d) {
                    best.insert(next, candidate);
                    previous.insert(next, current);
                    frontier.push(Reverse((
                        OrderedFloat(candidate + heuristic(next)),
                        next,
                        OrderedFloat(candidate),
                    )));
                }
            }
        }

        tracing::debug!("No route from {} to {}", start, dest);
        Route::default()
    }
}

/// Walk predecessors back from `dest`, returning start..=dest
fn reconstruct(
    previous: &HashMap<VertexId, VertexId>,
    start: VertexId,
    dest: VertexId,
) -> Vec<VertexId> {
    let mut path = vec![dest];
    let mut current = dest;
    while current != start {
        match previous.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Shortest path between the vertices nearest to the two positions
///
/// Returns vertex ids from start to destination inclusive, or an empty vector
/// when the destination is unreachable or the graph is empty.
pub fn shortest_path(
    graph: &SpatialGraph,
    start_lon: f64,
    start_lat: f64,
    dest_lon: f64,
    dest_lat: f64,
) -> Vec<VertexId> {
    Router::new(graph)
        .route(start_lon, start_lat, dest_lon, dest_lat)
        .path
}
