//! Map ingestion
//!
//! [`MapBuilder`] is the single-writer ingestion boundary: a map source feeds
//! it vertices, ways and named locations, and [`MapBuilder::build`] finishes
//! the graph (cleanup included) before handing out the read-only
//! [`StreetMap`]. [`MapDocument`] is the JSON map format shipped with the
//! workspace.

use crate::names::{LocationRecord, NameIndex, clean_name};
use crate::{Config, MapError, Result, SpatialGraph, StreetMap, Vertex, VertexId};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// A vertex entry of a [`MapDocument`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: VertexId,
    pub lon: f64,
    pub lat: f64,
    /// Named nodes are also indexed as places
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A named location pointing at a vertex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceEntry {
    pub name: String,
    pub node: VertexId,
}

/// JSON map document
///
/// ```json
/// {
///   "nodes": [{ "id": 1, "lon": -122.25, "lat": 37.87, "name": "Top Dog" }],
///   "ways": [[1, 2, 3]],
///   "places": [{ "name": "Cafe", "node": 2 }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub ways: Vec<Vec<VertexId>>,
    #[serde(default)]
    pub places: Vec<PlaceEntry>,
}

impl MapDocument {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}

/// Collects ingested map data and builds a [`StreetMap`]
#[derive(Debug, Clone, Default)]
pub struct MapBuilder {
    config: Config,
    graph: SpatialGraph,
    names: NameIndex,
    skipped_places: usize,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl MapBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Builder pre-filled with every node, way and place of `document`
    pub fn from_document(config: Config, document: &MapDocument) -> Self {
        #[cfg(feature = "profiling")]
        profiling::scope!("ingest::from_document");

        let mut builder = Self::new(config);
        for node in &document.nodes {
            builder.provide_vertex(node.id, node.lon, node.lat);
        }
        for way in &document.ways {
            builder.provide_way(way);
        }
        for node in &document.nodes {
            if let Some(name) = &node.name {
                builder.provide_named_location(name, node.id);
            }
        }
        for place in &document.places {
            builder.provide_named_location(&place.name, place.node);
        }
        builder
    }

    /// Declare a vertex; later declarations of the same id are ignored
    pub fn provide_vertex(&mut self, id: VertexId, lon: f64, lat: f64) -> &mut Self {
        self.graph.add_vertex(Vertex::new(id, lon, lat));
        self
    }

    /// Declare a way as an ordered vertex sequence; consecutive vertices become edges
    pub fn provide_way(&mut self, ids: &[VertexId]) -> &mut Self {
        self.graph.add_edge_chain(ids);
        self
    }

    /// Index `raw_name` as a place at the position of `vertex`
    ///
    /// The name is cleaned into its search key here. Places referring to an
    /// undeclared vertex, or whose name cleans to nothing, are skipped.
    pub fn provide_named_location(&mut self, raw_name: &str, vertex: VertexId) -> &mut Self {
        let Some(v) = self.graph.vertex(vertex) else {
            tracing::warn!("Skipping place {:?}: unknown vertex {}", raw_name, vertex);
            self.skipped_places += 1;
            return self;
        };

        let key = clean_name(raw_name);
        if key.trim().is_empty() {
            tracing::debug!("Skipping place {:?}: empty search key", raw_name);
            self.skipped_places += 1;
            return self;
        }

        let record = LocationRecord {
            id: v.id(),
            lon: v.lon(),
            lat: v.lat(),
            name: raw_name.to_string(),
        };
        self.names.insert(&key, raw_name, record);
        self
    }

    /// Finish ingestion: prune isolated vertices and build the tile tree
    ///
    /// Fails with [`MapError::EmptyMap`] when nothing routable or searchable
    /// was ingested.
    pub fn build(self) -> Result<StreetMap> {
        #[cfg(feature = "profiling")]
        profiling::scope!("ingest::build");

        let MapBuilder {
            config,
            mut graph,
            names,
            skipped_places,
        } = self;

        let removed = graph.cleanup();
        if graph.is_empty() && names.is_empty() {
            return Err(MapError::EmptyMap);
        }
        tracing::info!(
            "Map built: {} vertices ({} isolated removed), {} edges, {} place keys ({} skipped)",
            graph.len(),
            removed,
            graph.edge_count(),
            names.len(),
            skipped_places
        );

        StreetMap::new(config, graph, names)
    }
}
