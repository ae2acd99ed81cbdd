//! Street Map Library - Spatial Queries over a Static City Map
//!
//! This library answers the three queries behind a small map web application:
//! which pre-rendered tiles to draw for a viewport, which place names match a
//! partially typed query, and which roads form the shortest route between two
//! points. Everything is built once from ingested map data and is read-only
//! afterwards.
//!
//! # Architecture
//!
//! - **[`SpatialGraph`]**: Road vertices with symmetric adjacency, nearest-vertex lookup
//! - **[`NameIndex`]**: Sparse prefix trie over cleaned place names
//! - **[`TileQuadtree`]**: Fixed-depth tile tree with level-of-detail selection
//! - **[`Router`]**: A* search with a straight-line heuristic
//! - **[`MapBuilder`]** / **[`StreetMap`]**: Ingestion boundary and query facade
//!
//! # Coordinates
//!
//! Positions are plain longitude/latitude degrees and distances are Euclidean
//! in that space. This is accurate enough for a single city and keeps the
//! routing heuristic admissible, but it is not a geodesic metric.
//!
//! # Performance Characteristics
//!
//! - **Tile query**: O(K log K) for K selected tiles, bounded by the fixed depth
//! - **Name query**: O(P + M) for prefix length P and M matching nodes
//! - **Route query**: O(V) nearest-vertex scan + O(E log V) A*

mod graph;
mod ingest;
mod map;
pub mod names;
pub mod quadtree;
mod router;
pub mod utils;

// Public API exports
pub use graph::{SpatialGraph, Vertex, VertexId};
pub use ingest::{MapBuilder, MapDocument, NodeEntry, PlaceEntry};
pub use map::{Config, MapInfo, RasterRequest, RouteRequest, StreetMap};
pub use names::{LocationRecord, NameIndex, clean_name};
pub use quadtree::{QueryBox, RasterResult, Tile, TileId, TileQuadtree};
pub use router::{Route, Router, shortest_path};

/// Error types for map loading and configuration
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Map document error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty map")]
    EmptyMap,
}

pub type Result<T> = std::result::Result<T, MapError>;
