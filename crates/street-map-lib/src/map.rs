//! StreetMap - top-level owner of the graph, name index and tile tree
//!
//! The three structures are built once (see [`MapBuilder`](crate::MapBuilder))
//! and never mutated afterwards, so a `StreetMap` can be shared behind an
//! `Arc` and queried from any number of threads without locking.

use crate::names::{LocationRecord, NameIndex, clean_name};
use crate::quadtree::{MAX_SUPPORTED_DEPTH, QueryBox, RasterResult, TileQuadtree};
use crate::router::Router;
use crate::{MapError, Result, SpatialGraph, VertexId, utils};
use geo::Rect;
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the street map
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Rectangle covered by the root tile, in longitude/latitude
    pub root_bounds: Rect<f64>,
    /// Depth of the deepest pre-rendered tiles (root = 0)
    pub max_depth: u32,
    /// Width in pixels of every tile image
    pub tile_size: u32,
    /// Prefix prepended to tile identifiers when naming image files
    pub image_prefix: String,
    /// Image file extension, without the dot
    pub image_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Berkeley, CA
            root_bounds: utils::rect_from_corners(
                -122.2998046875,
                37.892195547244356,
                -122.2119140625,
                37.82280243352756,
            ),
            max_depth: 7,
            tile_size: 256,
            image_prefix: "img/".to_string(),
            image_extension: "png".to_string(),
        }
    }
}

impl Config {
    /// Check the settings before building anything from them
    ///
    /// `Rect` normalizes its corners, so only zero-area bounds are rejected.
    pub fn validate(&self) -> Result<()> {
        if self.root_bounds.width() <= 0.0 || self.root_bounds.height() <= 0.0 {
            return Err(MapError::InvalidBounds(format!(
                "root bounds {:?} have no area",
                self.root_bounds
            )));
        }
        if self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(MapError::InvalidConfig(format!(
                "max depth {} exceeds {}",
                self.max_depth, MAX_SUPPORTED_DEPTH
            )));
        }
        if self.tile_size == 0 {
            return Err(MapError::InvalidConfig("tile size must be positive".into()));
        }
        Ok(())
    }
}

/// Tile query parameters from the serving layer
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RasterRequest {
    pub ul_lon: f64,
    pub ul_lat: f64,
    pub lr_lon: f64,
    pub lr_lat: f64,
    /// Viewport width in pixels
    pub width: f64,
    /// Viewport height in pixels; the level of detail depends on width only
    pub height: f64,
}

/// Route query parameters from the serving layer
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteRequest {
    pub start_lon: f64,
    pub start_lat: f64,
    pub dest_lon: f64,
    pub dest_lat: f64,
}

/// Summary of a built map
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapInfo {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub place_count: usize,
    pub tile_count: usize,
    pub max_depth: u32,
}

/// Read-only street map answering raster, name and route queries
#[derive(Debug, Clone)]
pub struct StreetMap {
    config: Config,
    graph: SpatialGraph,
    names: NameIndex,
    tiles: TileQuadtree,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl StreetMap {
    /// Assemble a map from an already cleaned graph and a name index
    pub fn new(config: Config, graph: SpatialGraph, names: NameIndex) -> Result<Self> {
        config.validate()?;
        let tiles = TileQuadtree::new(config.root_bounds, config.max_depth, config.tile_size)?;
        Ok(Self {
            config,
            graph,
            names,
            tiles,
        })
    }

    /// Tile grid covering the requested box at the viewport's level of detail
    pub fn raster(&self, request: &RasterRequest) -> RasterResult {
        #[cfg(feature = "profiling")]
        profiling::scope!("map::raster");

        let query = QueryBox::new(
            request.ul_lon,
            request.ul_lat,
            request.lr_lon,
            request.lr_lat,
        );
        self.tiles.select_tiles(query, request.width)
    }

    /// Image file names for a raster result, in grid order
    pub fn tile_file_names(&self, result: &RasterResult) -> Vec<Vec<String>> {
        result
            .render_grid
            .iter()
            .flatten()
            .map(|row| {
                row.iter()
                    .map(|id| id.file_name(&self.config.image_prefix, &self.config.image_extension))
                    .collect()
            })
            .collect()
    }

    /// Autocomplete: display names of places whose cleaned name starts with the cleaned `prefix`
    pub fn search(&self, prefix: &str) -> Vec<String> {
        self.names.prefix_search(&clean_name(prefix))
    }

    /// All places whose cleaned name equals the cleaned `name`
    pub fn locate(&self, name: &str) -> Vec<LocationRecord> {
        self.names
            .exact_lookup(&clean_name(name))
            .map(<[LocationRecord]>::to_vec)
            .unwrap_or_default()
    }

    /// Vertex ids of the shortest route, empty when there is none
    pub fn route(&self, request: &RouteRequest) -> Vec<VertexId> {
        #[cfg(feature = "profiling")]
        profiling::scope!("map::route");

        Router::new(&self.graph)
            .route(
                request.start_lon,
                request.start_lat,
                request.dest_lon,
                request.dest_lat,
            )
            .path
    }

    /// Answer a batch of route queries in parallel
    ///
    /// Results are in the same order as `requests`.
    pub fn routes_parallel(&self, requests: &[RouteRequest]) -> Vec<Vec<VertexId>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("map::routes_parallel");

        requests.par_iter().map(|request| self.route(request)).collect()
    }

    pub fn info(&self) -> MapInfo {
        MapInfo {
            vertex_count: self.graph.len(),
            edge_count: self.graph.edge_count(),
            place_count: self.names.len(),
            tile_count: self.tiles.tile_count(),
            max_depth: self.tiles.max_depth(),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn graph(&self) -> &SpatialGraph {
        &self.graph
    }

    #[inline]
    pub fn names(&self) -> &NameIndex {
        &self.names
    }

    #[inline]
    pub fn tiles(&self) -> &TileQuadtree {
        &self.tiles
    }
}
