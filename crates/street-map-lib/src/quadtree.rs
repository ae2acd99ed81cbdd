//! Tile quadtree for level-of-detail raster queries
//!
//! The tree covers the map's root rectangle and is fully built to a fixed
//! depth at construction time. Every node is a pre-rendered tile whose
//! resolution (longitude per pixel) halves with each level. A query picks,
//! for every part of the query box, the coarsest tiles that are still finer
//! than what the viewport needs.

use crate::{MapError, Result, utils};
use geo::Rect;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Deepest level supported; the whole tree is kept in memory
pub const MAX_SUPPORTED_DEPTH: u32 = 10;

/// Position of a child inside its parent, numbered as in tile identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    NorthWest = 1,
    NorthEast = 2,
    SouthWest = 3,
    SouthEast = 4,
}

impl Quadrant {
    /// Traversal order, which is also west-to-east order within a row
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthWest,
        Quadrant::NorthEast,
        Quadrant::SouthWest,
        Quadrant::SouthEast,
    ];

    #[inline]
    pub fn digit(self) -> u64 {
        self as u64
    }
}

/// Image identifier of a tile
///
/// The root is `root`; every other tile is the decimal digit path from the
/// root, most significant digit first (e.g. `13` is the south-west child of
/// the north-west child of the root). Pre-rendered image sets are keyed by
/// this exact numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileId {
    Root,
    Path(u64),
}

impl TileId {
    /// Identifier of the child in `quadrant`
    #[inline]
    pub fn child(self, quadrant: Quadrant) -> TileId {
        let parent = match self {
            TileId::Root => 0,
            TileId::Path(index) => index,
        };
        TileId::Path(parent * 10 + quadrant.digit())
    }

    /// Image file name, e.g. `img/13.png` for prefix `img/` and extension `png`
    pub fn file_name(&self, prefix: &str, extension: &str) -> String {
        format!("{prefix}{self}.{extension}")
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileId::Root => f.write_str("root"),
            TileId::Path(index) => write!(f, "{index}"),
        }
    }
}

#[cfg(feature = "serde")]
impl Serialize for TileId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A rectangular map region backed by one pre-rendered image
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Tile {
    id: TileId,
    /// `min()` is the (upper-left lon, lower-right lat) corner
    bounds: Rect<f64>,
    depth: u32,
    /// Longitude covered by one pixel of the tile image
    resolution: f64,
}

impl Tile {
    fn new(id: TileId, bounds: Rect<f64>, depth: u32, tile_size: u32) -> Self {
        Self {
            id,
            bounds,
            depth,
            resolution: utils::lon_per_pixel(bounds.width(), tile_size as f64),
        }
    }

    #[inline]
    pub fn id(&self) -> TileId {
        self.id
    }

    #[inline]
    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    #[inline]
    pub fn ul_lon(&self) -> f64 {
        self.bounds.min().x
    }

    #[inline]
    pub fn ul_lat(&self) -> f64 {
        self.bounds.max().y
    }

    #[inline]
    pub fn lr_lon(&self) -> f64 {
        self.bounds.max().x
    }

    #[inline]
    pub fn lr_lat(&self) -> f64 {
        self.bounds.min().y
    }
}

/// Outcome of a tile query
///
/// On failure the geometry holds the "empty" sentinels (+inf / -inf extremes),
/// `depth` is 0 and there is no grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RasterResult {
    /// Tile identifiers, rows north to south, columns west to east
    pub render_grid: Option<Vec<Vec<TileId>>>,
    pub raster_ul_lon: f64,
    pub raster_ul_lat: f64,
    pub raster_lr_lon: f64,
    pub raster_lr_lat: f64,
    /// Deepest level among the selected tiles
    pub depth: u32,
    pub query_success: bool,
}

impl RasterResult {
    /// Failed result with sentinel geometry
    ///
    /// JSON has no infinities, so serde_json writes the sentinel corners as
    /// `null`; check `query_success` rather than the geometry.
    pub fn failure() -> Self {
        Self {
            render_grid: None,
            raster_ul_lon: f64::INFINITY,
            raster_ul_lat: f64::NEG_INFINITY,
            raster_lr_lon: f64::NEG_INFINITY,
            raster_lr_lat: f64::INFINITY,
            depth: 0,
            query_success: false,
        }
    }

    /// Grow the covering rectangle and depth to include `tile`
    fn include(&mut self, tile: &Tile) {
        self.raster_ul_lon = self.raster_ul_lon.min(tile.ul_lon());
        self.raster_ul_lat = self.raster_ul_lat.max(tile.ul_lat());
        self.raster_lr_lon = self.raster_lr_lon.max(tile.lr_lon());
        self.raster_lr_lat = self.raster_lr_lat.min(tile.lr_lat());
        self.depth = self.depth.max(tile.depth());
    }
}

/// Query box in the tile coordinate space
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QueryBox {
    pub ul_lon: f64,
    pub ul_lat: f64,
    pub lr_lon: f64,
    pub lr_lat: f64,
}

impl QueryBox {
    pub fn new(ul_lon: f64, ul_lat: f64, lr_lon: f64, lr_lat: f64) -> Self {
        Self {
            ul_lon,
            ul_lat,
            lr_lon,
            lr_lat,
        }
    }

    /// Inverted boxes (west edge east of the east edge, or north edge south
    /// of the south edge) cannot be rastered
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.ul_lon > self.lr_lon || self.ul_lat < self.lr_lat
    }

    #[inline]
    fn rect(&self) -> Rect<f64> {
        utils::rect_from_corners(self.ul_lon, self.ul_lat, self.lr_lon, self.lr_lat)
    }
}

/// A single node of the tile tree
#[derive(Debug, Clone)]
struct TileNode {
    tile: Tile,
    /// Child nodes (NW, NE, SW, SE); `None` at the maximum depth
    children: Option<Box<[TileNode; 4]>>,
}

/// Static quadtree of pre-rendered tiles
#[derive(Debug, Clone)]
pub struct TileQuadtree {
    root: TileNode,
    max_depth: u32,
    tile_size: u32,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TileQuadtree {
    /// Build the full tree over `bounds` down to `max_depth`
    ///
    /// `tile_size` is the pixel width of every tile image.
    pub fn new(bounds: Rect<f64>, max_depth: u32, tile_size: u32) -> Result<Self> {
        if max_depth > MAX_SUPPORTED_DEPTH {
            return Err(MapError::InvalidConfig(format!(
                "max depth {max_depth} exceeds {MAX_SUPPORTED_DEPTH}"
            )));
        }
        if tile_size == 0 {
            return Err(MapError::InvalidConfig("tile size must be positive".into()));
        }
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(MapError::InvalidBounds(format!(
                "root bounds {:?} have no area",
                bounds
            )));
        }

        let root = Tile::new(TileId::Root, bounds, 0, tile_size);
        let root = TileNode::build(root, max_depth, tile_size);
        tracing::debug!(
            "Built tile quadtree: depth {}, {} tiles",
            max_depth,
            Self::tile_count_for_depth(max_depth)
        );

        Ok(Self {
            root,
            max_depth,
            tile_size,
        })
    }

    /// Number of tiles in a complete tree of the given depth
    pub fn tile_count_for_depth(max_depth: u32) -> usize {
        (0..=max_depth).map(|d| 1usize << (2 * d)).sum()
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    #[inline]
    pub fn root(&self) -> &Tile {
        &self.root.tile
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        Self::tile_count_for_depth(self.max_depth)
    }

    /// Select the tiles covering `query` for a viewport `width` pixels wide
    ///
    /// Descends from the root, pruning subtrees that miss the query box, and
    /// stops at the first node that is at the maximum depth or whose
    /// resolution is strictly finer than the query's longitude per pixel.
    pub fn select_tiles(&self, query: QueryBox, width: f64) -> RasterResult {
        if query.is_degenerate() {
            tracing::debug!("Rejecting degenerate query box {:?}", query);
            return RasterResult::failure();
        }

        let required = utils::lon_per_pixel(query.lr_lon - query.ul_lon, width);
        let mut result = RasterResult::failure();
        let mut rows: BTreeMap<OrderedFloat<f64>, Vec<TileId>> = BTreeMap::new();

        self.root
            .select(&query, query.rect(), required, self.max_depth, &mut |tile: &Tile| {
                result.include(tile);
                rows.entry(OrderedFloat(tile.ul_lat()))
                    .or_default()
                    .push(tile.id());
            });

        if rows.is_empty() {
            return RasterResult::failure();
        }

        // Highest latitude first
        result.render_grid = Some(rows.into_values().rev().collect());
        result.query_success = true;
        tracing::debug!(
            "Selected tiles at depth {} for required resolution {}",
            result.depth,
            required
        );
        result
    }

    /// Look up a tile by identifier
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        let digits = match id {
            TileId::Root => return Some(&self.root.tile),
            TileId::Path(index) => index.to_string(),
        };

        let mut node = &self.root;
        for digit in digits.bytes() {
            let slot = match digit {
                b'1'..=b'4' => (digit - b'1') as usize,
                _ => return None,
            };
            node = &node.children.as_ref()?[slot];
        }
        Some(&node.tile)
    }
}

impl TileNode {
    fn build(tile: Tile, max_depth: u32, tile_size: u32) -> Self {
        if tile.depth == max_depth {
            return Self {
                tile,
                children: None,
            };
        }

        let children = Quadrant::ALL.map(|quadrant| {
            let child = Tile::new(
                tile.id.child(quadrant),
                child_bounds(tile.bounds, quadrant),
                tile.depth + 1,
                tile_size,
            );
            TileNode::build(child, max_depth, tile_size)
        });

        Self {
            tile,
            children: Some(Box::new(children)),
        }
    }

    fn select(
        &self,
        query: &QueryBox,
        query_rect: Rect<f64>,
        required: f64,
        max_depth: u32,
        emit: &mut impl FnMut(&Tile),
    ) {
        if !utils::rects_intersect(self.tile.bounds, query_rect) {
            return;
        }

        let tile = &self.tile;
        let children = match &self.children {
            Some(children) if tile.depth < max_depth && tile.resolution >= required => children,
            _ => {
                emit(tile);
                return;
            }
        };

        for (quadrant, child) in Quadrant::ALL.iter().zip(children.iter()) {
            if quadrant_may_intersect(*quadrant, tile, query) {
                child.select(query, query_rect, required, max_depth, emit);
            }
        }
    }
}

/// Bounds of the `quadrant` child of `parent`
fn child_bounds(parent: Rect<f64>, quadrant: Quadrant) -> Rect<f64> {
    let min = parent.min();
    let max = parent.max();
    let mid_lon = (min.x + max.x) / 2.0;
    let mid_lat = (min.y + max.y) / 2.0;

    match quadrant {
        Quadrant::NorthWest => utils::rect_from_corners(min.x, max.y, mid_lon, mid_lat),
        Quadrant::NorthEast => utils::rect_from_corners(mid_lon, max.y, max.x, mid_lat),
        Quadrant::SouthWest => utils::rect_from_corners(min.x, mid_lat, mid_lon, min.y),
        Quadrant::SouthEast => utils::rect_from_corners(mid_lon, mid_lat, max.x, min.y),
    }
}

/// Cheap pre-check before descending into a child
///
/// Compares query edges against the parent's outer edges; the child still
/// runs the full intersection test itself.
fn quadrant_may_intersect(quadrant: Quadrant, parent: &Tile, query: &QueryBox) -> bool {
    match quadrant {
        Quadrant::NorthWest => query.ul_lon < parent.lr_lon() && query.ul_lat > parent.lr_lat(),
        Quadrant::NorthEast => query.lr_lon > parent.ul_lon() && query.ul_lat > parent.lr_lat(),
        Quadrant::SouthWest => query.ul_lon < parent.lr_lon() && query.lr_lat < parent.ul_lat(),
        Quadrant::SouthEast => query.lr_lon > parent.ul_lon() && query.lr_lat < parent.ul_lat(),
    }
}
