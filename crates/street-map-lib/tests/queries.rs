//! End-to-end query tests against the bundled demo map and synthetic trees

use geo::Rect;
use std::sync::Arc;
use street_map_lib::quadtree::MAX_SUPPORTED_DEPTH;
use street_map_lib::{
    Config, MapBuilder, MapDocument, QueryBox, RasterRequest, RouteRequest, StreetMap, Tile,
    TileId, TileQuadtree, utils,
};

const DEMO_MAP: &str = include_str!("../../../demos/berkeley.json");

fn demo_map() -> StreetMap {
    let document = MapDocument::from_reader(DEMO_MAP.as_bytes()).unwrap();
    MapBuilder::from_document(Config::default(), &document)
        .build()
        .unwrap()
}

fn unit_tree(max_depth: u32) -> TileQuadtree {
    TileQuadtree::new(
        utils::rect_from_corners(-10.0, 10.0, 10.0, -10.0),
        max_depth,
        256,
    )
    .unwrap()
}

fn selected_tiles<'a>(tree: &'a TileQuadtree, ids: &[TileId]) -> Vec<&'a Tile> {
    ids.iter().map(|id| tree.tile(*id).unwrap()).collect()
}

fn interiors_overlap(a: Rect<f64>, b: Rect<f64>) -> bool {
    a.min().x < b.max().x && b.min().x < a.max().x && a.min().y < b.max().y && b.min().y < a.max().y
}

fn is_ancestor(a: TileId, b: TileId) -> bool {
    match (a, b) {
        (TileId::Root, TileId::Path(_)) => true,
        (TileId::Path(a), TileId::Path(b)) => {
            let (a, b) = (a.to_string(), b.to_string());
            b.len() > a.len() && b.starts_with(&a)
        }
        _ => false,
    }
}

/// Check the structural guarantees of a successful selection
fn check_selection(tree: &TileQuadtree, query: QueryBox, width: f64) {
    let result = tree.select_tiles(query, width);
    assert!(result.query_success, "query {query:?} should succeed");

    let grid = result.render_grid.as_ref().unwrap();
    let ids: Vec<TileId> = grid.iter().flatten().copied().collect();
    let tiles = selected_tiles(tree, &ids);
    let required = (query.lr_lon - query.ul_lon) / width;
    let query_rect = utils::rect_from_corners(query.ul_lon, query.ul_lat, query.lr_lon, query.lr_lat);

    for tile in &tiles {
        assert!(utils::rects_intersect(tile.bounds(), query_rect));
        assert!(tile.resolution() < required || tile.depth() == tree.max_depth());
        assert!(tile.depth() <= result.depth);
    }

    for (i, a) in tiles.iter().enumerate() {
        for b in &tiles[i + 1..] {
            assert!(!interiors_overlap(a.bounds(), b.bounds()), "{} overlaps {}", a.id(), b.id());
            assert!(!is_ancestor(a.id(), b.id()) && !is_ancestor(b.id(), a.id()));
        }
    }

    // Sample the query box clipped to the root and make sure every point is covered
    let root = tree.root().bounds();
    let west = query.ul_lon.max(root.min().x);
    let east = query.lr_lon.min(root.max().x);
    let south = query.lr_lat.max(root.min().y);
    let north = query.ul_lat.min(root.max().y);
    if west > east || south > north {
        return;
    }
    let steps = 16;
    for i in 0..=steps {
        for j in 0..=steps {
            let lon = west + (east - west) * i as f64 / steps as f64;
            let lat = south + (north - south) * j as f64 / steps as f64;
            let covered = tiles.iter().any(|t| {
                let b = t.bounds();
                b.min().x <= lon && lon <= b.max().x && b.min().y <= lat && lat <= b.max().y
            });
            assert!(covered, "({lon}, {lat}) not covered for {query:?}");
        }
    }

    // Rows run north to south and each row shares one upper edge
    let row_tops: Vec<f64> = grid
        .iter()
        .map(|row| tree.tile(row[0]).unwrap().ul_lat())
        .collect();
    assert!(row_tops.windows(2).all(|w| w[0] > w[1]));
    for row in grid {
        let lons: Vec<f64> = selected_tiles(tree, row).iter().map(|t| t.ul_lon()).collect();
        assert!(lons.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_selection_properties_over_many_boxes() {
    let tree = unit_tree(4);
    let boxes = [
        QueryBox::new(-10.0, 10.0, 10.0, -10.0),
        QueryBox::new(-3.3, 7.1, 2.9, -1.4),
        QueryBox::new(0.0, 0.0, 0.0, 0.0),
        QueryBox::new(-12.0, 4.0, -6.0, -12.0),
        QueryBox::new(4.9, 9.9, 9.9, 4.9),
        QueryBox::new(-0.01, 0.02, 0.03, -0.04),
    ];

    for query in boxes {
        for width in [1.0, 32.0, 256.0, 1000.0, 4096.0] {
            check_selection(&tree, query, width);
        }
    }
}

#[test]
fn test_selection_is_idempotent() {
    let tree = unit_tree(3);
    let query = QueryBox::new(-7.5, 3.0, 6.2, -8.8);
    assert_eq!(tree.select_tiles(query, 800.0), tree.select_tiles(query, 800.0));
}

#[test]
fn test_box_outside_root_fails() {
    let tree = unit_tree(3);
    let result = tree.select_tiles(QueryBox::new(20.0, 30.0, 25.0, 20.0), 256.0);
    assert!(!result.query_success);
    assert!(result.render_grid.is_none());
}

#[test]
fn test_deepest_supported_tree() {
    assert!(TileQuadtree::new(
        utils::rect_from_corners(0.0, 1.0, 1.0, 0.0),
        MAX_SUPPORTED_DEPTH + 1,
        256
    )
    .is_err());
}

#[test]
fn test_demo_map_summary() {
    let map = demo_map();
    let info = map.info();

    // Indian Rock has no roads and is dropped from the graph
    assert_eq!(info.vertex_count, 9);
    assert_eq!(info.edge_count, 11);
    assert_eq!(info.place_count, 5);
    assert_eq!(info.max_depth, 7);
    assert_eq!(info.tile_count, TileQuadtree::tile_count_for_depth(7));
}

#[test]
fn test_demo_map_search_and_locate() {
    let map = demo_map();

    assert_eq!(
        map.search("Sa"),
        vec!["saint johns church", "Sather Gate", "Sather Tower"]
    );
    assert_eq!(map.search("").len(), 5);
    assert_eq!(map.search("indian"), vec!["Indian Rock"]);

    let churches = map.locate("SAINT JOHNS CHURCH");
    assert_eq!(churches.len(), 2);
    assert_eq!(churches[0].id, 109);
    assert_eq!(churches[1].id, 103);
    assert_eq!(churches[1].name, "saint johns church");

    assert_eq!(map.locate("indian rock")[0].lat, 37.890);
    assert!(map.locate("nowhere").is_empty());
}

#[test]
fn test_demo_map_route() {
    let map = demo_map();

    // Top Dog to Saint John's Church across the grid
    let path = map.route(&RouteRequest {
        start_lon: -122.2601,
        start_lat: 37.8702,
        dest_lon: -122.2499,
        dest_lat: 37.8598,
    });
    assert_eq!(path.len(), 5);
    assert_eq!(path.first(), Some(&101));
    assert_eq!(path.last(), Some(&109));
    let walked = map.graph().path_distance(&path).unwrap();
    assert!((walked - 0.02).abs() < 1e-9);

    // Through the middle: Top Dog to Sather Gate
    let path = map.route(&RouteRequest {
        start_lon: -122.260,
        start_lat: 37.870,
        dest_lon: -122.255,
        dest_lat: 37.865,
    });
    assert_eq!(path.len(), 3);
    assert_eq!(path.last(), Some(&105));
}

#[test]
fn test_demo_map_raster() {
    let map = demo_map();
    let root = map.config().root_bounds;

    let result = map.raster(&RasterRequest {
        ul_lon: root.min().x,
        ul_lat: root.max().y,
        lr_lon: root.max().x,
        lr_lat: root.min().y,
        width: 100.0,
        height: 80.0,
    });
    assert!(result.query_success);
    assert_eq!(result.depth, 0);
    assert_eq!(map.tile_file_names(&result), vec![vec!["img/root.png"]]);

    let zoomed = map.raster(&RasterRequest {
        ul_lon: -122.26,
        ul_lat: 37.871,
        lr_lon: -122.25,
        lr_lat: 37.859,
        width: 1024.0,
        height: 768.0,
    });
    assert!(zoomed.query_success);
    assert!(zoomed.depth > 0);
    assert!(zoomed.raster_ul_lon <= -122.26 && zoomed.raster_lr_lon >= -122.25);
    assert!(zoomed.raster_ul_lat >= 37.871 && zoomed.raster_lr_lat <= 37.859);
    for row in map.tile_file_names(&zoomed) {
        for name in row {
            assert!(name.starts_with("img/") && name.ends_with(".png"));
        }
    }
}

#[test]
fn test_map_document_from_path() {
    let path = std::env::temp_dir().join(format!("street-map-demo-{}.json", std::process::id()));
    std::fs::write(&path, DEMO_MAP).unwrap();
    let document = MapDocument::from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(document.nodes.len(), 10);
    assert_eq!(document.ways.len(), 6);
    assert_eq!(document.places.len(), 3);

    assert!(MapDocument::from_path(std::env::temp_dir().join("street-map-missing.json")).is_err());
}

#[test]
fn test_concurrent_queries_on_shared_map() {
    let map = Arc::new(demo_map());
    let expected = map.route(&RouteRequest {
        start_lon: -122.260,
        start_lat: 37.860,
        dest_lon: -122.250,
        dest_lat: 37.870,
    });

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let map = Arc::clone(&map);
            let expected = &expected;
            scope.spawn(move || {
                for _ in 0..20 {
                    let path = map.route(&RouteRequest {
                        start_lon: -122.260,
                        start_lat: 37.860,
                        dest_lon: -122.250,
                        dest_lat: 37.870,
                    });
                    assert_eq!(&path, expected);
                    assert_eq!(map.search("sather").len(), 2);
                }
            });
        }
    });

    let batch = vec![
        RouteRequest {
            start_lon: -122.260,
            start_lat: 37.860,
            dest_lon: -122.250,
            dest_lat: 37.870,
        };
        16
    ];
    assert!(map.routes_parallel(&batch).iter().all(|p| p == &expected));
}
