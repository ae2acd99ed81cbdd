//! Utility functions for planar coordinate math and rectangle tests
//!
//! All distances here are Euclidean in raw longitude/latitude degrees. This is
//! an approximation that only holds for small regions such as a
//! single city map; it is not a geodesic distance.

use geo::{Coord, Point, Rect};

/// Euclidean distance between two points in longitude/latitude space
#[inline(always)]
pub fn planar_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}

/// Build a rectangle from an upper-left and lower-right corner
///
/// `geo::Rect` normalizes its corners, so the upper-left latitude ends up as
/// `max().y` and the lower-right latitude as `min().y`.
#[inline(always)]
pub fn rect_from_corners(ul_lon: f64, ul_lat: f64, lr_lon: f64, lr_lat: f64) -> Rect<f64> {
    Rect::new(
        Coord {
            x: ul_lon,
            y: ul_lat,
        },
        Coord {
            x: lr_lon,
            y: lr_lat,
        },
    )
}

/// Closed intersection test: rectangles that only touch on an edge intersect
#[inline(always)]
pub fn rects_intersect(a: Rect<f64>, b: Rect<f64>) -> bool {
    let amin = a.min();
    let amax = a.max();
    let bmin = b.min();
    let bmax = b.max();

    // Disjoint only if one lies entirely left, right, above or below the other
    !(amax.x < bmin.x || amin.x > bmax.x || amax.y < bmin.y || amin.y > bmax.y)
}

/// Longitude covered by a single pixel when `lon_span` is drawn `width` pixels wide
#[inline(always)]
pub fn lon_per_pixel(lon_span: f64, width: f64) -> f64 {
    lon_span / width
}
