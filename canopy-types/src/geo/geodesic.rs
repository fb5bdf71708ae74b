use crate::geo::{Datum, GeoPoint2d};
use crate::{Contour, Polygon};

/// Approximates the circle of `radius` meters around `center` with a polygon of `segments`
/// vertices placed at equal bearings.
///
/// The number of segments is clamped to at least 3.
pub fn geodesic_circle(
    center: &GeoPoint2d,
    radius: f64,
    segments: usize,
    datum: &Datum,
) -> Polygon {
    let segments = segments.max(3);
    let points = (0..segments)
        .map(|i| {
            let bearing = 360.0 * i as f64 / segments as f64;
            center.destination(bearing, radius, datum)
        })
        .collect();

    Polygon::new(Contour::new(points), vec![])
}
