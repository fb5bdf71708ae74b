//! Geometries in geographic coordinates (latitude and longitude) and the functions working on the
//! surface of the ellipsoid: distances, destination points and Web Mercator projection.

mod datum;
mod geodesic;
mod point;
mod web_mercator;

pub use datum::Datum;
pub use geodesic::geodesic_circle;
pub use point::{GeoPoint, GeoPoint2d};
pub use web_mercator::WebMercator;
