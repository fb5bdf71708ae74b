//! Geometry primitives used by the `canopy` feature search.
//!
//! Features returned by a feature service carry either a point or a polygon in geographic
//! coordinates. This crate provides those geometries ([`Geom`], [`GeoPoint2d`](geo::GeoPoint2d),
//! [`Polygon`]) together with the few algorithms the search needs locally:
//!
//! * extents ([`Rect`](cartesian::Rect)) with expansion and merging, used for map framing,
//! * planar intersection tests (segments, point in polygon), used to evaluate spatial filters,
//! * geodesic helpers (distance, destination point, circles), used to build buffers,
//! * Web Mercator projection, used to convert between screen and map positions.
//!
//! Planar algorithms treat longitude as `x` and latitude as `y`. This is accurate enough for the
//! city-scale areas the search works with.

pub mod cartesian;
pub mod error;
pub mod geo;
mod geometry;

pub use geometry::{Contour, Geom, Polygon};
