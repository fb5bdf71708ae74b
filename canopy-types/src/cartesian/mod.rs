//! Types and functions on geometries in cartesian coordinates.

mod hull;
mod orient;
mod point;
mod rect;
mod segment;
mod size;

pub use hull::convex_hull;
pub use orient::Orientation;
pub use point::{CartesianPoint2d, Point2d};
pub use rect::Rect;
pub use segment::Segment;
pub use size::Size;
