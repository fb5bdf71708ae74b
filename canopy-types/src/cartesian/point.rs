use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

/// Point in 2d cartesian coordinates.
///
/// Geographic points implement this trait too, with longitude as `x` and latitude as `y`, so the
/// planar algorithms of this module can be applied to them directly.
pub trait CartesianPoint2d {
    /// X coordinate.
    fn x(&self) -> f64;
    /// Y coordinate.
    fn y(&self) -> f64;

    /// Squared euclidean distance between two points.
    fn distance_sq(&self, other: &impl CartesianPoint2d) -> f64 {
        let dx = self.x() - other.x();
        let dy = self.y() - other.y();
        dx * dx + dy * dy
    }

    /// Returns true if both coordinates of the points are exactly equal.
    fn equal(&self, other: &impl CartesianPoint2d) -> bool {
        self.x() == other.x() && self.y() == other.y()
    }
}

/// A point in 2-dimensional cartesian coordinate space.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point2d {
    x: f64,
    y: f64,
}

impl Point2d {
    /// Creates a new point with the given coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl CartesianPoint2d for Point2d {
    fn x(&self) -> f64 {
        self.x
    }

    fn y(&self) -> f64 {
        self.y
    }
}

impl AbsDiffEq for Point2d {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon) && self.y.abs_diff_eq(&other.y, epsilon)
    }
}
