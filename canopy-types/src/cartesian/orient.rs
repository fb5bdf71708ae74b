use serde::{Deserialize, Serialize};

use crate::cartesian::CartesianPoint2d;

/// Orientation of a triplet of points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Clockwise
    Clockwise,
    /// Counterclockwise
    Counterclockwise,
    /// Collinear
    Collinear,
}

impl Orientation {
    /// Determines orientation of a triplet of points.
    ///
    /// Triplets with non-finite coordinates are reported as collinear.
    pub fn triplet(
        p: &impl CartesianPoint2d,
        q: &impl CartesianPoint2d,
        r: &impl CartesianPoint2d,
    ) -> Self {
        let value = (q.y() - p.y()) * (r.x() - q.x()) - (q.x() - p.x()) * (r.y() - q.y());
        if value > 0.0 {
            Self::Clockwise
        } else if value < 0.0 {
            Self::Counterclockwise
        } else {
            Self::Collinear
        }
    }
}
