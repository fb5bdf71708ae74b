use crate::cartesian::{CartesianPoint2d, Orientation};

/// A straight line segment between two points.
#[derive(Debug, PartialEq)]
pub struct Segment<'a, Point>(pub &'a Point, pub &'a Point);

impl<'a, P: CartesianPoint2d> Segment<'a, P> {
    /// Returns true if the `point` lies on the segment.
    pub fn contains_point(&self, point: &impl CartesianPoint2d) -> bool {
        Orientation::triplet(self.0, self.1, point) == Orientation::Collinear
            && within_bounds(self.0, point, self.1)
    }

    /// Returns true, if the segment has at least one common point with the `other` segment.
    pub fn intersects<Point: CartesianPoint2d>(&self, other: &Segment<Point>) -> bool {
        let o1 = Orientation::triplet(self.0, self.1, other.0);
        let o2 = Orientation::triplet(self.0, self.1, other.1);
        let o3 = Orientation::triplet(other.0, other.1, self.0);
        let o4 = Orientation::triplet(other.0, other.1, self.1);

        if o1 != o2 && o3 != o4 {
            return true;
        }

        (o1 == Orientation::Collinear && within_bounds(self.0, other.0, self.1))
            || (o2 == Orientation::Collinear && within_bounds(self.0, other.1, self.1))
            || (o3 == Orientation::Collinear && within_bounds(other.0, self.0, other.1))
            || (o4 == Orientation::Collinear && within_bounds(other.0, self.1, other.1))
    }
}

// `q` lies inside the bounding box of `p` and `r`.
fn within_bounds(
    p: &impl CartesianPoint2d,
    q: &impl CartesianPoint2d,
    r: &impl CartesianPoint2d,
) -> bool {
    q.x() <= p.x().max(r.x())
        && q.x() >= p.x().min(r.x())
        && q.y() <= p.y().max(r.y())
        && q.y() >= p.y().min(r.y())
}
