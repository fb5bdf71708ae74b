use serde::{Deserialize, Serialize};

use crate::cartesian::{convex_hull, CartesianPoint2d, Orientation, Rect, Segment};
use crate::error::CanopyTypesError;
use crate::geo::{geodesic_circle, Datum, GeoPoint2d};

/// Closed ring of points. The closing point is implied and is not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour<P = GeoPoint2d> {
    points: Vec<P>,
}

impl<P: CartesianPoint2d> Contour<P> {
    /// Creates a new ring. If the last point repeats the first one, it is dropped.
    pub fn new(mut points: Vec<P>) -> Self {
        if points.len() > 1 {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                if first.equal(last) {
                    points.pop();
                }
            }
        }

        Self { points }
    }

    /// Points of the ring.
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Iterates over the sides of the ring, including the closing one.
    pub fn iter_segments(&self) -> impl Iterator<Item = Segment<'_, P>> {
        let count = self.points.len();
        let closing = if count > 1 { count } else { 0 };
        (0..closing).map(move |i| Segment(&self.points[i], &self.points[(i + 1) % count]))
    }

    /// Returns true if the `point` lies inside the ring or on one of its sides.
    pub fn contains_point(&self, point: &impl CartesianPoint2d) -> bool {
        let y = point.y();
        let mut winding = 0i64;

        for segment in self.iter_segments() {
            if segment.contains_point(point) {
                return true;
            }

            let Segment(a, b) = segment;
            if a.y() <= y {
                if b.y() > y && Orientation::triplet(a, b, point) == Orientation::Counterclockwise {
                    winding += 1;
                }
            } else if b.y() <= y && Orientation::triplet(a, b, point) == Orientation::Clockwise {
                winding -= 1;
            }
        }

        winding != 0
    }

    /// Bounding rectangle of the ring. `None` for an empty ring.
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::from_points(self.points.iter())
    }
}

/// Polygon with an outer ring and optional holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon<P = GeoPoint2d> {
    /// Outer ring.
    pub outer_contour: Contour<P>,
    /// Holes.
    pub inner_contours: Vec<Contour<P>>,
}

impl<P: CartesianPoint2d> Polygon<P> {
    /// Creates a new polygon.
    pub fn new(outer_contour: Contour<P>, inner_contours: Vec<Contour<P>>) -> Self {
        Self {
            outer_contour,
            inner_contours,
        }
    }

    /// Builds a polygon from a list of rings, the first one being the outer ring.
    pub fn from_rings(rings: Vec<Vec<P>>) -> Result<Self, CanopyTypesError> {
        let mut rings = rings.into_iter().map(Contour::new);
        let outer_contour = rings
            .next()
            .ok_or_else(|| CanopyTypesError::Conversion("polygon without rings".into()))?;
        if outer_contour.points().len() < 3 {
            return Err(CanopyTypesError::Conversion(format!(
                "outer ring has {} points",
                outer_contour.points().len()
            )));
        }

        Ok(Self::new(outer_contour, rings.collect()))
    }

    /// Returns true if the point is inside the polygon (on the border counts as inside) and not
    /// strictly inside one of its holes.
    pub fn contains_point(&self, point: &impl CartesianPoint2d) -> bool {
        if !self.outer_contour.contains_point(point) {
            return false;
        }

        !self.inner_contours.iter().any(|hole| {
            hole.contains_point(point) && !hole.iter_segments().any(|s| s.contains_point(point))
        })
    }

    /// Iterates over sides of all rings of the polygon.
    pub fn iter_segments(&self) -> impl Iterator<Item = Segment<'_, P>> {
        self.outer_contour
            .iter_segments()
            .chain(self.inner_contours.iter().flat_map(|c| c.iter_segments()))
    }

    /// Bounding rectangle of the outer ring.
    pub fn bounding_rect(&self) -> Option<Rect> {
        self.outer_contour.bounding_rect()
    }

    /// Returns true if the polygons have at least one common point.
    pub fn intersects(&self, other: &Polygon<impl CartesianPoint2d>) -> bool {
        match (self.bounding_rect(), other.bounding_rect()) {
            (Some(a), Some(b)) if a.intersects(&b) => {}
            _ => return false,
        }

        let crossing = self
            .iter_segments()
            .any(|s| other.iter_segments().any(|o| s.intersects(&o)));

        crossing
            || other
                .outer_contour
                .points()
                .first()
                .is_some_and(|p| self.contains_point(p))
            || self
                .outer_contour
                .points()
                .first()
                .is_some_and(|p| other.contains_point(p))
    }
}

/// Geometry of a feature: a point or a polygon in geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geom {
    /// Point geometry.
    Point(GeoPoint2d),
    /// Polygon geometry.
    Polygon(Polygon),
}

impl Geom {
    /// Extent of the geometry.
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Geom::Point(p) => Some(Rect::from_point(p)),
            Geom::Polygon(p) => p.bounding_rect(),
        }
    }

    /// The point itself for point geometries, the center of the extent for polygons.
    pub fn center(&self) -> Option<GeoPoint2d> {
        match self {
            Geom::Point(p) => Some(*p),
            Geom::Polygon(p) => {
                let center = p.bounding_rect()?.center();
                Some(GeoPoint2d::lonlat(center.x(), center.y()))
            }
        }
    }

    /// Returns true if the geometries have at least one common point.
    pub fn intersects(&self, other: &Geom) -> bool {
        match (self, other) {
            (Geom::Point(a), Geom::Point(b)) => a.equal(b),
            (Geom::Point(point), Geom::Polygon(polygon))
            | (Geom::Polygon(polygon), Geom::Point(point)) => polygon.contains_point(point),
            (Geom::Polygon(a), Geom::Polygon(b)) => a.intersects(b),
        }
    }

    /// Polygon covering all points within `distance` meters of the geometry.
    ///
    /// Points produce a geodesic circle. Polygons produce the convex hull of circles around their
    /// vertices, which is exact for convex polygons and covers the true buffer of concave ones.
    pub fn geodesic_buffer(
        &self,
        distance: f64,
        segments: usize,
        datum: &Datum,
    ) -> Result<Polygon, CanopyTypesError> {
        match self {
            Geom::Point(p) => Ok(geodesic_circle(p, distance, segments, datum)),
            Geom::Polygon(polygon) => {
                let points: Vec<GeoPoint2d> = polygon
                    .outer_contour
                    .points()
                    .iter()
                    .flat_map(|vertex| {
                        geodesic_circle(vertex, distance, segments, datum)
                            .outer_contour
                            .points
                    })
                    .collect();
                if points.is_empty() {
                    return Err(CanopyTypesError::Conversion("empty polygon".into()));
                }

                Ok(Polygon::new(Contour::new(convex_hull(&points)), vec![]))
            }
        }
    }
}
