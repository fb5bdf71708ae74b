use serde::{Deserialize, Serialize};

use crate::cartesian::{CartesianPoint2d, Point2d};

/// Axis-aligned rectangle. Used as the extent of geometries and of the map view.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x (west for geographic extents).
    pub x_min: f64,
    /// Minimum y (south for geographic extents).
    pub y_min: f64,
    /// Maximum x (east for geographic extents).
    pub x_max: f64,
    /// Maximum y (north for geographic extents).
    pub y_max: f64,
}

impl Rect {
    /// Creates a new rectangle. The coordinates are not normalized.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Point2d {
        Point2d::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Rectangle of a single point.
    pub fn from_point(p: &impl CartesianPoint2d) -> Self {
        Self {
            x_min: p.x(),
            x_max: p.x(),
            y_min: p.y(),
            y_max: p.y(),
        }
    }

    /// Bounding rectangle of the points. Returns `None` if the iterator is empty.
    pub fn from_points<'a, P: CartesianPoint2d + 'a>(
        mut points: impl Iterator<Item = &'a P>,
    ) -> Option<Self> {
        let first = points.next()?;
        Some(points.fold(Self::from_point(first), |rect, p| {
            rect.merge(Self::from_point(p))
        }))
    }

    /// Returns true if the point is inside the rectangle or on its border.
    pub fn contains(&self, point: &impl CartesianPoint2d) -> bool {
        self.x_min <= point.x()
            && self.x_max >= point.x()
            && self.y_min <= point.y()
            && self.y_max >= point.y()
    }

    /// Returns true if the rectangles have at least one common point.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }

    /// Scales the rectangle around its center by the `factor`. A factor of `1.2` adds 10% of
    /// width and height on every side.
    pub fn magnify(&self, factor: f64) -> Self {
        let center = self.center();
        let half_width = self.width() / 2.0 * factor;
        let half_height = self.height() / 2.0 * factor;
        Self {
            x_min: center.x() - half_width,
            x_max: center.x() + half_width,
            y_min: center.y() - half_height,
            y_max: center.y() + half_height,
        }
    }
}
