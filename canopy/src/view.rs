//! Map view with Web Mercator screen conversion and hit testing.

use canopy_types::cartesian::{CartesianPoint2d, Point2d, Rect, Size};
use canopy_types::geo::{GeoPoint, GeoPoint2d, WebMercator};
use canopy_types::Geom;
use log::warn;

use crate::feature::FeatureRecord;
use crate::focus::{MapNavigator, ViewTarget};

const DOTS_PER_INCH: f64 = 96.0;
const METERS_PER_INCH: f64 = 0.0254;
const DEFAULT_HIT_TOLERANCE_PX: f64 = 8.0;

/// Converts a map scale denominator into a resolution in projected meters per pixel.
pub fn scale_to_resolution(scale: f64) -> f64 {
    scale * METERS_PER_INCH / DOTS_PER_INCH
}

/// Converts a resolution in projected meters per pixel into a map scale denominator.
pub fn resolution_to_scale(resolution: f64) -> f64 {
    resolution * DOTS_PER_INCH / METERS_PER_INCH
}

/// Web Mercator map view.
///
/// Keeps the position of the camera (center and resolution), the size of the screen area and the
/// features currently displayed on the map, which are used for hit testing.
#[derive(Debug, Clone)]
pub struct MapView {
    center: GeoPoint2d,
    resolution: f64,
    size: Size,
    projection: WebMercator,
    displayed: Vec<FeatureRecord>,
    hit_tolerance_px: f64,
}

impl MapView {
    /// Creates a view centered on the point with the given resolution (meters per pixel).
    pub fn new(center: GeoPoint2d, resolution: f64) -> Self {
        Self {
            center,
            resolution,
            size: Size::new(1024.0, 768.0),
            projection: WebMercator::default(),
            displayed: vec![],
            hit_tolerance_px: DEFAULT_HIT_TOLERANCE_PX,
        }
    }

    /// Center of the view.
    pub fn center(&self) -> GeoPoint2d {
        self.center
    }

    /// Resolution of the view in projected meters per pixel.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Map scale denominator of the view.
    pub fn scale(&self) -> f64 {
        resolution_to_scale(self.resolution)
    }

    /// Size of the screen area.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Sets the size of the screen area.
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Sets the size of the screen area.
    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Sets the distance in pixels within which a click hits a point feature.
    pub fn with_hit_tolerance(mut self, tolerance_px: f64) -> Self {
        self.hit_tolerance_px = tolerance_px;
        self
    }

    /// Replaces the features displayed on the map. Later features are drawn on top.
    pub fn set_displayed_features(&mut self, features: Vec<FeatureRecord>) {
        self.displayed = features;
    }

    /// Geographic extent of the visible area.
    pub fn extent(&self) -> Option<Rect> {
        let top_left = self.screen_to_map(Point2d::new(0.0, 0.0))?;
        let bottom_right =
            self.screen_to_map(Point2d::new(self.size.width(), self.size.height()))?;

        Rect::from_points([top_left, bottom_right].iter())
    }

    fn projected_center(&self) -> Option<Point2d> {
        self.projection.project(&self.center)
    }

    /// Geographic position of a screen point (pixels from the top-left corner).
    pub fn screen_to_map(&self, screen: Point2d) -> Option<GeoPoint2d> {
        let center = self.projected_center()?;
        let projected = Point2d::new(
            center.x() + (screen.x() - self.size.half_width()) * self.resolution,
            center.y() - (screen.y() - self.size.half_height()) * self.resolution,
        );

        self.projection.unproject(&projected)
    }

    /// Screen position (pixels from the top-left corner) of a geographic point.
    pub fn map_to_screen(&self, point: &impl GeoPoint) -> Option<Point2d> {
        let center = self.projected_center()?;
        let projected = self.projection.project(point)?;

        Some(Point2d::new(
            (projected.x() - center.x()) / self.resolution + self.size.half_width(),
            (center.y() - projected.y()) / self.resolution + self.size.half_height(),
        ))
    }

    fn is_hit(&self, geometry: &Geom, screen: Point2d, map: &GeoPoint2d) -> bool {
        match geometry {
            Geom::Point(point) => self.map_to_screen(point).is_some_and(|p| {
                p.distance_sq(&screen) <= self.hit_tolerance_px * self.hit_tolerance_px
            }),
            Geom::Polygon(polygon) => polygon.contains_point(map),
        }
    }

    fn fit_extent(&mut self, extent: Rect) {
        let corners = (
            self.projection
                .project(&GeoPoint2d::lonlat(extent.x_min, extent.y_min)),
            self.projection
                .project(&GeoPoint2d::lonlat(extent.x_max, extent.y_max)),
        );
        let (Some(min), Some(max)) = corners else {
            warn!("Cannot fit extent {extent:?} into a Web Mercator view");
            return;
        };

        let projected = Rect::new(min.x(), min.y(), max.x(), max.y());
        let Some(center) = self.projection.unproject(&projected.center()) else {
            return;
        };

        self.center = center;
        if !self.size.is_zero() {
            let resolution = (projected.width() / self.size.width())
                .max(projected.height() / self.size.height());
            if resolution > 0.0 {
                self.resolution = resolution;
            }
        }
    }
}

impl MapNavigator for MapView {
    fn go_to(&mut self, target: ViewTarget) {
        match target {
            ViewTarget::Extent(extent) => self.fit_extent(extent),
            ViewTarget::Center { center, scale } => {
                self.center = center;
                self.resolution = scale_to_resolution(scale);
            }
        }
    }

    fn hit_test(&self, screen_position: Point2d) -> Option<FeatureRecord> {
        let map = self.screen_to_map(screen_position)?;
        self.displayed
            .iter()
            .rev()
            .find(|f| {
                f.geometry()
                    .is_some_and(|g| self.is_hit(g, screen_position, &map))
            })
            .cloned()
    }
}
