//! Map focus: moving the view to a feature and drawing highlight graphics.

use canopy_types::cartesian::{Point2d, Rect};
use canopy_types::geo::GeoPoint2d;
use canopy_types::Geom;

use crate::color::Color;
use crate::feature::FeatureRecord;

/// Where the view should go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewTarget {
    /// Fit the extent (geographic coordinates) into the view.
    Extent(Rect),
    /// Center the view on the point at the given map scale.
    Center {
        /// New center of the view.
        center: GeoPoint2d,
        /// Map scale denominator (`2000` for 1:2000).
        scale: f64,
    },
}

/// Navigation primitives of a map view.
pub trait MapNavigator {
    /// Moves the view to the target.
    fn go_to(&mut self, target: ViewTarget);
    /// Returns the topmost feature displayed at the screen position, if any.
    fn hit_test(&self, screen_position: Point2d) -> Option<FeatureRecord>;
}

/// Overlay of highlight graphics drawn on top of the map.
pub trait GraphicsOverlay {
    /// Removes all graphics.
    fn clear(&mut self);
    /// Adds a graphic on top of the existing ones.
    fn add(&mut self, graphic: Graphic);
}

/// Shape of a point marker.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarkerShape {
    /// Circle.
    Circle,
    /// Square rotated by 45 degrees.
    Diamond,
}

/// Symbol of a highlight graphic.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HighlightSymbol {
    /// Feature selected in the result table.
    SelectedMarker,
    /// Buffer polygon.
    Buffer,
    /// Feature found inside the buffer.
    IntersectingMarker,
    /// Feature selected on the map: a translucent halo over the symbol of its layer.
    HitFeature,
}

/// Drawing parameters of a [`HighlightSymbol`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SymbolStyle {
    /// Marker shape, `None` for fills.
    pub marker: Option<MarkerShape>,
    /// Marker size in pixels.
    pub size_px: f64,
    /// Fill color.
    pub fill: Color,
    /// Outline color.
    pub outline: Color,
    /// Outline width in pixels.
    pub outline_width: f64,
}

impl HighlightSymbol {
    /// Drawing parameters of the symbol.
    pub fn style(&self) -> SymbolStyle {
        match self {
            HighlightSymbol::SelectedMarker => SymbolStyle {
                marker: Some(MarkerShape::Diamond),
                size_px: 16.0,
                fill: Color::ORANGE,
                outline: Color::WHITE,
                outline_width: 2.0,
            },
            HighlightSymbol::Buffer => SymbolStyle {
                marker: None,
                size_px: 0.0,
                fill: Color::BLACK.with_alpha(26),
                outline: Color::BLACK.with_alpha(153),
                outline_width: 2.0,
            },
            HighlightSymbol::IntersectingMarker => SymbolStyle {
                marker: Some(MarkerShape::Circle),
                size_px: 10.0,
                fill: Color::GREEN,
                outline: Color::WHITE,
                outline_width: 1.0,
            },
            HighlightSymbol::HitFeature => SymbolStyle {
                marker: Some(MarkerShape::Circle),
                size_px: 20.0,
                fill: Color::ORANGE.with_alpha(64),
                outline: Color::ORANGE,
                outline_width: 2.0,
            },
        }
    }
}

/// Geometry drawn with a highlight symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    /// Geometry to draw.
    pub geometry: Geom,
    /// Symbol to draw it with.
    pub symbol: HighlightSymbol,
}

impl Graphic {
    /// Creates a new graphic.
    pub fn new(geometry: Geom, symbol: HighlightSymbol) -> Self {
        Self { geometry, symbol }
    }
}

/// Computes view targets and replaces highlight graphics.
///
/// Highlights are never updated incrementally: every focus change clears the overlay and draws
/// the new set of graphics.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FocusCoordinator {
    focus_scale: f64,
    extent_expand: f64,
}

impl FocusCoordinator {
    /// Creates a coordinator focusing points at `focus_scale` and expanding extents by
    /// `extent_expand`.
    pub fn new(focus_scale: f64, extent_expand: f64) -> Self {
        Self {
            focus_scale,
            extent_expand,
        }
    }

    /// View target of a geometry: its center at the focus scale for points, its expanded extent
    /// for polygons.
    pub fn target_for(&self, geometry: &Geom) -> Option<ViewTarget> {
        match geometry {
            Geom::Point(center) => Some(ViewTarget::Center {
                center: *center,
                scale: self.focus_scale,
            }),
            Geom::Polygon(polygon) => polygon.bounding_rect().map(|r| self.extent_target(r)),
        }
    }

    /// View target fitting the expanded extent.
    pub fn extent_target(&self, extent: Rect) -> ViewTarget {
        ViewTarget::Extent(extent.magnify(self.extent_expand))
    }

    /// Clears the overlay and adds the graphics.
    pub fn replace(
        &self,
        overlay: &mut impl GraphicsOverlay,
        graphics: impl IntoIterator<Item = Graphic>,
    ) {
        overlay.clear();
        for graphic in graphics {
            overlay.add(graphic);
        }
    }

    /// Highlights the record with the selected marker and moves the view to it.
    ///
    /// Returns false, leaving the view and the overlay untouched, if the record has no geometry.
    pub fn focus_record(
        &self,
        view: &mut impl MapNavigator,
        overlay: &mut impl GraphicsOverlay,
        record: &FeatureRecord,
    ) -> bool {
        let Some(geometry) = record.geometry() else {
            return false;
        };
        let Some(target) = self.target_for(geometry) else {
            return false;
        };

        self.replace(
            overlay,
            [Graphic::new(geometry.clone(), HighlightSymbol::SelectedMarker)],
        );
        view.go_to(target);

        true
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use canopy_types::{latlon, Polygon};

    use super::*;
    use crate::feature::FeatureId;
    use crate::graphics::GraphicsLayer;
    use crate::view::MapView;

    #[test]
    fn point_target() {
        let focus = FocusCoordinator::new(2000.0, 1.2);
        let target = focus.target_for(&Geom::Point(latlon!(16.46, 107.59)));

        assert_eq!(
            target,
            Some(ViewTarget::Center {
                center: latlon!(16.46, 107.59),
                scale: 2000.0
            })
        );
    }

    #[test]
    fn polygon_target() {
        let focus = FocusCoordinator::new(2000.0, 1.2);
        let polygon = Polygon::from_rings(vec![vec![
            GeoPoint2d::lonlat(107.0, 16.0),
            GeoPoint2d::lonlat(108.0, 16.0),
            GeoPoint2d::lonlat(108.0, 17.0),
            GeoPoint2d::lonlat(107.0, 17.0),
        ]])
        .unwrap();

        let Some(ViewTarget::Extent(extent)) = focus.target_for(&Geom::Polygon(polygon)) else {
            panic!("expected an extent");
        };
        assert_abs_diff_eq!(extent.width(), 1.2, epsilon = 1e-9);
        assert_abs_diff_eq!(extent.x_min, 106.9, epsilon = 1e-9);
    }

    #[test]
    fn focus_replaces_graphics() {
        let focus = FocusCoordinator::new(2000.0, 1.2);
        let mut view = MapView::new(latlon!(0.0, 0.0), 1000.0);
        let mut overlay = GraphicsLayer::new();
        overlay.add(Graphic::new(
            Geom::Point(latlon!(1.0, 1.0)),
            HighlightSymbol::IntersectingMarker,
        ));

        let record = FeatureRecord::new(FeatureId(1), Some(Geom::Point(latlon!(16.46, 107.59))));
        assert!(focus.focus_record(&mut view, &mut overlay, &record));

        assert_eq!(overlay.graphics().len(), 1);
        assert_eq!(overlay.graphics()[0].symbol, HighlightSymbol::SelectedMarker);
        assert_abs_diff_eq!(view.center(), latlon!(16.46, 107.59), epsilon = 1e-9);
        assert_abs_diff_eq!(view.scale(), 2000.0, epsilon = 1e-6);
    }

    #[test]
    fn record_without_geometry() {
        let focus = FocusCoordinator::new(2000.0, 1.2);
        let mut view = MapView::new(latlon!(0.0, 0.0), 1000.0);
        let mut overlay = GraphicsLayer::new();

        let record = FeatureRecord::new(FeatureId(1), None);
        assert!(!focus.focus_record(&mut view, &mut overlay, &record));
        assert_matches!(overlay.graphics(), []);
        assert_eq!(view.resolution(), 1000.0);
    }

    #[test]
    fn symbols() {
        let style = HighlightSymbol::SelectedMarker.style();
        assert_eq!(style.marker, Some(MarkerShape::Diamond));
        assert_eq!(style.fill, Color::ORANGE);
        assert_eq!(HighlightSymbol::Buffer.style().fill.to_hex(), "#0000001A");
    }

    #[test]
    fn map_selection_is_visible() {
        let style = HighlightSymbol::HitFeature.style();
        assert_eq!(style.outline, Color::ORANGE);
        assert!(style.outline_width > 0.0);
        assert!(style.fill.opacity() > 0.0 && style.fill.opacity() < 1.0);
    }
}
