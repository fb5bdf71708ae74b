use crate::cartesian::{CartesianPoint2d, Point2d};
use crate::geo::{Datum, GeoPoint, GeoPoint2d};

/// Maximum latitude representable in Web Mercator.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Spherical Web Mercator projection (EPSG:3857).
#[derive(Debug, Copy, Clone)]
pub struct WebMercator {
    datum: Datum,
}

impl WebMercator {
    /// Creates a new projection on the given datum.
    pub fn new(datum: Datum) -> Self {
        Self { datum }
    }

    /// Projects a geographic point into meters. Returns `None` for points outside of the
    /// projection's latitude range.
    pub fn project(&self, input: &impl GeoPoint) -> Option<Point2d> {
        if input.lat().abs() > MAX_LATITUDE {
            return None;
        }

        let x = self.datum.semimajor() * input.lon_rad();
        let y = self.datum.semimajor()
            * (std::f64::consts::FRAC_PI_4 + input.lat_rad() / 2.0)
                .tan()
                .ln();

        if x.is_finite() && y.is_finite() {
            Some(Point2d::new(x, y))
        } else {
            None
        }
    }

    /// Converts projected meters back into a geographic point.
    pub fn unproject(&self, input: &impl CartesianPoint2d) -> Option<GeoPoint2d> {
        let r = self.datum.semimajor();
        let lat = 2.0 * (input.y() / r).exp().atan() - std::f64::consts::FRAC_PI_2;
        let lon = input.x() / r;

        if lat.is_finite() && lon.is_finite() {
            Some(GeoPoint2d::latlon(lat.to_degrees(), lon.to_degrees()))
        } else {
            None
        }
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new(Datum::WGS84)
    }
}
