use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use crate::cartesian::CartesianPoint2d;
use crate::geo::Datum;

/// Point on the surface of the ellipsoid.
pub trait GeoPoint {
    /// Latitude in degrees.
    fn lat(&self) -> f64;
    /// Longitude in degrees.
    fn lon(&self) -> f64;

    /// Latitude in radians.
    fn lat_rad(&self) -> f64 {
        self.lat().to_radians()
    }

    /// Longitude in radians.
    fn lon_rad(&self) -> f64 {
        self.lon().to_radians()
    }

    /// Great-circle distance in meters (haversine formula on the datum's mean sphere).
    fn distance(&self, other: &impl GeoPoint, datum: &Datum) -> f64 {
        let d_lat = other.lat_rad() - self.lat_rad();
        let d_lon = other.lon_rad() - self.lon_rad();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat_rad().cos() * other.lat_rad().cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * datum.mean_radius() * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// 2d point on the surface of the Earth.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct GeoPoint2d {
    lat: f64,
    lon: f64,
}

impl GeoPoint2d {
    /// Creates a point from latitude and longitude in degrees.
    pub const fn latlon(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Creates a point from longitude and latitude in degrees.
    pub const fn lonlat(lon: f64, lat: f64) -> Self {
        Self { lat, lon }
    }

    /// Point reached by travelling `distance` meters from this point along the great circle with
    /// the initial `bearing` (degrees clockwise from north).
    pub fn destination(&self, bearing: f64, distance: f64, datum: &Datum) -> Self {
        let angular = distance / datum.mean_radius();
        let bearing = bearing.to_radians();
        let lat1 = self.lat_rad();
        let lon1 = self.lon_rad();

        let lat2 =
            (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());

        // Normalize longitude to [-180, 180).
        let lon2 = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
        Self::latlon(lat2.to_degrees(), lon2)
    }
}

impl GeoPoint for GeoPoint2d {
    fn lat(&self) -> f64 {
        self.lat
    }

    fn lon(&self) -> f64 {
        self.lon
    }
}

impl CartesianPoint2d for GeoPoint2d {
    fn x(&self) -> f64 {
        self.lon
    }

    fn y(&self) -> f64 {
        self.lat
    }
}

impl AbsDiffEq for GeoPoint2d {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.lat.abs_diff_eq(&other.lat, epsilon) && self.lon.abs_diff_eq(&other.lon, epsilon)
    }
}

/// Creates a new GeoPoint2d from latitude and longitude values (in degrees).
///
/// ```
/// use canopy_types::geo::GeoPoint;
/// use canopy_types::latlon;
///
/// let point = latlon!(16.46, 107.59);
/// assert_eq!(point.lat(), 16.46);
/// ```
#[macro_export]
macro_rules! latlon {
    ($lat:expr, $lon:expr) => {
        $crate::geo::GeoPoint2d::latlon($lat, $lon)
    };
}
