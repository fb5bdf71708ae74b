/// Parameters of the ellipsoid the geographic coordinates refer to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datum {
    semimajor: f64,
    inv_flattening: f64,
}

impl Datum {
    /// World Geodetic System 1984.
    pub const WGS84: Self = Datum {
        semimajor: 6_378_137.0,
        inv_flattening: 298.257223563,
    };

    /// Semimajor axis in meters.
    pub fn semimajor(&self) -> f64 {
        self.semimajor
    }

    /// Inverse flattening.
    pub fn inv_flattening(&self) -> f64 {
        self.inv_flattening
    }

    /// Radius of the sphere used for great-circle calculations: the mean of the three semi-axes.
    pub fn mean_radius(&self) -> f64 {
        let semiminor = self.semimajor * (1.0 - 1.0 / self.inv_flattening);
        (2.0 * self.semimajor + semiminor) / 3.0
    }
}

impl Default for Datum {
    fn default() -> Self {
        Self::WGS84
    }
}
