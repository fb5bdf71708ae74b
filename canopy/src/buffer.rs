//! Buffer tool: the region within a distance of the selected feature.

use canopy_types::geo::Datum;
use canopy_types::Geom;
use maybe_sync::{MaybeSend, MaybeSync};

use crate::error::{BufferError, ValidationError};

/// Unit of a buffer distance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LengthUnit {
    /// Meters.
    #[default]
    Meters,
}

impl LengthUnit {
    fn to_meters(self, distance: f64) -> f64 {
        match self {
            LengthUnit::Meters => distance,
        }
    }
}

/// Computes buffer geometries.
pub trait BufferService: MaybeSend + MaybeSync {
    /// Region within `distance` of the geometry.
    fn buffer(&self, geometry: &Geom, distance: f64, unit: LengthUnit)
        -> Result<Geom, BufferError>;
}

/// Buffers measured along the surface of the Earth.
#[derive(Debug, Copy, Clone)]
pub struct GeodesicBufferService {
    segments: usize,
    datum: Datum,
}

impl GeodesicBufferService {
    /// Creates a service approximating circles with `segments` sides.
    pub fn new(segments: usize) -> Self {
        Self {
            segments,
            datum: Datum::WGS84,
        }
    }
}

impl Default for GeodesicBufferService {
    fn default() -> Self {
        Self::new(64)
    }
}

impl BufferService for GeodesicBufferService {
    fn buffer(
        &self,
        geometry: &Geom,
        distance: f64,
        unit: LengthUnit,
    ) -> Result<Geom, BufferError> {
        let meters = unit.to_meters(distance);
        if !meters.is_finite() || meters <= 0.0 {
            return Err(BufferError::InvalidDistance(distance));
        }

        Ok(Geom::Polygon(geometry.geodesic_buffer(
            meters,
            self.segments,
            &self.datum,
        )?))
    }
}

/// Parses the buffer distance typed by the user.
pub fn parse_buffer_distance(input: &str) -> Result<f64, ValidationError> {
    let input = input.trim();
    let distance: f64 = input
        .parse()
        .map_err(|_| ValidationError::InvalidDistance(input.to_string()))?;

    if !distance.is_finite() {
        return Err(ValidationError::InvalidDistance(input.to_string()));
    }
    if distance <= 0.0 {
        return Err(ValidationError::NonPositiveDistance(distance));
    }

    Ok(distance)
}
