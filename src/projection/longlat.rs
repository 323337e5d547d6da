use super::{Initialize, Projection, ProjectionParams, check_finite, check_geodetic};
use crate::coordinate::ProjCoordinate;
use crate::error::Result;
use crate::units::Units;
use std::fmt;

/// Unprojected geographic coordinates. Projected values are longitude and
/// latitude in degrees.
#[derive(Debug, Clone)]
pub struct LongLatProjection {
    params: ProjectionParams,
}

impl Initialize for LongLatProjection {
    fn initialize(params: ProjectionParams) -> Result<Self> {
        let params = ProjectionParams {
            units: Units::degrees(),
            ..ProjectionParams::new(params.ellipsoid)
        };
        Ok(LongLatProjection { params })
    }
}

impl Projection for LongLatProjection {
    fn name(&self) -> &'static str {
        "longlat"
    }

    fn params(&self) -> &ProjectionParams {
        &self.params
    }

    fn project(&self, lam: f64, phi: f64) -> Result<(f64, f64)> {
        Ok((lam, phi))
    }

    fn project_inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok((x, y))
    }

    fn has_inverse(&self) -> bool {
        true
    }

    fn is_geographic(&self) -> bool {
        true
    }

    fn project_radians(&self, coord: &mut ProjCoordinate) -> Result<()> {
        check_geodetic(coord)?;
        coord.x = coord.x.to_degrees();
        coord.y = coord.y.to_degrees();
        Ok(())
    }

    fn inverse_project_radians(&self, coord: &mut ProjCoordinate) -> Result<()> {
        check_finite(coord)?;
        coord.x = coord.x.to_radians();
        coord.y = coord.y.to_radians();
        check_geodetic(coord)
    }
}

impl fmt::Display for LongLatProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lat/Long")
    }
}
