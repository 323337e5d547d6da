//! Map projections.
//!
//! Every algorithm implements [`Projection`]. Instances are created once through
//! [`Initialize::initialize`], which precomputes the algorithm's constants, and are
//! immutable afterwards, so a single instance may be shared between threads and
//! between any number of coordinate reference systems.
mod albers;
mod geocent;
mod longlat;
pub(crate) mod math;
mod mercator;
mod sinusoidal;
mod transverse_mercator;

pub use albers::AlbersEqualArea;
pub use geocent::{GeocentricConverter, GeocentricProjection};
pub use longlat::LongLatProjection;
pub use math::normalize_longitude;
pub use mercator::Mercator;
pub use sinusoidal::Sinusoidal;
pub use transverse_mercator::TransverseMercator;

use crate::coordinate::ProjCoordinate;
use crate::ellipsoid::Ellipsoid;
use crate::error::{Error, Result};
use crate::units::Units;
use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::sync::Arc;

/// Latitudes this far past a pole are still accepted as the pole.
pub(crate) const LATITUDE_SLACK: f64 = 1e-12;

/// Parameters common to all projections. Angles are in radians and the false
/// origin in metres, whatever the output units.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParams {
    pub ellipsoid: Arc<Ellipsoid>,
    pub units: Units,
    /// Latitude of origin.
    pub lat_0: f64,
    /// Central meridian.
    pub lon_0: f64,
    /// False easting.
    pub x_0: f64,
    /// False northing.
    pub y_0: f64,
    /// Scale factor on the central line.
    pub k_0: f64,
    /// First standard parallel.
    pub lat_1: Option<f64>,
    /// Second standard parallel.
    pub lat_2: Option<f64>,
    /// Latitude of true scale.
    pub lat_ts: Option<f64>,
    pub zone: Option<u32>,
    pub south: bool,
}

impl ProjectionParams {
    pub fn new(ellipsoid: Arc<Ellipsoid>) -> Self {
        ProjectionParams {
            ellipsoid,
            units: Units::metres(),
            lat_0: 0.0,
            lon_0: 0.0,
            x_0: 0.0,
            y_0: 0.0,
            k_0: 1.0,
            lat_1: None,
            lat_2: None,
            lat_ts: None,
            zone: None,
            south: false,
        }
    }

    /// Clear the standard parallels, latitude of true scale and UTM settings,
    /// which only some projections read.
    pub(crate) fn without_extras(self) -> Self {
        ProjectionParams {
            lat_1: None,
            lat_2: None,
            lat_ts: None,
            zone: None,
            south: false,
            ..self
        }
    }
}

/// A forward/inverse mapping between geodetic and projected coordinates.
pub trait Projection: fmt::Debug + fmt::Display + Send + Sync {
    /// Registry mnemonic, e.g. `sinu`.
    fn name(&self) -> &'static str;

    fn params(&self) -> &ProjectionParams;

    /// Project `(lam, phi)`, in radians relative to the central meridian, onto a
    /// unit semi-major axis.
    fn project(&self, lam: f64, phi: f64) -> Result<(f64, f64)>;

    /// Recover `(lam, phi)` in radians relative to the central meridian from
    /// coordinates on a unit semi-major axis.
    fn project_inverse(&self, x: f64, y: f64) -> Result<(f64, f64)>;

    fn has_inverse(&self) -> bool {
        false
    }

    fn is_equal_area(&self) -> bool {
        false
    }

    fn is_geographic(&self) -> bool {
        false
    }

    fn ellipsoid(&self) -> &Arc<Ellipsoid> {
        &self.params().ellipsoid
    }

    fn units(&self) -> &Units {
        &self.params().units
    }

    /// Project a geodetic coordinate (absolute longitude and latitude in
    /// radians) in place, into this projection's units including false origin.
    fn project_radians(&self, coord: &mut ProjCoordinate) -> Result<()> {
        check_geodetic(coord)?;
        let p = self.params();
        let lam = normalize_longitude(coord.x - p.lon_0);
        let (x, y) = self.project(lam, coord.y)?;
        let from_meter = p.units.from_meter();
        let scale = p.ellipsoid.a() * from_meter;
        coord.x = scale * x + p.x_0 * from_meter;
        coord.y = scale * y + p.y_0 * from_meter;
        Ok(())
    }

    /// Inverse of [`Projection::project_radians`].
    fn inverse_project_radians(&self, coord: &mut ProjCoordinate) -> Result<()> {
        if !self.has_inverse() {
            return Err(Error::unsupported(format!(
                "{} projection has no inverse",
                self.name()
            )));
        }
        check_finite(coord)?;
        let p = self.params();
        let to_meter = p.units.to_meter();
        let a = p.ellipsoid.a();
        let x = (coord.x * to_meter - p.x_0) / a;
        let y = (coord.y * to_meter - p.y_0) / a;
        let (lam, phi) = self.project_inverse(x, y)?;
        coord.x = normalize_longitude(lam + p.lon_0);
        coord.y = phi;
        Ok(())
    }

    /// Same algorithm, ellipsoid, units and the parameters the algorithm reads.
    /// Each projection resets the parameters it ignores when initialized.
    fn is_equal(&self, other: &dyn Projection) -> bool {
        self.name() == other.name() && self.params() == other.params()
    }
}

impl PartialEq for dyn Projection + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

/// Construction of a projection from its parameters.
pub trait Initialize: Sized {
    /// Validate `params` and precompute the algorithm's constants.
    fn initialize(params: ProjectionParams) -> Result<Self>;
}

/// Builds a ready-to-use projection; what the [`Registry`](crate::Registry)
/// stores for each mnemonic.
pub type ProjectionFactory = fn(ProjectionParams) -> Result<Arc<dyn Projection>>;

/// A [`ProjectionFactory`] for any initializable projection.
pub fn factory<P>(params: ProjectionParams) -> Result<Arc<dyn Projection>>
where
    P: Projection + Initialize + 'static,
{
    Ok(Arc::new(P::initialize(params)?))
}

pub(crate) fn check_finite(coord: &ProjCoordinate) -> Result<()> {
    if coord.x.is_finite() && coord.y.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid(format!(
            "non-finite coordinate ({}, {})",
            coord.x, coord.y
        )))
    }
}

pub(crate) fn check_geodetic(coord: &ProjCoordinate) -> Result<()> {
    check_finite(coord)?;
    if coord.y.abs() > FRAC_PI_2 + LATITUDE_SLACK {
        return Err(Error::invalid(format!(
            "latitude {} outside [-90, 90] degrees",
            coord.y.to_degrees()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sphere() -> Arc<Ellipsoid> {
        Arc::new(Ellipsoid::sphere("sphere", "Normal Sphere", 6370997.0).unwrap())
    }

    #[test]
    fn test_equality_uses_family_and_parameters() {
        let params = ProjectionParams::new(sphere());
        let a: Arc<dyn Projection> = factory::<Sinusoidal>(params.clone()).unwrap();
        let b: Arc<dyn Projection> = factory::<Sinusoidal>(params.clone()).unwrap();
        let c: Arc<dyn Projection> = factory::<Mercator>(params.clone()).unwrap();
        assert!(*a == *b);
        assert!(*a != *c);

        let mut shifted = params.clone();
        shifted.lon_0 = 0.1;
        let d = factory::<Sinusoidal>(shifted).unwrap();
        assert!(*a != *d);

        let mut feet = params;
        feet.units = Units::new("ft", 0.3048);
        let e = factory::<Sinusoidal>(feet).unwrap();
        assert!(*a != *e);
    }

    #[test]
    fn test_equality_ignores_unread_parameters() {
        let params = ProjectionParams::new(sphere());
        let sinu = factory::<Sinusoidal>(params.clone()).unwrap();
        let mut parallels = params.clone();
        parallels.lat_1 = Some(0.2);
        parallels.lat_ts = Some(0.3);
        parallels.lat_0 = 0.4;
        parallels.zone = Some(12);
        assert!(*sinu == *factory::<Sinusoidal>(parallels.clone()).unwrap());

        let tmerc = factory::<TransverseMercator>(params.clone()).unwrap();
        assert!(*tmerc == *factory::<TransverseMercator>(ProjectionParams {
            lat_0: 0.0,
            ..parallels.clone()
        })
        .unwrap());
        assert!(*tmerc != *factory::<TransverseMercator>(parallels.clone()).unwrap());

        let geocent = factory::<GeocentricProjection>(params).unwrap();
        assert!(*geocent == *factory::<GeocentricProjection>(parallels).unwrap());
    }

    #[test]
    fn test_latitude_out_of_range() {
        let proj = factory::<Sinusoidal>(ProjectionParams::new(sphere())).unwrap();
        let mut coord = ProjCoordinate::new(0.0, 1.6);
        assert!(matches!(
            proj.project_radians(&mut coord),
            Err(Error::InvalidValue(_))
        ));
        let mut coord = ProjCoordinate::new(f64::NAN, 0.0);
        assert!(proj.project_radians(&mut coord).is_err());
    }

    #[test]
    fn test_false_origin_and_units() {
        let mut params = ProjectionParams::new(sphere());
        params.x_0 = 1000.0;
        params.y_0 = 2000.0;
        params.units = Units::new("km", 1000.0);
        let proj = factory::<Sinusoidal>(params).unwrap();
        let mut coord = ProjCoordinate::new(0.0, 0.0);
        proj.project_radians(&mut coord).unwrap();
        assert_abs_diff_eq!(coord.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(coord.y, 2.0, epsilon = 1e-12);
        proj.inverse_project_radians(&mut coord).unwrap();
        assert_abs_diff_eq!(coord.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(coord.y, 0.0, epsilon = 1e-12);
    }
}
