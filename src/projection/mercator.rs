use super::math::{EPS10, msfn, phi2, tsfn};
use super::{Initialize, Projection, ProjectionParams};
use crate::error::{Error, Result};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::fmt;

/// Normal-aspect Mercator, on the sphere or the ellipsoid.
#[derive(Debug, Clone)]
pub struct Mercator {
    params: ProjectionParams,
    ellipsoidal: bool,
    e: f64,
    k0: f64,
}

impl Initialize for Mercator {
    fn initialize(params: ProjectionParams) -> Result<Self> {
        let params = ProjectionParams {
            lat_0: 0.0,
            k_0: if params.lat_ts.is_some() { 1.0 } else { params.k_0 },
            lat_ts: params.lat_ts,
            ..params.without_extras()
        };
        let ellipsoidal = !params.ellipsoid.is_sphere();
        let e = params.ellipsoid.e();
        let k0 = match params.lat_ts {
            Some(lat_ts) => {
                let phits = lat_ts.abs();
                if phits >= FRAC_PI_2 {
                    return Err(Error::invalid("lat_ts larger than 90 degrees"));
                }
                let (s, c) = phits.sin_cos();
                if ellipsoidal {
                    msfn(s, c, params.ellipsoid.es())
                } else {
                    c
                }
            }
            None => params.k_0,
        };
        if !(k0 > 0.0) {
            return Err(Error::invalid(format!("scale factor {k0} must be positive")));
        }
        Ok(Mercator {
            params,
            ellipsoidal,
            e,
            k0,
        })
    }
}

impl Projection for Mercator {
    fn name(&self) -> &'static str {
        "merc"
    }

    fn params(&self) -> &ProjectionParams {
        &self.params
    }

    fn project(&self, lam: f64, phi: f64) -> Result<(f64, f64)> {
        if (phi.abs() - FRAC_PI_2).abs() <= EPS10 {
            return Err(Error::invalid("Mercator is unbounded at the poles"));
        }
        let y = if self.ellipsoidal {
            -(tsfn(phi, phi.sin(), self.e)).ln()
        } else {
            (FRAC_PI_4 + 0.5 * phi).tan().ln()
        };
        Ok((self.k0 * lam, self.k0 * y))
    }

    fn project_inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let ts = (-y / self.k0).exp();
        let phi = if self.ellipsoidal {
            phi2(ts, self.e)?
        } else {
            FRAC_PI_2 - 2.0 * ts.atan()
        };
        Ok((x / self.k0, phi))
    }

    fn has_inverse(&self) -> bool {
        true
    }
}

impl fmt::Display for Mercator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mercator")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coordinate::ProjCoordinate;
    use crate::ellipsoid::Ellipsoid;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    #[test]
    fn test_web_mercator() {
        let sphere = Ellipsoid::sphere("a=6378137", "", 6378137.0).unwrap();
        let proj = Mercator::initialize(ProjectionParams::new(Arc::new(sphere))).unwrap();
        let mut coord = ProjCoordinate::new(180f64.to_radians(), 0.0);
        proj.project_radians(&mut coord).unwrap();
        assert_abs_diff_eq!(coord.x, 20_037_508.342_789_244, epsilon = 1e-6);
        assert_abs_diff_eq!(coord.y, 0.0, epsilon = 1e-9);

        let mut coord = ProjCoordinate::new(10f64.to_radians(), 45f64.to_radians());
        proj.project_radians(&mut coord).unwrap();
        proj.inverse_project_radians(&mut coord).unwrap();
        assert_abs_diff_eq!(coord.x, 10f64.to_radians(), epsilon = 1e-12);
        assert_abs_diff_eq!(coord.y, 45f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn test_ellipsoidal_round_trip() {
        let proj = Mercator::initialize(ProjectionParams::new(Arc::new(Ellipsoid::wgs84())))
            .unwrap();
        for (lam, phi) in [(0.2, 1.3), (-1.0, -0.6), (3.0, 0.0)] {
            let (x, y) = proj.project(lam, phi).unwrap();
            let (lam2, phi2) = proj.project_inverse(x, y).unwrap();
            assert_abs_diff_eq!(lam2, lam, epsilon = 1e-12);
            assert_abs_diff_eq!(phi2, phi, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_pole_is_invalid() {
        let proj = Mercator::initialize(ProjectionParams::new(Arc::new(Ellipsoid::wgs84())))
            .unwrap();
        assert!(matches!(
            proj.project(0.0, FRAC_PI_2),
            Err(Error::InvalidValue(_))
        ));
    }

    #[test]
    fn test_latitude_of_true_scale() {
        let sphere = Ellipsoid::sphere("sphere", "", 6370997.0).unwrap();
        let mut params = ProjectionParams::new(Arc::new(sphere));
        params.lat_ts = Some(60f64.to_radians());
        let proj = Mercator::initialize(params.clone()).unwrap();
        let (x, _) = proj.project(1.0, 0.0).unwrap();
        assert_abs_diff_eq!(x, 0.5, epsilon = 1e-12);

        params.lat_ts = Some(FRAC_PI_2);
        assert!(Mercator::initialize(params).is_err());
    }
}
