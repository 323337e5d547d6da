use super::math::EPS10;
use super::{Initialize, Projection, ProjectionParams};
use crate::error::{Error, Result};
use std::f64::consts::FRAC_PI_2;
use std::fmt;

/// Sinusoidal (Sanson-Flamsteed), a pseudo-cylindrical equal-area projection.
#[derive(Debug, Clone)]
pub struct Sinusoidal {
    params: ProjectionParams,
}

impl Initialize for Sinusoidal {
    fn initialize(params: ProjectionParams) -> Result<Self> {
        let params = ProjectionParams {
            lat_0: 0.0,
            k_0: 1.0,
            ..params.without_extras()
        };
        Ok(Sinusoidal { params })
    }
}

impl Projection for Sinusoidal {
    fn name(&self) -> &'static str {
        "sinu"
    }

    fn params(&self) -> &ProjectionParams {
        &self.params
    }

    fn project(&self, lam: f64, phi: f64) -> Result<(f64, f64)> {
        Ok((lam * phi.cos(), phi))
    }

    fn project_inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if y.abs() > FRAC_PI_2 - EPS10 {
            return Err(Error::invalid(format!(
                "sinusoidal inverse undefined at latitude {}",
                y.to_degrees()
            )));
        }
        Ok((x / y.cos(), y))
    }

    fn has_inverse(&self) -> bool {
        true
    }

    fn is_equal_area(&self) -> bool {
        true
    }
}

impl fmt::Display for Sinusoidal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sinusoidal")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ellipsoid::Ellipsoid;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    fn sinusoidal() -> Sinusoidal {
        let ellipsoid = Arc::new(Ellipsoid::wgs84());
        Sinusoidal::initialize(ProjectionParams::new(ellipsoid)).unwrap()
    }

    #[test]
    fn test_origin() {
        let proj = sinusoidal();
        assert_eq!(proj.project(0.0, 0.0).unwrap(), (0.0, 0.0));
        assert_eq!(proj.project_inverse(0.0, 0.0).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_round_trip() {
        let proj = sinusoidal();
        for (lam, phi) in [(2.5, 1.5), (-3.1, -1.2), (0.7, 0.0), (-0.2, 1.570_796)] {
            let (x, y) = proj.project(lam, phi).unwrap();
            let (lam2, phi2) = proj.project_inverse(x, y).unwrap();
            assert_abs_diff_eq!(lam2, lam, epsilon = 1e-12);
            assert_abs_diff_eq!(phi2, phi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_inverse_at_pole_is_invalid() {
        let proj = sinusoidal();
        assert!(matches!(
            proj.project_inverse(0.0, FRAC_PI_2),
            Err(Error::InvalidValue(_))
        ));
        assert!(matches!(
            proj.project_inverse(0.1, -FRAC_PI_2),
            Err(Error::InvalidValue(_))
        ));
        assert!(proj.project_inverse(0.1, 2.0).is_err());
    }

    #[test]
    fn test_metadata() {
        let proj = sinusoidal();
        assert!(proj.has_inverse());
        assert!(proj.is_equal_area());
        assert!(!proj.is_geographic());
        assert_eq!(proj.to_string(), "Sinusoidal");
    }
}
