use super::math::{EPS7, EPS10, authalic_phi, msfn, qsfn};
use super::{Initialize, Projection, ProjectionParams};
use crate::error::{Error, Result};
use std::f64::consts::FRAC_PI_2;
use std::fmt;

/// Albers Equal-Area Conic, on the sphere or the ellipsoid.
#[derive(Debug, Clone)]
pub struct AlbersEqualArea {
    params: ProjectionParams,
    ellipsoidal: bool,
    e: f64,
    one_es: f64,
    n: f64,
    n2: f64,
    c: f64,
    dd: f64,
    rho0: f64,
    /// Authalic value at the poles.
    ec: f64,
}

impl Initialize for AlbersEqualArea {
    fn initialize(params: ProjectionParams) -> Result<Self> {
        let params = ProjectionParams {
            k_0: 1.0,
            lat_1: params.lat_1,
            lat_2: params.lat_2,
            ..params.without_extras()
        };
        let phi0 = params.lat_0;
        let phi1 = params.lat_1.unwrap_or(0.0);
        let phi2 = params.lat_2.unwrap_or(0.0);
        if phi1.abs() > FRAC_PI_2 || phi2.abs() > FRAC_PI_2 {
            return Err(Error::invalid("standard parallel beyond a pole"));
        }
        if (phi1 + phi2).abs() < EPS10 {
            return Err(Error::invalid("conic lat_1 = -lat_2"));
        }

        let ellipsoid = params.ellipsoid.clone();
        let (es, e, one_es) = (ellipsoid.es(), ellipsoid.e(), ellipsoid.one_es());
        let secant = (phi1 - phi2).abs() >= EPS10;
        let (sinphi, cosphi) = phi1.sin_cos();
        let mut n = sinphi;

        let mut albers = AlbersEqualArea {
            params,
            ellipsoidal: es > 0.0,
            e,
            one_es,
            n: 0.0,
            n2: 0.0,
            c: 0.0,
            dd: 0.0,
            rho0: 0.0,
            ec: 0.0,
        };

        if albers.ellipsoidal {
            let m1 = msfn(sinphi, cosphi, es);
            let ml1 = qsfn(sinphi, e, one_es);
            if secant {
                let (sinphi2, cosphi2) = phi2.sin_cos();
                let m2 = msfn(sinphi2, cosphi2, es);
                let ml2 = qsfn(sinphi2, e, one_es);
                if ml2 == ml1 {
                    return Err(Error::invalid("standard parallels give a degenerate cone"));
                }
                n = (m1 * m1 - m2 * m2) / (ml2 - ml1);
            }
            albers.ec = 1.0 - 0.5 * one_es * ((1.0 - e) / (1.0 + e)).ln() / e;
            albers.c = m1 * m1 + n * ml1;
            albers.dd = 1.0 / n;
            albers.rho0 = albers.dd * (albers.c - n * qsfn(phi0.sin(), e, one_es)).sqrt();
        } else {
            if secant {
                n = 0.5 * (n + phi2.sin());
            }
            albers.n2 = n + n;
            albers.c = cosphi * cosphi + albers.n2 * sinphi;
            albers.dd = 1.0 / n;
            albers.rho0 = albers.dd * (albers.c - albers.n2 * phi0.sin()).sqrt();
        }
        albers.n = n;
        if !albers.rho0.is_finite() {
            return Err(Error::invalid("latitude of origin outside the projection"));
        }
        Ok(albers)
    }
}

impl Projection for AlbersEqualArea {
    fn name(&self) -> &'static str {
        "aea"
    }

    fn params(&self) -> &ProjectionParams {
        &self.params
    }

    fn project(&self, lam: f64, phi: f64) -> Result<(f64, f64)> {
        let q = if self.ellipsoidal {
            self.n * qsfn(phi.sin(), self.e, self.one_es)
        } else {
            self.n2 * phi.sin()
        };
        let rho = self.c - q;
        if rho < 0.0 {
            return Err(Error::invalid(format!(
                "latitude {} outside the projection",
                phi.to_degrees()
            )));
        }
        let rho = self.dd * rho.sqrt();
        let lam = lam * self.n;
        Ok((rho * lam.sin(), self.rho0 - rho * lam.cos()))
    }

    fn project_inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let (mut x, mut y) = (x, self.rho0 - y);
        let mut rho = x.hypot(y);
        if rho == 0.0 {
            let phi = if self.n > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
            return Ok((0.0, phi));
        }
        if self.n < 0.0 {
            rho = -rho;
            x = -x;
            y = -y;
        }
        let mut phi = rho / self.dd;
        if self.ellipsoidal {
            phi = (self.c - phi * phi) / self.n;
            phi = if (self.ec - phi.abs()).abs() > EPS7 {
                authalic_phi(phi, self.e, self.one_es)?
            } else if phi < 0.0 {
                -FRAC_PI_2
            } else {
                FRAC_PI_2
            };
        } else {
            phi = (self.c - phi * phi) / self.n2;
            phi = if phi.abs() <= 1.0 {
                phi.asin()
            } else if phi < 0.0 {
                -FRAC_PI_2
            } else {
                FRAC_PI_2
            };
        }
        Ok((x.atan2(y) / self.n, phi))
    }

    fn has_inverse(&self) -> bool {
        true
    }

    fn is_equal_area(&self) -> bool {
        true
    }
}

impl fmt::Display for AlbersEqualArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Albers Equal Area")
    }
}
