use super::math::{EPS10, enfn, inv_mlfn, mlfn, normalize_longitude};
use super::{Initialize, LATITUDE_SLACK, Projection, ProjectionParams};
use crate::error::{Error, Result};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

const FC1: f64 = 1.0;
const FC2: f64 = 0.5;
const FC3: f64 = 1.0 / 6.0;
const FC4: f64 = 1.0 / 12.0;
const FC5: f64 = 0.05;
const FC6: f64 = 1.0 / 30.0;
const FC7: f64 = 1.0 / 42.0;
const FC8: f64 = 1.0 / 56.0;

/// Transverse Mercator (Gauss-Krüger) by series expansion, and UTM built on it.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    name: &'static str,
    params: ProjectionParams,
    ellipsoidal: bool,
    es: f64,
    /// Second eccentricity squared; on the sphere, the scale factor.
    esp: f64,
    /// Meridional distance to the latitude of origin; on the sphere, half the scale factor.
    ml0: f64,
    en: [f64; 5],
}

impl TransverseMercator {
    fn with_name(name: &'static str, params: ProjectionParams) -> Result<Self> {
        let k0 = params.k_0;
        if !(k0 > 0.0) {
            return Err(Error::invalid(format!("scale factor {k0} must be positive")));
        }
        if params.lat_0.abs() > FRAC_PI_2 + LATITUDE_SLACK {
            return Err(Error::invalid("latitude of origin beyond a pole"));
        }
        let es = params.ellipsoid.es();
        let ellipsoidal = es > 0.0;
        let en = enfn(es);
        let (esp, ml0) = if ellipsoidal {
            let (s, c) = params.lat_0.sin_cos();
            (es / (1.0 - es), mlfn(params.lat_0, s, c, &en))
        } else {
            (k0, 0.5 * k0)
        };
        Ok(TransverseMercator {
            name,
            params,
            ellipsoidal,
            es,
            esp,
            ml0,
            en,
        })
    }

    /// Universal Transverse Mercator. The zone comes from `zone`, or failing
    /// that from the central meridian; `south` moves the false northing.
    pub fn utm(mut params: ProjectionParams) -> Result<Self> {
        let zone = match params.zone {
            Some(zone) if (1..=60).contains(&zone) => zone,
            Some(zone) => return Err(Error::invalid(format!("UTM zone {zone} outside 1..=60"))),
            None => {
                let guess = ((normalize_longitude(params.lon_0) + PI) * 30.0 / PI).floor() as u32;
                guess.clamp(0, 59) + 1
            }
        };
        params.zone = Some(zone);
        params.lon_0 = ((f64::from(zone) - 0.5) * 6.0 - 180.0).to_radians();
        params.lat_0 = 0.0;
        params.k_0 = 0.9996;
        params.x_0 = 500_000.0;
        params.y_0 = if params.south { 10_000_000.0 } else { 0.0 };
        let params = ProjectionParams {
            zone: params.zone,
            south: params.south,
            ..params.without_extras()
        };
        Self::with_name("utm", params)
    }

    fn project_ellipsoidal(&self, lam: f64, phi: f64) -> Result<(f64, f64)> {
        if !(-FRAC_PI_2..=FRAC_PI_2).contains(&lam) {
            return Err(Error::invalid(format!(
                "longitude {} too far from the central meridian",
                lam.to_degrees()
            )));
        }
        let k0 = self.params.k_0;
        let (sinphi, cosphi) = phi.sin_cos();
        let mut t = if cosphi.abs() > 1e-10 {
            sinphi / cosphi
        } else {
            0.0
        };
        t *= t;
        let mut al = cosphi * lam;
        let als = al * al;
        al /= (1.0 - self.es * sinphi * sinphi).sqrt();
        let n = self.esp * cosphi * cosphi;
        let x = k0
            * al
            * (FC1
                + FC3
                    * als
                    * (1.0 - t
                        + n
                        + FC5
                            * als
                            * (5.0 + t * (t - 18.0) + n * (14.0 - 58.0 * t)
                                + FC7 * als * (61.0 + t * (t * (179.0 - t) - 479.0)))));
        let y = k0
            * (mlfn(phi, sinphi, cosphi, &self.en) - self.ml0
                + sinphi
                    * al
                    * lam
                    * FC2
                    * (1.0
                        + FC4
                            * als
                            * (5.0 - t
                                + n * (9.0 + 4.0 * n)
                                + FC6
                                    * als
                                    * (61.0 + t * (t - 58.0) + n * (270.0 - 330.0 * t)
                                        + FC8
                                            * als
                                            * (1385.0 + t * (t * (543.0 - t) - 3111.0))))));
        Ok((x, y))
    }

    fn project_inverse_ellipsoidal(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let k0 = self.params.k_0;
        let phi = inv_mlfn(self.ml0 + y / k0, self.es, &self.en)?;
        if phi.abs() >= FRAC_PI_2 {
            let phi = if y < 0.0 { -FRAC_PI_2 } else { FRAC_PI_2 };
            return Ok((0.0, phi));
        }
        let (sinphi, cosphi) = phi.sin_cos();
        let mut t = if cosphi.abs() > 1e-10 {
            sinphi / cosphi
        } else {
            0.0
        };
        let n = self.esp * cosphi * cosphi;
        let mut con = 1.0 - self.es * sinphi * sinphi;
        let d = x * con.sqrt() / k0;
        con *= t;
        t *= t;
        let ds = d * d;
        let phi = phi
            - (con * ds / (1.0 - self.es))
                * FC2
                * (1.0
                    - ds * FC4
                        * (5.0 + t * (3.0 - 9.0 * n) + n * (1.0 - 4.0 * n)
                            - ds * FC6
                                * (61.0 + t * (90.0 - 252.0 * n + 45.0 * t) + 46.0 * n
                                    - ds * FC8
                                        * (1385.0 + t * (3633.0 + t * (4095.0 + 1575.0 * t))))));
        let lam = d
            * (FC1
                - ds * FC3
                    * (1.0 + 2.0 * t + n
                        - ds * FC5
                            * (5.0 + t * (28.0 + 24.0 * t + 8.0 * n) + 6.0 * n
                                - ds * FC7 * (61.0 + t * (662.0 + t * (1320.0 + 720.0 * t))))))
            / cosphi;
        Ok((lam, phi))
    }

    fn project_spherical(&self, lam: f64, phi: f64) -> Result<(f64, f64)> {
        let cosphi = phi.cos();
        let b = cosphi * lam.sin();
        if (b.abs() - 1.0).abs() <= EPS10 {
            return Err(Error::invalid("point is 90 degrees from the central meridian"));
        }
        let x = self.ml0 * ((1.0 + b) / (1.0 - b)).ln();
        let mut y = cosphi * lam.cos() / (1.0 - b * b).sqrt();
        let b = y.abs();
        if b >= 1.0 {
            if b - 1.0 > EPS10 {
                return Err(Error::invalid("point outside the projection"));
            }
            y = 0.0;
        } else {
            y = y.acos();
        }
        if phi < 0.0 {
            y = -y;
        }
        Ok((x, self.esp * (y - self.params.lat_0)))
    }

    fn project_inverse_spherical(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let h = (x / self.esp).exp();
        let g = 0.5 * (h - 1.0 / h);
        let d = self.params.lat_0 + y / self.esp;
        let h = d.cos();
        let mut phi = ((1.0 - h * h) / (1.0 + g * g)).sqrt().asin();
        if d < 0.0 {
            phi = -phi;
        }
        let lam = if g != 0.0 || h != 0.0 { g.atan2(h) } else { 0.0 };
        Ok((lam, phi))
    }
}

impl Initialize for TransverseMercator {
    fn initialize(params: ProjectionParams) -> Result<Self> {
        Self::with_name("tmerc", params.without_extras())
    }
}

impl Projection for TransverseMercator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn params(&self) -> &ProjectionParams {
        &self.params
    }

    fn project(&self, lam: f64, phi: f64) -> Result<(f64, f64)> {
        if self.ellipsoidal {
            self.project_ellipsoidal(lam, phi)
        } else {
            self.project_spherical(lam, phi)
        }
    }

    fn project_inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if self.ellipsoidal {
            self.project_inverse_ellipsoidal(x, y)
        } else {
            self.project_inverse_spherical(x, y)
        }
    }

    fn has_inverse(&self) -> bool {
        true
    }
}

impl fmt::Display for TransverseMercator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            "utm" => write!(f, "Universal Transverse Mercator"),
            _ => write!(f, "Transverse Mercator"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coordinate::ProjCoordinate;
    use crate::ellipsoid::Ellipsoid;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    fn clrk66() -> Arc<Ellipsoid> {
        Arc::new(Ellipsoid::from_semi_minor("clrk66", "Clarke 1866", 6378206.4, 6356583.8).unwrap())
    }

    #[test]
    fn test_utm_south() {
        let mut params = ProjectionParams::new(clrk66());
        params.zone = Some(36);
        params.south = true;
        let proj = TransverseMercator::utm(params).unwrap();
        assert_eq!(proj.name(), "utm");
        let mut coord = ProjCoordinate::new(33.115f64.to_radians(), (-19.14f64).to_radians());
        proj.project_radians(&mut coord).unwrap();
        assert_abs_diff_eq!(coord.x, 512_093.765_437, epsilon = 1e-5);
        assert_abs_diff_eq!(coord.y, 7_883_804.406_911, epsilon = 1e-5);
        proj.inverse_project_radians(&mut coord).unwrap();
        assert_abs_diff_eq!(coord.x, 33.115f64.to_radians(), epsilon = 1e-11);
        assert_abs_diff_eq!(coord.y, (-19.14f64).to_radians(), epsilon = 1e-11);
    }

    #[test]
    fn test_utm_zone_from_meridian() {
        let mut params = ProjectionParams::new(clrk66());
        params.lon_0 = (-123f64).to_radians();
        let proj = TransverseMercator::utm(params).unwrap();
        assert_eq!(proj.params().zone, Some(10));

        let mut params = ProjectionParams::new(clrk66());
        params.zone = Some(61);
        assert!(TransverseMercator::utm(params).is_err());
    }

    #[test]
    fn test_spherical_round_trip() {
        let sphere = Ellipsoid::sphere("sphere", "", 6370997.0).unwrap();
        let mut params = ProjectionParams::new(Arc::new(sphere));
        params.lat_0 = 0.5;
        let proj = TransverseMercator::initialize(params).unwrap();
        for (lam, phi) in [(0.1, 0.6), (-0.3, -0.2), (0.0, 0.5)] {
            let (x, y) = proj.project(lam, phi).unwrap();
            let (lam2, phi2) = proj.project_inverse(x, y).unwrap();
            assert_abs_diff_eq!(lam2, lam, epsilon = 1e-12);
            assert_abs_diff_eq!(phi2, phi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_out_of_range() {
        let proj = TransverseMercator::initialize(ProjectionParams::new(clrk66())).unwrap();
        assert!(matches!(
            proj.project(2.0, 0.0),
            Err(Error::InvalidValue(_))
        ));
        assert!(matches!(
            proj.project_inverse(0.0, f64::NAN),
            Err(Error::ConvergenceFailure(_))
        ));

        let mut params = ProjectionParams::new(clrk66());
        params.lat_0 = 1.6;
        assert!(matches!(
            TransverseMercator::initialize(params),
            Err(Error::InvalidValue(_))
        ));
    }
}
