use super::{Initialize, Projection, ProjectionParams, check_finite, check_geodetic};
use crate::coordinate::ProjCoordinate;
use crate::ellipsoid::Ellipsoid;
use crate::error::{Error, Result};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;

const GENAU: f64 = 1e-12;
const GENAU2: f64 = GENAU * GENAU;
const MAX_ITER: usize = 30;

/// Converts between geodetic and earth-centred cartesian coordinates on one ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeocentricConverter {
    a: f64,
    b: f64,
    es: f64,
}

impl GeocentricConverter {
    pub fn new(ellipsoid: &Ellipsoid) -> Self {
        GeocentricConverter {
            a: ellipsoid.a(),
            b: ellipsoid.b(),
            es: ellipsoid.es(),
        }
    }

    /// `(lon, lat)` in radians and ellipsoidal height `h` in metres to `[X, Y, Z]`.
    pub fn geodetic_to_geocentric(&self, lon: f64, lat: f64, h: f64) -> Result<[f64; 3]> {
        let lat = if lat < -FRAC_PI_2 && lat > -1.001 * FRAC_PI_2 {
            -FRAC_PI_2
        } else if lat > FRAC_PI_2 && lat < 1.001 * FRAC_PI_2 {
            FRAC_PI_2
        } else if !(-FRAC_PI_2..=FRAC_PI_2).contains(&lat) {
            return Err(Error::invalid(format!(
                "latitude {} outside [-90, 90] degrees",
                lat.to_degrees()
            )));
        } else {
            lat
        };
        let lon = if lon > PI { lon - TAU } else { lon };

        let (sin_lat, cos_lat) = lat.sin_cos();
        let rn = self.a / (1.0 - self.es * sin_lat * sin_lat).sqrt();
        Ok([
            (rn + h) * cos_lat * lon.cos(),
            (rn + h) * cos_lat * lon.sin(),
            (rn * (1.0 - self.es) + h) * sin_lat,
        ])
    }

    /// `[X, Y, Z]` to `(lon, lat, h)`, iterating on latitude for full height accuracy.
    pub fn geocentric_to_geodetic(&self, xyz: [f64; 3]) -> Result<(f64, f64, f64)> {
        let [x, y, z] = xyz;
        let p = x.hypot(y);
        let rr = (x * x + y * y + z * z).sqrt();

        let lon = if p / self.a < GENAU {
            if rr / self.a < GENAU {
                // earth's centre
                return Ok((0.0, FRAC_PI_2, -self.b));
            }
            0.0
        } else {
            y.atan2(x)
        };

        let ct = z / rr;
        let st = p / rr;
        let rx = 1.0 / (1.0 - self.es * (2.0 - self.es) * st * st).sqrt();
        let mut cphi0 = st * (1.0 - self.es) * rx;
        let mut sphi0 = ct * rx;

        for _ in 0..MAX_ITER {
            let rn = self.a / (1.0 - self.es * sphi0 * sphi0).sqrt();
            let h = p * cphi0 + z * sphi0 - rn * (1.0 - self.es * sphi0 * sphi0);
            let rk = self.es * rn / (rn + h);
            let rx = 1.0 / (1.0 - rk * (2.0 - rk) * st * st).sqrt();
            let cphi = st * (1.0 - rk) * rx;
            let sphi = ct * rx;
            let sdphi = sphi * cphi0 - cphi * sphi0;
            cphi0 = cphi;
            sphi0 = sphi;
            if sdphi * sdphi <= GENAU2 {
                return Ok((lon, (sphi / cphi.abs()).atan(), h));
            }
        }
        Err(Error::convergence(format!(
            "geodetic latitude of ({x}, {y}, {z}) after {MAX_ITER} iterations"
        )))
    }
}

/// Earth-centred, earth-fixed cartesian coordinates. The `z` ordinate of a
/// coordinate carries the ellipsoidal height on the geodetic side.
#[derive(Debug, Clone)]
pub struct GeocentricProjection {
    params: ProjectionParams,
    converter: GeocentricConverter,
}

impl GeocentricProjection {
    pub fn converter(&self) -> &GeocentricConverter {
        &self.converter
    }
}

impl Initialize for GeocentricProjection {
    fn initialize(params: ProjectionParams) -> Result<Self> {
        let params = ProjectionParams {
            units: params.units,
            ..ProjectionParams::new(params.ellipsoid)
        };
        let converter = GeocentricConverter::new(&params.ellipsoid);
        Ok(GeocentricProjection { params, converter })
    }
}

impl Projection for GeocentricProjection {
    fn name(&self) -> &'static str {
        "geocent"
    }

    fn params(&self) -> &ProjectionParams {
        &self.params
    }

    /// Cartesian `X`, `Y` of a point on the ellipsoid surface.
    fn project(&self, lam: f64, phi: f64) -> Result<(f64, f64)> {
        let [x, y, _] = self.converter.geodetic_to_geocentric(lam, phi, 0.0)?;
        let a = self.params.ellipsoid.a();
        Ok((x / a, y / a))
    }

    /// Geodetic position of an equatorial-plane point (`Z = 0`).
    fn project_inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let a = self.params.ellipsoid.a();
        let (lam, phi, _) = self
            .converter
            .geocentric_to_geodetic([x * a, y * a, 0.0])?;
        Ok((lam, phi))
    }

    fn has_inverse(&self) -> bool {
        true
    }

    fn project_radians(&self, coord: &mut ProjCoordinate) -> Result<()> {
        check_geodetic(coord)?;
        let h = if coord.has_valid_z() { coord.z } else { 0.0 };
        let [x, y, z] = self.converter.geodetic_to_geocentric(coord.x, coord.y, h)?;
        let from_meter = self.params.units.from_meter();
        coord.x = x * from_meter;
        coord.y = y * from_meter;
        coord.z = z * from_meter;
        Ok(())
    }

    fn inverse_project_radians(&self, coord: &mut ProjCoordinate) -> Result<()> {
        check_finite(coord)?;
        let to_meter = self.params.units.to_meter();
        let z = if coord.has_valid_z() { coord.z } else { 0.0 };
        let (lon, lat, h) = self.converter.geocentric_to_geodetic([
            coord.x * to_meter,
            coord.y * to_meter,
            z * to_meter,
        ])?;
        coord.x = lon;
        coord.y = lat;
        coord.z = h;
        Ok(())
    }
}

impl fmt::Display for GeocentricProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Geocentric")
    }
}
