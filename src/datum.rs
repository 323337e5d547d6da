use crate::ellipsoid::Ellipsoid;
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Arc-seconds to radians.
const SEC_TO_RAD: f64 = 4.848_136_811_095_36e-6;

/// How a datum relates to WGS84.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatumShift {
    /// No relationship to WGS84 is known; no shift is ever applied.
    Unknown,
    /// Coincident with WGS84.
    Wgs84,
    /// Geodetic coordinates are read as WGS84 geodetic coordinates, whatever
    /// the ellipsoid (`+nadgrids=@null`).
    NullGrid,
    /// Geocentric translation in metres.
    ThreeParam([f64; 3]),
    /// Helmert transform: translations in metres, rotations in radians and the
    /// scale as a multiplier (`1 + ppm * 1e-6`).
    SevenParam([f64; 7]),
}

impl DatumShift {
    /// Build a shift from a `towgs84` list: 3 translations, or 3 translations,
    /// 3 rotations in arc-seconds and a scale in parts per million.
    pub fn from_towgs84(values: &[f64]) -> Result<Self> {
        match values {
            [dx, dy, dz] => Ok(Self::three(*dx, *dy, *dz)),
            [dx, dy, dz, rx, ry, rz, s] => {
                if *rx == 0.0 && *ry == 0.0 && *rz == 0.0 && *s == 0.0 {
                    return Ok(Self::three(*dx, *dy, *dz));
                }
                Ok(DatumShift::SevenParam([
                    *dx,
                    *dy,
                    *dz,
                    rx * SEC_TO_RAD,
                    ry * SEC_TO_RAD,
                    rz * SEC_TO_RAD,
                    s / 1_000_000.0 + 1.0,
                ]))
            }
            other => Err(Error::invalid(format!(
                "towgs84 needs 3 or 7 values, got {}",
                other.len()
            ))),
        }
    }

    fn three(dx: f64, dy: f64, dz: f64) -> Self {
        if dx == 0.0 && dy == 0.0 && dz == 0.0 {
            DatumShift::Wgs84
        } else {
            DatumShift::ThreeParam([dx, dy, dz])
        }
    }

    /// Whether this shift can take part in a datum transformation.
    pub fn is_known(&self) -> bool {
        !matches!(self, DatumShift::Unknown)
    }

    /// Shift a geocentric coordinate from this datum to WGS84.
    pub fn to_wgs84(&self, xyz: [f64; 3]) -> [f64; 3] {
        let [x, y, z] = xyz;
        match *self {
            DatumShift::Unknown | DatumShift::Wgs84 | DatumShift::NullGrid => xyz,
            DatumShift::ThreeParam([dx, dy, dz]) => [x + dx, y + dy, z + dz],
            DatumShift::SevenParam([dx, dy, dz, rx, ry, rz, m]) => [
                m * (x - rz * y + ry * z) + dx,
                m * (rz * x + y - rx * z) + dy,
                m * (-ry * x + rx * y + z) + dz,
            ],
        }
    }

    /// Shift a geocentric WGS84 coordinate onto this datum.
    pub fn from_wgs84(&self, xyz: [f64; 3]) -> [f64; 3] {
        let [x, y, z] = xyz;
        match *self {
            DatumShift::Unknown | DatumShift::Wgs84 | DatumShift::NullGrid => xyz,
            DatumShift::ThreeParam([dx, dy, dz]) => [x - dx, y - dy, z - dz],
            DatumShift::SevenParam([dx, dy, dz, rx, ry, rz, m]) => {
                let (x, y, z) = ((x - dx) / m, (y - dy) / m, (z - dz) / m);
                [
                    x + rz * y - ry * z,
                    -rz * x + y + rx * z,
                    ry * x - rx * y + z,
                ]
            }
        }
    }
}

/// An ellipsoid anchored to the earth, with its relationship to WGS84.
#[derive(Debug, Clone)]
pub struct Datum {
    code: String,
    name: String,
    ellipsoid: Arc<Ellipsoid>,
    shift: DatumShift,
}

impl Datum {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        ellipsoid: Arc<Ellipsoid>,
        shift: DatumShift,
    ) -> Self {
        Datum {
            code: code.into(),
            name: name.into(),
            ellipsoid,
            shift,
        }
    }

    pub fn wgs84() -> Self {
        Datum::new(
            "WGS84",
            "WGS84",
            Arc::new(Ellipsoid::wgs84()),
            DatumShift::Wgs84,
        )
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ellipsoid(&self) -> &Arc<Ellipsoid> {
        &self.ellipsoid
    }

    pub fn shift(&self) -> &DatumShift {
        &self.shift
    }

    /// Same datum on a different ellipsoid.
    pub(crate) fn with_ellipsoid(&self, ellipsoid: Arc<Ellipsoid>) -> Self {
        Datum {
            ellipsoid,
            ..self.clone()
        }
    }

    /// Whether both datums place coordinates identically: same shift and same
    /// ellipsoid shape. Codes and names are not compared.
    pub fn is_equal(&self, other: &Datum) -> bool {
        self.shift == other.shift && self.ellipsoid.is_equal(&other.ellipsoid)
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_towgs84_counts() {
        assert!(DatumShift::from_towgs84(&[1.0, 2.0]).is_err());
        assert!(DatumShift::from_towgs84(&[1.0; 6]).is_err());
        assert_eq!(
            DatumShift::from_towgs84(&[1.0, 2.0, 3.0]).unwrap(),
            DatumShift::ThreeParam([1.0, 2.0, 3.0])
        );
        assert!(matches!(
            DatumShift::from_towgs84(&[1.0; 7]).unwrap(),
            DatumShift::SevenParam(_)
        ));
    }

    #[test]
    fn test_zero_shift_is_wgs84() {
        assert_eq!(
            DatumShift::from_towgs84(&[0.0; 3]).unwrap(),
            DatumShift::Wgs84
        );
        assert_eq!(
            DatumShift::from_towgs84(&[0.0; 7]).unwrap(),
            DatumShift::Wgs84
        );
        assert_eq!(
            DatumShift::from_towgs84(&[5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap(),
            DatumShift::ThreeParam([5.0, 0.0, 0.0])
        );
    }

    #[test]
    fn test_helmert_inverts() {
        let shift = DatumShift::from_towgs84(&[
            598.1, 73.7, 418.2, 0.202, 0.045, -2.455, 6.7,
        ])
        .unwrap();
        let xyz = [4_000_000.0, 500_000.0, 4_900_000.0];
        let back = shift.from_wgs84(shift.to_wgs84(xyz));
        for i in 0..3 {
            assert_relative_eq!(back[i], xyz[i], epsilon = 1e-2);
        }
    }

    #[test]
    fn test_equality_ignores_code() {
        let a = Datum::wgs84();
        let b = Datum::new("other", "Other", a.ellipsoid().clone(), DatumShift::Wgs84);
        assert!(a.is_equal(&b));
        let c = Datum::new(
            "c",
            "C",
            a.ellipsoid().clone(),
            DatumShift::ThreeParam([1.0, 0.0, 0.0]),
        );
        assert!(!a.is_equal(&c));
        let d = a.with_ellipsoid(Arc::new(
            Ellipsoid::sphere("sphere", "Sphere", 6370997.0).unwrap(),
        ));
        assert_ne!(a, d);
    }
}
