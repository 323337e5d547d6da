use crate::error::{Error, Result};
use std::fmt;

/// A reference ellipsoid.
///
/// Two ellipsoids are equal when they carry the same code and the same shape.
#[derive(Debug, Clone)]
pub struct Ellipsoid {
    code: String,
    name: String,
    a: f64,
    b: f64,
    es: f64,
}

impl Ellipsoid {
    /// Build an ellipsoid from its semi-major axis and reciprocal flattening.
    ///
    /// A reciprocal flattening of zero describes a sphere.
    pub fn from_reciprocal_flattening(
        code: impl Into<String>,
        name: impl Into<String>,
        a: f64,
        rf: f64,
    ) -> Result<Self> {
        let f = if rf == 0.0 { 0.0 } else { 1.0 / rf };
        Self::from_flattening(code, name, a, f)
    }

    pub fn from_flattening(
        code: impl Into<String>,
        name: impl Into<String>,
        a: f64,
        f: f64,
    ) -> Result<Self> {
        if !(0.0..1.0).contains(&f) {
            return Err(Error::invalid(format!("flattening {f} outside [0, 1)")));
        }
        Self::from_eccentricity_squared(code, name, a, f * (2.0 - f))
    }

    pub fn from_semi_minor(
        code: impl Into<String>,
        name: impl Into<String>,
        a: f64,
        b: f64,
    ) -> Result<Self> {
        if !(b > 0.0) || b > a {
            return Err(Error::invalid(format!(
                "semi-minor axis {b} must be positive and no larger than {a}"
            )));
        }
        Self::from_eccentricity_squared(code, name, a, 1.0 - (b * b) / (a * a))
    }

    pub fn from_eccentricity_squared(
        code: impl Into<String>,
        name: impl Into<String>,
        a: f64,
        es: f64,
    ) -> Result<Self> {
        if !(a > 0.0) || !a.is_finite() {
            return Err(Error::invalid(format!("semi-major axis {a} must be positive")));
        }
        if !(0.0..1.0).contains(&es) {
            return Err(Error::invalid(format!(
                "squared eccentricity {es} outside [0, 1)"
            )));
        }
        Ok(Ellipsoid {
            code: code.into(),
            name: name.into(),
            a,
            b: a * (1.0 - es).sqrt(),
            es,
        })
    }

    pub fn sphere(code: impl Into<String>, name: impl Into<String>, radius: f64) -> Result<Self> {
        Self::from_eccentricity_squared(code, name, radius, 0.0)
    }

    pub fn wgs84() -> Self {
        Ellipsoid {
            code: "WGS84".to_string(),
            name: "WGS 84".to_string(),
            a: 6_378_137.0,
            b: 6_356_752.314_245_179,
            es: 0.006_694_379_990_141_316_5,
        }
    }

    /// Same shape, new identity.
    pub(crate) fn renamed(&self, code: impl Into<String>, name: impl Into<String>) -> Self {
        Ellipsoid {
            code: code.into(),
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semi-major (equatorial) axis.
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Semi-minor (polar) axis.
    pub fn b(&self) -> f64 {
        self.b
    }

    /// First eccentricity squared.
    pub fn es(&self) -> f64 {
        self.es
    }

    pub fn e(&self) -> f64 {
        self.es.sqrt()
    }

    pub fn one_es(&self) -> f64 {
        1.0 - self.es
    }

    pub fn flattening(&self) -> f64 {
        1.0 - (1.0 - self.es).sqrt()
    }

    pub fn is_sphere(&self) -> bool {
        self.es == 0.0
    }

    /// Compare shapes only, ignoring codes.
    pub fn is_equal(&self, other: &Ellipsoid) -> bool {
        self.a == other.a && self.es == other.es
    }
}

impl PartialEq for Ellipsoid {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.is_equal(other)
    }
}

impl fmt::Display for Ellipsoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wgs84_constants() {
        let computed =
            Ellipsoid::from_reciprocal_flattening("WGS84", "WGS 84", 6378137.0, 298.257223563)
                .unwrap();
        let constant = Ellipsoid::wgs84();
        assert_relative_eq!(computed.es(), constant.es(), epsilon = 1e-15);
        assert_relative_eq!(computed.b(), constant.b(), epsilon = 1e-6);
        assert_relative_eq!(constant.flattening(), 1.0 / 298.257223563, epsilon = 1e-15);
    }

    #[test]
    fn test_semi_minor() {
        let clrk66 =
            Ellipsoid::from_semi_minor("clrk66", "Clarke 1866", 6378206.4, 6356583.8).unwrap();
        assert_relative_eq!(clrk66.b(), 6356583.8, epsilon = 1e-6);
        assert!(!clrk66.is_sphere());
    }

    #[test]
    fn test_degenerate() {
        assert!(Ellipsoid::from_flattening("x", "x", 6378137.0, 1.0).is_err());
        assert!(Ellipsoid::from_flattening("x", "x", 6378137.0, -0.1).is_err());
        assert!(Ellipsoid::from_flattening("x", "x", 0.0, 0.003).is_err());
        assert!(Ellipsoid::from_semi_minor("x", "x", 6378137.0, 7000000.0).is_err());
        assert!(Ellipsoid::from_semi_minor("x", "x", 6378137.0, -1.0).is_err());
        assert!(Ellipsoid::sphere("x", "x", f64::NAN).is_err());
    }

    #[test]
    fn test_equality() {
        let a = Ellipsoid::wgs84();
        let b = a.renamed("other", "Other");
        assert!(a.is_equal(&b));
        assert_ne!(a, b);
        assert_eq!(a, Ellipsoid::wgs84());
    }
}
