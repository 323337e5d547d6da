use crate::crs::CoordinateReferenceSystem;
use crate::datum::{Datum, DatumShift};
use crate::ellipsoid::Ellipsoid;
use crate::error::{Error, Result};
use crate::projection::{LATITUDE_SLACK, ProjectionParams};
use crate::registry::Registry;
use crate::units::Units;
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;
use tracing::{debug, trace};

/// Keys that carry no value.
const FLAGS: &[&str] = &["south", "no_defs", "wktext"];

/// Keys with no effect on the resulting CRS.
const IGNORED: &[&str] = &["no_defs", "wktext", "type"];

const KEYS: &[&str] = &[
    "proj", "ellps", "a", "R", "b", "rf", "f", "es", "datum", "towgs84", "nadgrids", "pm",
    "units", "to_meter", "lat_0", "lon_0", "x_0", "y_0", "k_0", "k", "lat_1", "lat_2", "lat_ts",
    "zone", "south", "no_defs", "wktext", "type",
];

/// Parsed `+key[=value]` tokens. The first occurrence of a key wins.
#[derive(Debug, Default)]
struct Parameters<'a> {
    values: HashMap<&'a str, Option<&'a str>>,
}

impl<'a> Parameters<'a> {
    fn parse<S: AsRef<str>>(tokens: &'a [S]) -> Result<Self> {
        let mut values = HashMap::new();
        for token in tokens {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            let token = token.strip_prefix('+').unwrap_or(token);
            let (key, value) = match token.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (token, None),
            };
            if !KEYS.contains(&key) {
                return Err(Error::unsupported(format!("unknown parameter +{key}")));
            }
            if IGNORED.contains(&key) {
                trace!(key, "ignoring informational parameter");
                continue;
            }
            if value.is_none() && !FLAGS.contains(&key) {
                return Err(Error::invalid(format!("+{key} needs a value")));
            }
            values.entry(key).or_insert(value);
        }
        Ok(Parameters { values })
    }

    fn text(&self, key: &str) -> Option<&'a str> {
        self.values.get(key).copied().flatten()
    }

    fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn number(&self, key: &str) -> Result<Option<f64>> {
        self.text(key).map(|text| parse_number(key, text)).transpose()
    }

    /// An angle in decimal degrees, returned in radians.
    fn angle(&self, key: &str) -> Result<Option<f64>> {
        Ok(self.number(key)?.map(f64::to_radians))
    }

    /// A latitude in decimal degrees, returned in radians; must lie in [-90, 90].
    fn latitude(&self, key: &str) -> Result<Option<f64>> {
        match self.angle(key)? {
            Some(phi) if phi.abs() > FRAC_PI_2 + LATITUDE_SLACK => Err(Error::invalid(format!(
                "+{key}={} lies beyond a pole",
                phi.to_degrees()
            ))),
            phi => Ok(phi),
        }
    }
}

fn parse_number(key: &str, text: &str) -> Result<f64> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Error::invalid(format!("+{key}={text} is not a number"))),
    }
}

/// Turns `+key[=value]` parameter lists into coordinate reference systems,
/// resolving mnemonics against a [`Registry`].
#[derive(Debug, Clone, Copy)]
pub struct ParameterBuilder<'r> {
    registry: &'r Registry,
}

impl<'r> ParameterBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        ParameterBuilder { registry }
    }

    /// Build a CRS. `name` defaults to the projection name followed by `-CS`;
    /// the tokens are retained verbatim on the result.
    pub fn build<S: AsRef<str>>(
        &self,
        name: Option<&str>,
        tokens: &[S],
    ) -> Result<CoordinateReferenceSystem> {
        let params = Parameters::parse(tokens)?;

        let proj_name = params
            .text("proj")
            .ok_or_else(|| Error::invalid("no +proj given"))?;
        let factory = self
            .registry
            .lookup_projection(proj_name)
            .ok_or_else(|| Error::unsupported(format!("unknown projection +proj={proj_name}")))?;

        let named_datum = match params.text("datum") {
            Some(code) => Some(
                self.registry
                    .lookup_datum(code)
                    .ok_or_else(|| Error::unsupported(format!("unknown datum +datum={code}")))?,
            ),
            None => None,
        };

        let ellipsoid = self.ellipsoid(&params, named_datum.as_ref())?;
        let datum = self.datum(&params, named_datum, ellipsoid.clone())?;

        self.check_prime_meridian(&params)?;

        let mut proj_params = ProjectionParams::new(ellipsoid);
        proj_params.units = self.units(&params)?;
        if let Some(lat_0) = params.latitude("lat_0")? {
            proj_params.lat_0 = lat_0;
        }
        if let Some(lon_0) = params.angle("lon_0")? {
            proj_params.lon_0 = lon_0;
        }
        if let Some(x_0) = params.number("x_0")? {
            proj_params.x_0 = x_0;
        }
        if let Some(y_0) = params.number("y_0")? {
            proj_params.y_0 = y_0;
        }
        if let Some(k_0) = params.number("k_0")?.or(params.number("k")?) {
            proj_params.k_0 = k_0;
        }
        proj_params.lat_1 = params.latitude("lat_1")?;
        proj_params.lat_2 = params.latitude("lat_2")?;
        proj_params.lat_ts = params.latitude("lat_ts")?;
        proj_params.zone = match params.text("zone") {
            Some(text) => Some(
                text.trim()
                    .parse::<u32>()
                    .map_err(|_| Error::invalid(format!("+zone={text} is not a zone number")))?,
            ),
            None => None,
        };
        proj_params.south = params.has("south");

        let projection = factory(proj_params)?;
        let crs = CoordinateReferenceSystem::new(
            name.map(str::to_string),
            tokens.iter().map(|t| t.as_ref().to_string()).collect(),
            Arc::new(datum),
            Some(projection),
        );
        debug!(name = crs.name(), projection = proj_name, datum = crs.datum().code(), "built CRS");
        Ok(crs)
    }

    /// Explicit `+a`/`+R` beats `+ellps`, which beats the datum's ellipsoid,
    /// which beats WGS84.
    fn ellipsoid(
        &self,
        params: &Parameters<'_>,
        named_datum: Option<&Arc<Datum>>,
    ) -> Result<Arc<Ellipsoid>> {
        let named = match params.text("ellps") {
            Some(code) => Some(self.registry.lookup_ellipsoid(code).ok_or_else(|| {
                Error::unsupported(format!("unknown ellipsoid +ellps={code}"))
            })?),
            None => named_datum.map(|datum| datum.ellipsoid().clone()),
        };

        if let Some(radius) = params.number("R")? {
            return Ok(Arc::new(Ellipsoid::sphere(
                format!("R={radius}"),
                "User-defined sphere",
                radius,
            )?));
        }

        let explicit_a = params.number("a")?;
        let shaped = ["b", "rf", "f", "es"].iter().any(|key| params.has(key));
        if explicit_a.is_none() && !shaped {
            return Ok(named.unwrap_or_else(|| Arc::new(Ellipsoid::wgs84())));
        }

        let a = match explicit_a {
            Some(a) => a,
            None => named.as_ref().map_or(Ellipsoid::wgs84().a(), |e| e.a()),
        };
        let (code, name) = (format!("a={a}"), "User-defined");
        let ellipsoid = if let Some(b) = params.number("b")? {
            Ellipsoid::from_semi_minor(code, name, a, b)?
        } else if let Some(rf) = params.number("rf")? {
            Ellipsoid::from_reciprocal_flattening(code, name, a, rf)?
        } else if let Some(f) = params.number("f")? {
            Ellipsoid::from_flattening(code, name, a, f)?
        } else if let Some(es) = params.number("es")? {
            Ellipsoid::from_eccentricity_squared(code, name, a, es)?
        } else if let Some(named) = &named {
            Ellipsoid::from_eccentricity_squared(code, name, a, named.es())?
        } else {
            Ellipsoid::sphere(code, name, a)?
        };
        Ok(Arc::new(ellipsoid))
    }

    fn datum(
        &self,
        params: &Parameters<'_>,
        named_datum: Option<Arc<Datum>>,
        ellipsoid: Arc<Ellipsoid>,
    ) -> Result<Datum> {
        let shift = if let Some(list) = params.text("towgs84") {
            let values = list
                .split(',')
                .map(|v| parse_number("towgs84", v))
                .collect::<Result<Vec<_>>>()?;
            Some(DatumShift::from_towgs84(&values)?)
        } else if let Some(grids) = params.text("nadgrids") {
            if grids != "@null" {
                return Err(Error::unsupported(format!(
                    "grid shift +nadgrids={grids}"
                )));
            }
            Some(DatumShift::NullGrid)
        } else {
            None
        };

        let datum = match named_datum {
            Some(datum) => {
                let mut datum = datum.with_ellipsoid(ellipsoid);
                if let Some(shift) = shift {
                    datum = Datum::new(datum.code(), datum.name(), datum.ellipsoid().clone(), shift);
                }
                datum
            }
            None => Datum::new(
                "User",
                "User-defined",
                ellipsoid,
                shift.unwrap_or(DatumShift::Unknown),
            ),
        };
        Ok(datum)
    }

    fn units(&self, params: &Parameters<'_>) -> Result<Units> {
        if let Some(name) = params.text("units") {
            return self
                .registry
                .lookup_units(name)
                .ok_or_else(|| Error::unsupported(format!("unknown units +units={name}")));
        }
        match params.number("to_meter")? {
            Some(to_meter) if to_meter > 0.0 => Ok(Units::new(format!("{to_meter}m"), to_meter)),
            Some(to_meter) => Err(Error::invalid(format!(
                "+to_meter={to_meter} must be positive"
            ))),
            None => Ok(Units::metres()),
        }
    }

    fn check_prime_meridian(&self, params: &Parameters<'_>) -> Result<()> {
        match params.text("pm") {
            None | Some("greenwich") | Some("0") => Ok(()),
            Some(pm) => Err(Error::unsupported(format!("prime meridian +pm={pm}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(text: &str) -> Result<CoordinateReferenceSystem> {
        let registry = Registry::default();
        let tokens: Vec<&str> = text.split_whitespace().collect();
        ParameterBuilder::new(&registry).build(None, &tokens)
    }

    #[test]
    fn test_longlat_wgs84() {
        let crs = build("+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs").unwrap();
        assert!(crs.is_geographic());
        assert_eq!(crs.name(), "longlat-CS");
        assert_eq!(crs.datum().shift(), &DatumShift::Wgs84);
        assert_eq!(
            crs.parameter_string(),
            "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs"
        );
    }

    #[test]
    fn test_leading_plus_optional_and_first_wins() {
        let crs = build("proj=sinu +lon_0=10 +lon_0=20 units=km").unwrap();
        let projection = crs.projection().unwrap();
        assert_eq!(projection.params().lon_0, 10f64.to_radians());
        assert_eq!(projection.units().name(), "km");
    }

    #[test]
    fn test_unknown_mnemonics() {
        assert!(matches!(
            build("+proj=lcc"),
            Err(Error::UnsupportedParameter(_))
        ));
        assert!(matches!(
            build("+proj=sinu +ellps=potato"),
            Err(Error::UnsupportedParameter(_))
        ));
        assert!(matches!(
            build("+proj=sinu +datum=potato"),
            Err(Error::UnsupportedParameter(_))
        ));
        assert!(matches!(
            build("+proj=sinu +bogus=1"),
            Err(Error::UnsupportedParameter(_))
        ));
        assert!(matches!(
            build("+proj=sinu +nadgrids=conus"),
            Err(Error::UnsupportedParameter(_))
        ));
        assert!(matches!(
            build("+proj=sinu +pm=paris"),
            Err(Error::UnsupportedParameter(_))
        ));
        assert!(matches!(build("+ellps=WGS84"), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            build("+proj=sinu +lon_0=east"),
            Err(Error::InvalidValue(_))
        ));
        assert!(matches!(
            build("+proj=sinu +towgs84=1,2"),
            Err(Error::InvalidValue(_))
        ));
        assert!(matches!(
            build("+proj=sinu +towgs84=1,x,3"),
            Err(Error::InvalidValue(_))
        ));
        assert!(matches!(
            build("+proj=sinu +a=-5"),
            Err(Error::InvalidValue(_))
        ));
        assert!(matches!(
            build("+proj=sinu +a=6378137 +f=1.5"),
            Err(Error::InvalidValue(_))
        ));
        assert!(matches!(
            build("+proj=merc +lat_ts=90"),
            Err(Error::InvalidValue(_))
        ));
        assert!(matches!(build("+proj=sinu +x_0"), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn test_latitudes_beyond_the_poles() {
        for text in [
            "+proj=tmerc +lat_0=100",
            "+proj=aea +lat_1=95 +lat_2=60",
            "+proj=aea +lat_1=30 +lat_2=-90.5",
            "+proj=merc +lat_ts=-120",
        ] {
            assert!(
                matches!(build(text), Err(Error::InvalidValue(_))),
                "{text} should be rejected"
            );
        }
        let crs = build("+proj=tmerc +lat_0=90").unwrap();
        assert!((crs.projection().unwrap().params().lat_0 - FRAC_PI_2).abs() < 1e-15);
        assert!(build("+proj=tmerc +lat_0=-90").is_ok());
    }

    #[test]
    fn test_ellipsoid_precedence() {
        let crs = build("+proj=sinu +datum=potsdam").unwrap();
        assert_eq!(crs.datum().ellipsoid().code(), "bessel");

        let crs = build("+proj=sinu +datum=potsdam +ellps=GRS80").unwrap();
        assert_eq!(crs.datum().ellipsoid().code(), "GRS80");
        assert_eq!(crs.datum().code(), "potsdam");

        let crs = build("+proj=sinu +ellps=GRS80 +a=6000000").unwrap();
        let ellipsoid = crs.datum().ellipsoid();
        assert_eq!(ellipsoid.a(), 6_000_000.0);
        assert!(!ellipsoid.is_sphere());

        let crs = build("+proj=sinu +R=6371000").unwrap();
        assert!(crs.datum().ellipsoid().is_sphere());

        let crs = build("+proj=sinu").unwrap();
        assert!(crs.datum().ellipsoid().is_equal(&Ellipsoid::wgs84()));
        assert_eq!(crs.datum().shift(), &DatumShift::Unknown);
    }

    #[test]
    fn test_towgs84_overrides_datum() {
        let crs = build("+proj=longlat +datum=potsdam +towgs84=1,2,3").unwrap();
        assert_eq!(crs.datum().shift(), &DatumShift::ThreeParam([1.0, 2.0, 3.0]));

        let crs = build("+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0").unwrap();
        assert_eq!(crs.datum().shift(), &DatumShift::Wgs84);

        let crs = build("+proj=merc +a=6378137 +b=6378137 +nadgrids=@null").unwrap();
        assert_eq!(crs.datum().shift(), &DatumShift::NullGrid);
    }

    #[test]
    fn test_units_and_named_crs() {
        let registry = Registry::default();
        let crs = ParameterBuilder::new(&registry)
            .build(Some("EPSG:2222"), &["+proj=tmerc", "+to_meter=0.3048"])
            .unwrap();
        assert_eq!(crs.name(), "EPSG:2222");
        assert_eq!(crs.projection().unwrap().units().to_meter(), 0.3048);
        assert!(matches!(
            build("+proj=sinu +units=furlong"),
            Err(Error::UnsupportedParameter(_))
        ));
    }

    #[test]
    fn test_angular_units_are_not_linear_units() {
        assert!(matches!(
            build("+proj=sinu +units=degrees"),
            Err(Error::UnsupportedParameter(_))
        ));
        let crs = build("+proj=longlat +datum=WGS84").unwrap();
        assert_eq!(crs.projection().unwrap().units(), &Units::degrees());
        let crs = build("+proj=sinu +units=us-ft").unwrap();
        assert_eq!(crs.projection().unwrap().units().name(), "us-ft");
    }

    #[test]
    fn test_utm_zone() {
        let crs = build("+proj=utm +zone=36 +south +ellps=clrk66 +units=m +no_defs").unwrap();
        let params = crs.projection().unwrap().params();
        assert_eq!(params.zone, Some(36));
        assert_eq!(params.y_0, 10_000_000.0);
        assert!(matches!(
            build("+proj=utm +zone=x"),
            Err(Error::InvalidValue(_))
        ));
    }
}
