use crate::datum::{Datum, DatumShift};
use crate::ellipsoid::Ellipsoid;
use crate::error::Result;
use crate::projection::{
    AlbersEqualArea, GeocentricProjection, LongLatProjection, Mercator, Projection,
    ProjectionFactory, Sinusoidal, TransverseMercator, factory,
};
use crate::units::{UNITS, Units};
use std::collections::HashMap;
use std::sync::Arc;

enum Shape {
    Rf(f64),
    B(f64),
}

const ELLIPSOIDS: &[(&str, &str, f64, Shape)] = &[
    ("MERIT", "MERIT 1983", 6378137.0, Shape::Rf(298.257)),
    ("GRS80", "GRS 1980 (IUGG, 1980)", 6378137.0, Shape::Rf(298.257222101)),
    ("GRS67", "GRS 67 (IUGG 1967)", 6378160.0, Shape::Rf(298.2471674270)),
    ("WGS72", "WGS 72", 6378135.0, Shape::Rf(298.26)),
    ("WGS84", "WGS 84", 6378137.0, Shape::Rf(298.257223563)),
    ("intl", "International 1909 (Hayford)", 6378388.0, Shape::Rf(297.0)),
    ("bessel", "Bessel 1841", 6377397.155, Shape::Rf(299.1528128)),
    ("clrk66", "Clarke 1866", 6378206.4, Shape::B(6356583.8)),
    ("clrk80", "Clarke 1880 mod.", 6378249.145, Shape::Rf(293.4663)),
    ("airy", "Airy 1830", 6377563.396, Shape::B(6356256.910)),
    ("mod_airy", "Modified Airy", 6377340.189, Shape::B(6356034.446)),
    ("krass", "Krassovsky, 1942", 6378245.0, Shape::Rf(298.3)),
    ("evrst30", "Everest 1830", 6377276.345, Shape::Rf(300.8017)),
    ("aust_SA", "Australian Natl & S. Amer. 1969", 6378160.0, Shape::Rf(298.25)),
    ("sphere", "Normal Sphere (r=6370997)", 6370997.0, Shape::Rf(0.0)),
];

const DATUMS: &[(&str, &str, &str, &[f64])] = &[
    ("WGS84", "WGS84", "WGS84", &[0.0, 0.0, 0.0]),
    ("GGRS87", "GRS80", "Greek_Geodetic_Reference_System_1987", &[-199.87, 74.79, 246.62]),
    ("NAD83", "GRS80", "North_American_Datum_1983", &[0.0, 0.0, 0.0]),
    ("potsdam", "bessel", "Potsdam Rauenberg 1950 DHDN", &[598.1, 73.7, 418.2, 0.202, 0.045, -2.455, 6.7]),
    ("carthage", "clrk80", "Carthage 1934 Tunisia", &[-263.0, 6.0, 431.0]),
    ("hermannskogel", "bessel", "Hermannskogel", &[577.326, 90.129, 463.919, 5.137, 1.474, 5.297, 2.4232]),
    ("ire65", "mod_airy", "Ireland 1965", &[482.530, -130.596, 564.557, -1.042, -0.214, -0.631, 8.15]),
    ("nzgd49", "intl", "New Zealand Geodetic Datum 1949", &[59.47, -5.04, 187.44, 0.47, -0.1, 1.024, -4.5993]),
    ("OSGB36", "airy", "Airy 1830", &[446.448, -125.157, 542.060, 0.1502, 0.2470, 0.8421, -20.4894]),
];

/// Lookup tables mapping mnemonics to projections, ellipsoids, datums and units.
///
/// `Registry::default()` holds the built-in definitions; more can be registered
/// before the registry is handed to a [`CrsFactory`](crate::CrsFactory).
#[derive(Clone)]
pub struct Registry {
    projections: HashMap<String, ProjectionFactory>,
    ellipsoids: HashMap<String, Arc<Ellipsoid>>,
    datums: HashMap<String, Arc<Datum>>,
    units: HashMap<String, Units>,
}

impl Registry {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Registry {
            projections: HashMap::new(),
            ellipsoids: HashMap::new(),
            datums: HashMap::new(),
            units: HashMap::new(),
        }
    }

    pub fn lookup_projection(&self, name: &str) -> Option<ProjectionFactory> {
        self.projections.get(name).copied()
    }

    pub fn lookup_ellipsoid(&self, name: &str) -> Option<Arc<Ellipsoid>> {
        self.ellipsoids.get(name).cloned()
    }

    pub fn lookup_datum(&self, name: &str) -> Option<Arc<Datum>> {
        self.datums.get(name).cloned()
    }

    pub fn lookup_units(&self, name: &str) -> Option<Units> {
        self.units.get(name).cloned()
    }

    pub fn register_projection(&mut self, name: impl Into<String>, factory: ProjectionFactory) {
        self.projections.insert(name.into(), factory);
    }

    pub fn register_ellipsoid(&mut self, ellipsoid: Ellipsoid) {
        self.ellipsoids
            .insert(ellipsoid.code().to_string(), Arc::new(ellipsoid));
    }

    pub fn register_datum(&mut self, datum: Datum) {
        self.datums.insert(datum.code().to_string(), Arc::new(datum));
    }

    pub fn register_units(&mut self, units: Units) {
        self.units.insert(units.name().to_string(), units);
    }

    pub fn projection_names(&self) -> impl Iterator<Item = &str> {
        self.projections.keys().map(String::as_str)
    }

    fn builtin() -> Result<Self> {
        let mut registry = Registry::empty();

        for name in ["longlat", "latlong", "lonlat", "latlon"] {
            registry.register_projection(name, factory::<LongLatProjection>);
        }
        registry.register_projection("geocent", factory::<GeocentricProjection>);
        registry.register_projection("sinu", factory::<Sinusoidal>);
        registry.register_projection("aea", factory::<AlbersEqualArea>);
        registry.register_projection("merc", factory::<Mercator>);
        registry.register_projection("tmerc", factory::<TransverseMercator>);
        registry.register_projection("utm", |params| {
            Ok(Arc::new(TransverseMercator::utm(params)?) as Arc<dyn Projection>)
        });

        for (code, name, a, shape) in ELLIPSOIDS {
            let ellipsoid = match shape {
                Shape::Rf(rf) => Ellipsoid::from_reciprocal_flattening(*code, *name, *a, *rf)?,
                Shape::B(b) => Ellipsoid::from_semi_minor(*code, *name, *a, *b)?,
            };
            registry.register_ellipsoid(ellipsoid);
        }

        for (code, ellps, name, towgs84) in DATUMS {
            if let Some(ellipsoid) = registry.lookup_ellipsoid(ellps) {
                let shift = DatumShift::from_towgs84(towgs84)?;
                registry.register_datum(Datum::new(*code, *name, ellipsoid, shift));
            }
        }

        for (name, to_meter) in UNITS {
            registry.register_units(Units::new(*name, *to_meter));
        }
        Ok(registry)
    }
}

impl Default for Registry {
    fn default() -> Self {
        // the built-in tables are constant and valid
        Registry::builtin().unwrap_or_else(|_| Registry::empty())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("projections", &self.projections.len())
            .field("ellipsoids", &self.ellipsoids.len())
            .field("datums", &self.datums.len())
            .field("units", &self.units.len())
            .finish()
    }
}
