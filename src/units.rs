use std::fmt;

/// A linear unit of measure, or degrees for geographic coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Units {
    name: String,
    to_meter: f64,
}

impl Units {
    pub fn new(name: impl Into<String>, to_meter: f64) -> Self {
        Units {
            name: name.into(),
            to_meter,
        }
    }

    pub fn metres() -> Self {
        Units::new("m", 1.0)
    }

    /// Angular unit used by geographic systems; the factor is meaningless and kept at 1.
    pub fn degrees() -> Self {
        Units::new("degrees", 1.0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Multiply a value in these units by this factor to get metres.
    pub fn to_meter(&self) -> f64 {
        self.to_meter
    }

    pub fn from_meter(&self) -> f64 {
        1.0 / self.to_meter
    }
}

impl Default for Units {
    fn default() -> Self {
        Units::metres()
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Built-in linear unit table: mnemonic and metres per unit. Angular units are
/// not listed; geographic projections always report [`Units::degrees`].
pub(crate) const UNITS: &[(&str, f64)] = &[
    ("m", 1.0),
    ("km", 1000.0),
    ("dm", 0.1),
    ("cm", 0.01),
    ("mm", 0.001),
    ("ft", 0.3048),
    ("us-ft", 1200.0 / 3937.0),
    ("yd", 0.9144),
    ("us-yd", 3600.0 / 3937.0),
    ("mi", 1609.344),
];
