use crate::datum::Datum;
use crate::error::Result;
use crate::projection::{Initialize, LongLatProjection, Projection, ProjectionParams};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A coordinate reference system: a datum, the projection onto it, and the
/// parameters it was built from.
///
/// Instances are immutable once built and are shared between transforms and
/// caches through `Arc`.
#[derive(Debug, Clone)]
pub struct CoordinateReferenceSystem {
    name: String,
    params: Vec<String>,
    datum: Arc<Datum>,
    projection: Option<Arc<dyn Projection>>,
}

impl CoordinateReferenceSystem {
    /// Without a `name`, the CRS is named after its projection, e.g. `sinu-CS`.
    pub fn new(
        name: Option<String>,
        params: Vec<String>,
        datum: Arc<Datum>,
        projection: Option<Arc<dyn Projection>>,
    ) -> Self {
        let name = name.unwrap_or_else(|| {
            let proj_name = projection.as_ref().map_or("null-proj", |p| p.name());
            format!("{proj_name}-CS")
        });
        CoordinateReferenceSystem {
            name,
            params,
            datum,
            projection,
        }
    }

    /// Geodetic coordinates in radians on an unspecified datum.
    ///
    /// Transforms to or from this CRS only apply the other side's projection;
    /// no datum shift is ever made.
    pub fn cs_geo() -> Arc<CoordinateReferenceSystem> {
        static CS_GEO: OnceLock<Arc<CoordinateReferenceSystem>> = OnceLock::new();
        CS_GEO
            .get_or_init(|| {
                Arc::new(CoordinateReferenceSystem::new(
                    Some("CS_GEO".to_string()),
                    Vec::new(),
                    Arc::new(Datum::wgs84()),
                    None,
                ))
            })
            .clone()
    }

    /// A longitude/latitude CRS in degrees on the same datum.
    pub fn create_geographic(&self) -> Result<CoordinateReferenceSystem> {
        let ellipsoid = match &self.projection {
            Some(projection) => projection.ellipsoid().clone(),
            None => self.datum.ellipsoid().clone(),
        };
        let projection = LongLatProjection::initialize(ProjectionParams::new(ellipsoid))?;
        Ok(CoordinateReferenceSystem::new(
            Some(format!("GEO-{}", self.datum.code())),
            Vec::new(),
            self.datum.clone(),
            Some(Arc::new(projection)),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter tokens this CRS was built from.
    pub fn parameters(&self) -> &[String] {
        &self.params
    }

    /// The parameter tokens joined by single spaces.
    pub fn parameter_string(&self) -> String {
        self.params.join(" ")
    }

    pub fn datum(&self) -> &Arc<Datum> {
        &self.datum
    }

    /// `None` only for [`CoordinateReferenceSystem::cs_geo`].
    pub fn projection(&self) -> Option<&Arc<dyn Projection>> {
        self.projection.as_ref()
    }

    pub fn is_geographic(&self) -> bool {
        self.projection.as_ref().is_none_or(|p| p.is_geographic())
    }
}

/// Equal datums and equal projections; names and parameter tokens are not
/// compared.
impl PartialEq for CoordinateReferenceSystem {
    fn eq(&self, other: &Self) -> bool {
        let same_projection = match (&self.projection, &other.projection) {
            (Some(a), Some(b)) => a.is_equal(b.as_ref()),
            (None, None) => true,
            _ => false,
        };
        same_projection && self.datum.is_equal(&other.datum)
    }
}

impl fmt::Display for CoordinateReferenceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
