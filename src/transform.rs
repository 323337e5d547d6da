use crate::cache::CrsCache;
use crate::coordinate::{Coord, ProjCoordinate};
use crate::crs::CoordinateReferenceSystem;
use crate::datum::{Datum, DatumShift};
use crate::ellipsoid::Ellipsoid;
use crate::error::{Error, Result};
use crate::projection::GeocentricConverter;
use num_traits::Float;
use std::sync::Arc;
use tracing::debug;

/// Geocentric conversions and shifts used to move between two datums.
#[derive(Debug, Clone)]
struct DatumPivot {
    source: GeocentricConverter,
    source_shift: DatumShift,
    target: GeocentricConverter,
    target_shift: DatumShift,
}

impl DatumPivot {
    fn apply(&self, coord: &mut ProjCoordinate) -> Result<()> {
        let h = if coord.has_valid_z() { coord.z } else { 0.0 };
        let xyz = self.source.geodetic_to_geocentric(coord.x, coord.y, h)?;
        let xyz = self.target_shift.from_wgs84(self.source_shift.to_wgs84(xyz));
        let (lon, lat, h) = self.target.geocentric_to_geodetic(xyz)?;
        coord.x = lon;
        coord.y = lat;
        if coord.has_valid_z() {
            coord.z = h;
        }
        Ok(())
    }
}

/// The ellipsoid and shift a datum contributes to a geocentric pivot. A null
/// grid pins geodetic coordinates to WGS84, so it pivots on that ellipsoid.
fn pivot_side(datum: &Datum) -> (Ellipsoid, DatumShift) {
    match datum.shift() {
        DatumShift::NullGrid => (Ellipsoid::wgs84(), DatumShift::Wgs84),
        shift => (datum.ellipsoid().as_ref().clone(), *shift),
    }
}

/// Transforms coordinates from one CRS to another.
///
/// The pipeline is: inverse projection of the source, a datum shift through
/// geocentric space when the datums differ, then forward projection onto the
/// target. A transform holds no mutable state and may be shared freely.
#[derive(Debug, Clone)]
pub struct CoordinateTransform {
    source: Arc<CoordinateReferenceSystem>,
    target: Arc<CoordinateReferenceSystem>,
    pivot: Option<DatumPivot>,
}

impl CoordinateTransform {
    pub fn new(
        source: Arc<CoordinateReferenceSystem>,
        target: Arc<CoordinateReferenceSystem>,
    ) -> Self {
        let (src, tgt) = (source.datum(), target.datum());
        let pivot = if source.projection().is_some()
            && target.projection().is_some()
            && !src.is_equal(tgt)
            && src.shift().is_known()
            && tgt.shift().is_known()
        {
            let (source_ellipsoid, source_shift) = pivot_side(src);
            let (target_ellipsoid, target_shift) = pivot_side(tgt);
            let same = source_shift == target_shift && source_ellipsoid.is_equal(&target_ellipsoid);
            (!same).then(|| DatumPivot {
                source: GeocentricConverter::new(&source_ellipsoid),
                source_shift,
                target: GeocentricConverter::new(&target_ellipsoid),
                target_shift,
            })
        } else {
            None
        };
        debug!(
            source = source.name(),
            target = target.name(),
            datum_shift = pivot.is_some(),
            "created transform"
        );
        CoordinateTransform {
            source,
            target,
            pivot,
        }
    }

    pub fn source(&self) -> &Arc<CoordinateReferenceSystem> {
        &self.source
    }

    pub fn target(&self) -> &Arc<CoordinateReferenceSystem> {
        &self.target
    }

    /// Transform `src` and write the result into `dst`, returning `dst`.
    ///
    /// `z` is carried through when `src` has one. If an error is returned the
    /// contents of `dst` are unspecified.
    pub fn transform<'a>(
        &self,
        src: &ProjCoordinate,
        dst: &'a mut ProjCoordinate,
    ) -> Result<&'a mut ProjCoordinate> {
        dst.set_value(src);
        if let Some(projection) = self.source.projection() {
            projection.inverse_project_radians(dst)?;
        }
        if let Some(pivot) = &self.pivot {
            pivot.apply(dst)?;
        }
        if let Some(projection) = self.target.projection() {
            projection.project_radians(dst)?;
        }
        Ok(dst)
    }

    /// Transform any two-dimensional coordinate.
    ///
    /// ```
    /// use proj_crs::CrsFactory;
    /// # use approx::assert_abs_diff_eq;
    ///
    /// let factory = CrsFactory::new();
    /// let transform = factory.create_transform("EPSG:4326", "EPSG:3857").unwrap();
    /// let (x, y) = transform.convert((180.0f64, 0.0f64)).unwrap();
    /// assert_abs_diff_eq!(x, 20_037_508.342_789_244, epsilon = 1e-6);
    /// assert_abs_diff_eq!(y, 0.0, epsilon = 1e-6);
    /// ```
    pub fn convert<C, F>(&self, point: C) -> Result<C>
    where
        C: Coord<F>,
        F: Float,
    {
        let x = point
            .x()
            .to_f64()
            .ok_or_else(|| Error::invalid("x is not representable as f64"))?;
        let y = point
            .y()
            .to_f64()
            .ok_or_else(|| Error::invalid("y is not representable as f64"))?;
        let mut out = ProjCoordinate::default();
        self.transform(&ProjCoordinate::new(x, y), &mut out)?;
        match (F::from(out.x), F::from(out.y)) {
            (Some(x), Some(y)) => Ok(C::from_xy(x, y)),
            _ => Err(Error::invalid(format!(
                "result {out} is not representable in the coordinate type"
            ))),
        }
    }

    /// Convert a slice of coordinates in place, stopping at the first failure.
    pub fn convert_array<'a, C, F>(&self, points: &'a mut [C]) -> Result<&'a mut [C]>
    where
        C: Coord<F>,
        F: Float,
    {
        for point in points.iter_mut() {
            let x = point.x();
            let y = point.y();
            *point = self.convert(C::from_xy(x, y))?;
        }
        Ok(points)
    }
}

/// Transform a geometry between coordinate reference systems.
pub trait Transform<T> {
    type Output;

    /// Transform a geometry by mutating it in place.
    ///
    #[cfg_attr(feature = "geo-types", doc = r##"
# Examples

```
use proj_crs::{CrsFactory, Transform};
# use approx::assert_relative_eq;

let transform = CrsFactory::new()
    .create_transform("EPSG:4326", "ESRI:54008")
    .unwrap();
let mut point = geo_types::point!(x: 0.0f64, y: 0.0f64);
point.transform(&transform).unwrap();

assert_relative_eq!(point, geo_types::point!(x: 0.0f64, y: 0.0f64));
```
"##)]
    fn transform(&mut self, transform: &CoordinateTransform) -> Result<()>;

    /// Immutable flavor of [`Transform::transform`], which allocates a new geometry.
    fn transformed(&self, transform: &CoordinateTransform) -> Result<Self::Output>;

    /// Transform a geometry from one CRS to another CRS by modifying it in place.
    /// Both names are resolved through [`CrsCache::global`].
    ///
    #[cfg_attr(feature = "geo-types", doc = r##"
# Examples

```
# use approx::assert_relative_eq;
use proj_crs::Transform;
use geo_types::{point, Point};

let mut point: Point<f64> = point!(x: 10.0f64, y: 0.0f64);
point.transform_crs_to_crs("EPSG:4326", "EPSG:3857").unwrap();

assert_relative_eq!(point, point!(x: 1113194.9079327357f64, y: 0.0f64), epsilon = 1e-6);
```
"##)]
    fn transform_crs_to_crs(&mut self, source_crs: &str, target_crs: &str) -> Result<()> {
        let transform = CrsCache::global().create_transform(source_crs, target_crs)?;
        self.transform(&transform)
    }

    /// Immutable flavor of [`Transform::transform_crs_to_crs`], which allocates a new geometry.
    fn transformed_crs_to_crs(&self, source_crs: &str, target_crs: &str) -> Result<Self::Output> {
        let transform = CrsCache::global().create_transform(source_crs, target_crs)?;
        self.transformed(&transform)
    }
}
