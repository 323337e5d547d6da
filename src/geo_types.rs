use crate::coordinate::Coord;
use crate::error::Result;
use crate::transform::{CoordinateTransform, Transform};
use geo_types::CoordFloat;

///```rust
/// # use approx::assert_abs_diff_eq;
/// use proj_crs::CrsFactory;
///
/// let transform = CrsFactory::new()
///     .create_transform("EPSG:4326", "ESRI:54008")
///     .unwrap();
/// let result = transform
///     .convert(geo_types::coord! { x: 90.0f64, y: 60.0f64 })
///     .unwrap();
/// assert_abs_diff_eq!(result.x, 5_009_377.085_697_311, epsilon = 1e-6);
/// ```
impl<T: CoordFloat> Coord<T> for geo_types::Coord<T> {
    fn x(&self) -> T {
        self.x
    }
    fn y(&self) -> T {
        self.y
    }
    fn from_xy(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: CoordFloat> Coord<T> for geo_types::Point<T> {
    fn x(&self) -> T {
        geo_types::Point::x(*self)
    }
    fn y(&self) -> T {
        geo_types::Point::y(*self)
    }
    fn from_xy(x: T, y: T) -> Self {
        Self::new(x, y)
    }
}

impl<T: CoordFloat> Transform<T> for geo_types::Coord<T> {
    type Output = Self;

    fn transform(&mut self, transform: &CoordinateTransform) -> Result<()> {
        *self = transform.convert(*self)?;
        Ok(())
    }

    fn transformed(&self, transform: &CoordinateTransform) -> Result<Self> {
        transform.convert(*self)
    }
}

impl<T: CoordFloat> Transform<T> for geo_types::Point<T> {
    type Output = Self;

    fn transform(&mut self, transform: &CoordinateTransform) -> Result<()> {
        self.0.transform(transform)
    }

    fn transformed(&self, transform: &CoordinateTransform) -> Result<Self> {
        Ok(geo_types::Point(self.0.transformed(transform)?))
    }
}

impl<T: CoordFloat> Transform<T> for geo_types::LineString<T> {
    type Output = Self;

    fn transform(&mut self, transform: &CoordinateTransform) -> Result<()> {
        transform.convert_array(&mut self.0)?;
        Ok(())
    }

    fn transformed(&self, transform: &CoordinateTransform) -> Result<Self> {
        let mut line = self.clone();
        line.transform(transform)?;
        Ok(line)
    }
}
