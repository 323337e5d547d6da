use num_traits::Float;
use std::fmt;

/// A mutable coordinate buffer: `x`, `y` and an optional `z` (NaN when absent).
///
/// Transforms write their result into a caller-supplied `ProjCoordinate`, so one
/// buffer can be reused across many calls. A buffer must not be shared between
/// concurrent transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjCoordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ProjCoordinate {
    pub fn new(x: f64, y: f64) -> Self {
        ProjCoordinate { x, y, z: f64::NAN }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        ProjCoordinate { x, y, z }
    }

    pub fn set_value(&mut self, other: &ProjCoordinate) {
        *self = *other;
    }

    pub fn has_valid_z(&self) -> bool {
        !self.z.is_nan()
    }

    /// Compare `x` and `y` within `tolerance`.
    pub fn are_xy_equal(&self, other: &ProjCoordinate, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl Default for ProjCoordinate {
    fn default() -> Self {
        ProjCoordinate::new(0.0, 0.0)
    }
}

impl fmt::Display for ProjCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_valid_z() {
            write!(f, "ProjCoordinate[{} {} {}]", self.x, self.y, self.z)
        } else {
            write!(f, "ProjCoordinate[{} {}]", self.x, self.y)
        }
    }
}

/// Any two-dimensional coordinate that can pass through a transform.
pub trait Coord<T>
where
    T: Float,
{
    fn x(&self) -> T;
    fn y(&self) -> T;
    fn from_xy(x: T, y: T) -> Self;
}

impl<T: Float> Coord<T> for (T, T) {
    fn x(&self) -> T {
        self.0
    }
    fn y(&self) -> T {
        self.1
    }
    fn from_xy(x: T, y: T) -> Self {
        (x, y)
    }
}

impl<T: Float> Coord<T> for [T; 2] {
    fn x(&self) -> T {
        self[0]
    }
    fn y(&self) -> T {
        self[1]
    }
    fn from_xy(x: T, y: T) -> Self {
        [x, y]
    }
}
