#![doc(html_logo_url = "https://raw.githubusercontent.com/georust/meta/master/logo/logo.png")]
//! `proj_crs` resolves coordinate reference systems from PROJ.4 style
//! definitions and transforms coordinates between them, in pure Rust.
//!
//! A CRS can be requested in two ways:
//!
//! 1. By authority code, e.g. `EPSG:3005`. The code is looked up in a text
//!    catalog of `<code> +key=value ... <>` records (see [`catalog`]).
//! 2. By parameter string, e.g. `+proj=sinu +datum=WGS84`.
//!
//! Either way the parameters are resolved against a [`Registry`] of
//! projections, ellipsoids, datums and units, producing an immutable
//! [`CoordinateReferenceSystem`]. A [`CoordinateTransform`] between two of
//! them inverse-projects the source, shifts datums through geocentric space
//! when needed, and projects onto the target.
//!
//! # Usage
//!
//! - [`CrsFactory`] builds CRSs; [`CrsFactoryBuilder`] configures where
//!   catalogs are searched for. The catalogs bundled with the crate
//!   (`epsg`, `esri`, `world`) are used when no search path provides one.
//! - [`CrsCache`] memoizes a factory so repeated requests share one
//!   instance. [`CrsCache::global`] backs the [`Transform`] trait's
//!   `*_crs_to_crs` methods.
//!
//! ## Catalog Search Paths
//! For an authority `A`, each search path is probed for a file called
//! `a` (the lowercased authority). The first one found is scanned; I/O and
//! structural errors are reported as [`CatalogError`].
//!
//! # Features
//!
//! `geo-types` (enabled by default) implements [`Coord`] and [`Transform`] for
//! `geo_types::{Coord, Point, LineString}`.
//!
//! # Example
//!
//! ```
//! use approx::assert_abs_diff_eq;
//! use proj_crs::{CrsFactory, ProjCoordinate};
//!
//! let factory = CrsFactory::new();
//! let transform = factory.create_transform("EPSG:4269", "EPSG:3005").unwrap();
//! let mut result = ProjCoordinate::default();
//! transform
//!     .transform(&ProjCoordinate::new(-126.54, 54.15), &mut result)
//!     .unwrap();
//! assert_abs_diff_eq!(result.x, 964_813.103_719, epsilon = 1e-3);
//! assert_abs_diff_eq!(result.y, 1_016_486.305_862, epsilon = 1e-3);
//! ```

mod builder;
mod cache;
pub mod catalog;
mod coordinate;
mod crs;
mod datum;
mod ellipsoid;
mod error;
mod factory;
#[cfg(feature = "geo-types")]
mod geo_types;
pub mod projection;
mod registry;
mod transform;
mod units;

pub use crate::builder::ParameterBuilder;
pub use crate::cache::CrsCache;
pub use crate::coordinate::{Coord, ProjCoordinate};
pub use crate::crs::CoordinateReferenceSystem;
pub use crate::datum::{Datum, DatumShift};
pub use crate::ellipsoid::Ellipsoid;
pub use crate::error::{CatalogError, Error, Result};
pub use crate::factory::{CrsFactory, CrsFactoryBuilder};
pub use crate::projection::{Projection, ProjectionParams};
pub use crate::registry::Registry;
pub use crate::transform::{CoordinateTransform, Transform};
pub use crate::units::Units;
