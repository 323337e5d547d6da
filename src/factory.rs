use crate::builder::ParameterBuilder;
use crate::catalog::Catalog;
use crate::crs::CoordinateReferenceSystem;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::transform::CoordinateTransform;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_AUTHORITY: &str = "EPSG";

/// Configures a [`CrsFactory`]: where catalogs are searched for, the
/// authority assumed for bare codes, and the registry used to build CRSs.
///
/// ```
/// use proj_crs::CrsFactoryBuilder;
///
/// let factory = CrsFactoryBuilder::new()
///     .default_authority("ESRI")
///     .build();
/// let crs = factory.create_from_name("54008").unwrap();
/// assert_eq!(crs.projection().unwrap().name(), "sinu");
/// ```
#[derive(Debug, Clone)]
pub struct CrsFactoryBuilder {
    search_paths: Vec<PathBuf>,
    embedded: bool,
    default_authority: String,
    registry: Registry,
}

impl Default for CrsFactoryBuilder {
    fn default() -> Self {
        CrsFactoryBuilder {
            search_paths: Vec::new(),
            embedded: true,
            default_authority: DEFAULT_AUTHORITY.to_string(),
            registry: Registry::default(),
        }
    }
}

impl CrsFactoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the directories searched for catalog files. Each directory is
    /// probed for a file named after the lowercased authority, e.g. `epsg`.
    pub fn set_search_paths<P: AsRef<Path>>(mut self, paths: &[P]) -> Self {
        self.search_paths = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        self
    }

    pub fn add_search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Whether the catalogs bundled with the crate are the fallback when no
    /// search path holds a catalog. Enabled by default.
    pub fn embedded_catalogs(mut self, enable: bool) -> Self {
        self.embedded = enable;
        self
    }

    /// Authority used for names without a `:`. Defaults to `EPSG`.
    pub fn default_authority(mut self, authority: impl Into<String>) -> Self {
        self.default_authority = authority.into();
        self
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> CrsFactory {
        CrsFactory {
            catalog: Catalog::new(self.search_paths, self.embedded),
            default_authority: self.default_authority,
            registry: self.registry,
        }
    }
}

/// Creates coordinate reference systems from authority codes or parameter
/// strings.
///
/// A factory does no caching: every call re-reads the catalog and rebuilds.
/// Wrap it in a [`CrsCache`](crate::CrsCache) to share instances.
#[derive(Debug, Clone)]
pub struct CrsFactory {
    catalog: Catalog,
    default_authority: String,
    registry: Registry,
}

impl Default for CrsFactory {
    fn default() -> Self {
        CrsFactoryBuilder::default().build()
    }
}

impl CrsFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> CrsFactoryBuilder {
        CrsFactoryBuilder::new()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Split `name` into authority and code, e.g. `EPSG:3005`. A name without
    /// a `:` is a code of the default authority.
    fn split_name<'a>(&'a self, name: &'a str) -> (&'a str, &'a str) {
        name.split_once(':')
            .unwrap_or((self.default_authority.as_str(), name))
    }

    /// Look `name` up in its authority's catalog and build the CRS it names.
    ///
    /// ```
    /// use proj_crs::CrsFactory;
    ///
    /// let crs = CrsFactory::new().create_from_name("EPSG:3005").unwrap();
    /// assert_eq!(crs.name(), "EPSG:3005");
    /// assert!(crs.projection().unwrap().is_equal_area());
    /// ```
    pub fn create_from_name(&self, name: &str) -> Result<CoordinateReferenceSystem> {
        let params = self.read_name(name)?;
        self.create_from_parameter_list(Some(name), &params)
    }

    fn read_name(&self, name: &str) -> Result<Vec<String>> {
        let (authority, code) = self.split_name(name);
        self.catalog
            .read_parameters(authority, code)?
            .ok_or_else(|| Error::UnknownAuthorityCode(name.to_string()))
    }

    /// Build a CRS from a whitespace-separated parameter string.
    pub fn create_from_parameters(
        &self,
        name: Option<&str>,
        params: &str,
    ) -> Result<CoordinateReferenceSystem> {
        let tokens: Vec<&str> = split_parameters(params).collect();
        self.create_from_parameter_list(name, &tokens)
    }

    pub fn create_from_parameter_list<S: AsRef<str>>(
        &self,
        name: Option<&str>,
        params: &[S],
    ) -> Result<CoordinateReferenceSystem> {
        ParameterBuilder::new(&self.registry).build(name, params)
    }

    /// The EPSG code whose catalog record has exactly these parameters, in
    /// this order. Leading `+` signs may be omitted.
    pub fn read_epsg_from_parameters(&self, params: &str) -> Result<Option<String>> {
        let tokens: Vec<&str> = split_parameters(params).collect();
        self.read_epsg_from_parameter_list(&tokens)
    }

    pub fn read_epsg_from_parameter_list<S: AsRef<str>>(
        &self,
        params: &[S],
    ) -> Result<Option<String>> {
        let tokens: Vec<String> = params
            .iter()
            .map(|p| {
                let p = p.as_ref();
                if p.starts_with('+') {
                    p.to_string()
                } else {
                    format!("+{p}")
                }
            })
            .collect();
        Ok(self.catalog.read_epsg_code(&tokens)?)
    }

    /// Resolve two names and create the transform between them.
    pub fn create_transform(&self, source: &str, target: &str) -> Result<CoordinateTransform> {
        debug!(source, target, "creating transform by name");
        Ok(CoordinateTransform::new(
            Arc::new(self.create_from_name(source)?),
            Arc::new(self.create_from_name(target)?),
        ))
    }
}

pub(crate) fn split_parameters(params: &str) -> impl Iterator<Item = &str> {
    params.split_whitespace()
}
