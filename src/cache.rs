use crate::crs::CoordinateReferenceSystem;
use crate::error::Result;
use crate::factory::{CrsFactory, split_parameters};
use crate::transform::CoordinateTransform;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

/// Memoizes CRS construction and reverse EPSG lookups.
///
/// Construction happens outside any lock: callers racing on the same key
/// may each build a CRS, and the first one inserted becomes the shared
/// instance while the others are dropped. Failed constructions are never
/// cached. A reverse lookup that finds no code is cached as `None`; catalog
/// I/O failures are returned and retried on the next call.
///
/// ```
/// use proj_crs::CrsCache;
/// use std::sync::Arc;
///
/// let cache = CrsCache::new();
/// let a = cache.create_from_name("EPSG:4326").unwrap();
/// let b = cache.create_from_name("EPSG:4326").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Default)]
pub struct CrsCache {
    factory: CrsFactory,
    crs: DashMap<String, Arc<CoordinateReferenceSystem>>,
    epsg: DashMap<String, Option<String>>,
}

impl CrsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory(factory: CrsFactory) -> Self {
        CrsCache {
            factory,
            crs: DashMap::new(),
            epsg: DashMap::new(),
        }
    }

    /// The process-wide cache used by [`Transform`](crate::Transform), backed
    /// by a default [`CrsFactory`].
    pub fn global() -> &'static CrsCache {
        static GLOBAL: OnceLock<CrsCache> = OnceLock::new();
        GLOBAL.get_or_init(CrsCache::new)
    }

    pub fn factory(&self) -> &CrsFactory {
        &self.factory
    }

    pub fn create_from_name(&self, name: &str) -> Result<Arc<CoordinateReferenceSystem>> {
        self.get_or_build(name, || self.factory.create_from_name(name))
    }

    pub fn create_from_parameters(
        &self,
        name: Option<&str>,
        params: &str,
    ) -> Result<Arc<CoordinateReferenceSystem>> {
        let tokens: Vec<&str> = split_parameters(params).collect();
        self.create_from_parameter_list(name, &tokens)
    }

    pub fn create_from_parameter_list<S: AsRef<str>>(
        &self,
        name: Option<&str>,
        params: &[S],
    ) -> Result<Arc<CoordinateReferenceSystem>> {
        let key = parameter_key(name, params);
        self.get_or_build(&key, || {
            self.factory.create_from_parameter_list(name, params)
        })
    }

    pub fn read_epsg_from_parameters(&self, params: &str) -> Result<Option<String>> {
        let tokens: Vec<&str> = split_parameters(params).collect();
        self.read_epsg_from_parameter_list(&tokens)
    }

    pub fn read_epsg_from_parameter_list<S: AsRef<str>>(
        &self,
        params: &[S],
    ) -> Result<Option<String>> {
        let key = join(params);
        if let Some(code) = self.epsg.get(&key) {
            trace!(key = %key, "epsg cache hit");
            return Ok(code.clone());
        }
        let code = self.factory.read_epsg_from_parameter_list(params)?;
        debug!(key = %key, found = ?code, "epsg cache miss");
        Ok(self.epsg.entry(key).or_insert(code).clone())
    }

    /// Resolve both names through the cache and create the transform between them.
    pub fn create_transform(&self, source: &str, target: &str) -> Result<CoordinateTransform> {
        Ok(CoordinateTransform::new(
            self.create_from_name(source)?,
            self.create_from_name(target)?,
        ))
    }

    pub fn len(&self) -> usize {
        self.crs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crs.is_empty()
    }

    pub fn clear(&self) {
        self.crs.clear();
        self.epsg.clear();
    }

    fn get_or_build(
        &self,
        key: &str,
        build: impl FnOnce() -> Result<CoordinateReferenceSystem>,
    ) -> Result<Arc<CoordinateReferenceSystem>> {
        if let Some(crs) = self.crs.get(key) {
            trace!(key, "crs cache hit");
            return Ok(crs.clone());
        }
        let built = Arc::new(build()?);
        let entry = self.crs.entry(key.to_string()).or_insert_with(|| built.clone());
        if !Arc::ptr_eq(&entry, &built) {
            debug!(key, "discarding CRS built concurrently");
        } else {
            debug!(key, "crs cache miss");
        }
        Ok(entry.clone())
    }
}

fn join<S: AsRef<str>>(params: &[S]) -> String {
    params
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Named and unnamed parameter lists never share a key.
fn parameter_key<S: AsRef<str>>(name: Option<&str>, params: &[S]) -> String {
    format!("{}\t{}", name.unwrap_or(""), join(params))
}
