//! Building pooled connection sources from specs and URLs

use std::sync::Arc;

use sqlpool_core::{
   ConnectionSpec, Driver, DriverRegistry, Error, PoolEngine, PropertyBag, ProxyConnectionSource,
   Result, SpecMap, encode,
};
use sqlpool_r2d2::R2d2Engine;
use tracing::debug;

use crate::handle::PoolHandle;
use crate::lifecycle::DestroyTarget;

/// Builds pooled connection sources and tears them down.
///
/// Every constructor builds a [`ProxyConnectionSource`] and hands it to the
/// engine, so the engine never opens connections through its own driver
/// lookup. Pool tuning maps are encoded into a [`PropertyBag`] and passed
/// through uninterpreted; the engine decides what they mean.
///
/// # Example
///
/// ```no_run
/// use sqlpool::{ConnectionSource, ConnectionSpec, PoolFactory, R2d2Engine, SpecMap};
///
/// # fn main() -> sqlpool::Result<()> {
/// let factory = PoolFactory::<R2d2Engine>::default();
/// let spec = ConnectionSpec::new("postgresql", "//localhost/app").with_credentials("app", "secret");
///
/// let mut tuning = SpecMap::new();
/// tuning.insert("max_size".into(), 4.into());
///
/// let handle = factory.from_spec_with(&spec, &tuning)?;
/// let conn = handle.datasource.get_connection()?;
/// drop(conn);
///
/// factory.destroy(handle)?;
/// # Ok(())
/// # }
/// ```
pub struct PoolFactory<E: PoolEngine = R2d2Engine> {
   engine: E,
   registry: Arc<DriverRegistry>,
}

impl<E: PoolEngine + Default> Default for PoolFactory<E> {
   fn default() -> Self {
      Self::new(E::default())
   }
}

impl<E: PoolEngine> PoolFactory<E> {
   /// Factory resolving drivers from the global registry.
   pub fn new(engine: E) -> Self {
      Self {
         engine,
         registry: DriverRegistry::global(),
      }
   }

   /// Resolve drivers from `registry` instead of the global one.
   pub fn with_registry(mut self, registry: Arc<DriverRegistry>) -> Self {
      self.registry = registry;
      self
   }

   pub fn engine(&self) -> &E {
      &self.engine
   }

   pub fn registry(&self) -> &Arc<DriverRegistry> {
      &self.registry
   }

   /// Pool a spec with the engine's default tuning.
   pub fn from_spec(&self, spec: &ConnectionSpec) -> Result<PoolHandle<E::Pool>> {
      self.pool_spec(None, spec, None)
   }

   /// Pool a spec with tuning properties.
   pub fn from_spec_with(
      &self,
      spec: &ConnectionSpec,
      pool_props: &SpecMap,
   ) -> Result<PoolHandle<E::Pool>> {
      self.pool_spec(None, spec, Some(pool_props))
   }

   /// Pool a spec, connecting through `driver` regardless of its scheme or
   /// `classname`.
   pub fn from_driver(
      &self,
      driver: Arc<dyn Driver>,
      spec: &ConnectionSpec,
      pool_props: &SpecMap,
   ) -> Result<PoolHandle<E::Pool>> {
      self.pool_spec(Some(driver), spec, Some(pool_props))
   }

   /// Pool a bare connection string, with no driver properties.
   pub fn from_url(&self, url: &str) -> Result<PoolHandle<E::Pool>> {
      let source = ProxyConnectionSource::with_registry(
         Arc::clone(&self.registry),
         url,
         PropertyBag::new(),
      );
      self.pool(source, None)
   }

   pub fn from_url_with(&self, url: &str, pool_props: &SpecMap) -> Result<PoolHandle<E::Pool>> {
      let source = ProxyConnectionSource::with_registry(
         Arc::clone(&self.registry),
         url,
         PropertyBag::new(),
      );
      self.pool(source, Some(pool_props))
   }

   pub fn from_driver_url(
      &self,
      driver: Arc<dyn Driver>,
      url: &str,
      pool_props: &SpecMap,
   ) -> Result<PoolHandle<E::Pool>> {
      let source = ProxyConnectionSource::with_driver(driver, url, PropertyBag::new());
      self.pool(source, Some(pool_props))
   }

   /// Release everything held by a pool created by this factory's engine.
   ///
   /// Callers must make sure nothing acquires from the pool once this
   /// starts. Destroying the same pool twice is not supported; what happens
   /// is up to the engine.
   pub fn destroy(&self, target: impl Into<DestroyTarget<E::Pool>>) -> Result<()> {
      let target: DestroyTarget<E::Pool> = target.into();
      self.engine.destroy_pool(&target.into_source())
   }

   fn pool_spec(
      &self,
      driver: Option<Arc<dyn Driver>>,
      spec: &ConnectionSpec,
      pool_props: Option<&SpecMap>,
   ) -> Result<PoolHandle<E::Pool>> {
      let url = spec.connection_string()?;
      let properties = spec.properties()?;

      let driver = match (driver, spec.classname.as_deref()) {
         (Some(driver), _) => Some(driver),
         (None, Some(name)) => Some(self.registry.driver_named(name).ok_or_else(|| {
            Error::InvalidSpec(format!("no driver registered under classname `{name}`"))
         })?),
         (None, None) => None,
      };

      let source = match driver {
         Some(driver) => ProxyConnectionSource::with_driver(driver, url, properties),
         None => ProxyConnectionSource::with_registry(Arc::clone(&self.registry), url, properties),
      };
      self.pool(source, pool_props)
   }

   fn pool(
      &self,
      source: ProxyConnectionSource,
      pool_props: Option<&SpecMap>,
   ) -> Result<PoolHandle<E::Pool>> {
      let pool_props = pool_props.map(encode);
      debug!(
         url = %source.url(),
         tuning = ?pool_props.as_ref().map(|p| p.iter().map(|(k, _)| k).collect::<Vec<_>>()),
         "Creating pooled connection source"
      );

      let pool = self.engine.create_pool(source, pool_props.as_ref())?;
      Ok(PoolHandle::new(pool))
   }
}
