//! # sqlpool
//!
//! Connection spec in, pooled connection source out.
//!
//! Callers describe a database with a [`ConnectionSpec`] (or a bare URL),
//! get back a [`PoolHandle`] holding a pooled [`ConnectionSource`], and hand
//! the handle back to [`destroy`] when done. Neither the driver nor the
//! pooling engine is visible to callers, so either can change without
//! touching them.
//!
//! ## Core Types
//!
//! - **[`PoolFactory`]**: Builds pools on any [`PoolEngine`]; the free
//!   functions in this crate use the default [`R2d2Engine`]
//! - **[`PoolHandle`]**: The record returned to callers, with the pooled
//!   source under [`PoolHandle::DATASOURCE_KEY`]
//! - **[`DestroyTarget`]**: A handle or a raw pooled source to tear down
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sqlpool::{ConnectionSource, ConnectionSpec, DriverRegistry};
//! # use sqlpool::{Connection, Driver, DriverError, PropertyBag};
//! # struct PgDriver;
//! # impl Driver for PgDriver {
//! #    fn accepts(&self, _: &str) -> bool { true }
//! #    fn connect(&self, _: &str, _: &PropertyBag) -> Result<Box<dyn Connection>, DriverError> {
//! #       unimplemented!()
//! #    }
//! # }
//!
//! # fn main() -> sqlpool::Result<()> {
//! DriverRegistry::global().register("postgresql", Arc::new(PgDriver));
//!
//! let spec = ConnectionSpec::new("postgresql", "//localhost/app").with_username("app");
//! let handle = sqlpool::from_spec(&spec)?;
//!
//! let conn = handle.datasource.get_connection()?;
//! drop(conn);
//!
//! sqlpool::destroy(handle)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

mod factory;
mod handle;
mod lifecycle;

pub use factory::PoolFactory;
pub use handle::PoolHandle;
pub use lifecycle::DestroyTarget;

// Re-export public types
pub use sqlpool_core::{
   Connection, ConnectionError, ConnectionSource, ConnectionSpec, Driver, DriverError,
   DriverRegistry, Enumerated, Error, PoolEngine, PropertyBag, ProxyConnectionSource, Result,
   SpecMap, SpecValue, encode, merge_credentials,
};
pub use sqlpool_r2d2::{PoolConfig, PoolState, PooledConnection, PooledDataSource, R2d2Engine};

/// Handle type produced by the free functions in this crate
pub type DataSourceHandle = PoolHandle<PooledDataSource>;

fn default_factory() -> PoolFactory<R2d2Engine> {
   PoolFactory::default()
}

/// Pool a spec with default tuning, resolving drivers from the global
/// registry.
pub fn from_spec(spec: &ConnectionSpec) -> Result<DataSourceHandle> {
   default_factory().from_spec(spec)
}

pub fn from_spec_with(spec: &ConnectionSpec, pool_props: &SpecMap) -> Result<DataSourceHandle> {
   default_factory().from_spec_with(spec, pool_props)
}

pub fn from_driver(
   driver: Arc<dyn Driver>,
   spec: &ConnectionSpec,
   pool_props: &SpecMap,
) -> Result<DataSourceHandle> {
   default_factory().from_driver(driver, spec, pool_props)
}

pub fn from_url(url: &str) -> Result<DataSourceHandle> {
   default_factory().from_url(url)
}

pub fn from_url_with(url: &str, pool_props: &SpecMap) -> Result<DataSourceHandle> {
   default_factory().from_url_with(url, pool_props)
}

pub fn from_driver_url(
   driver: Arc<dyn Driver>,
   url: &str,
   pool_props: &SpecMap,
) -> Result<DataSourceHandle> {
   default_factory().from_driver_url(driver, url, pool_props)
}

/// Tear down a pool given its handle or its pooled source.
pub fn destroy(target: impl Into<DestroyTarget<PooledDataSource>>) -> Result<()> {
   default_factory().destroy(target)
}
