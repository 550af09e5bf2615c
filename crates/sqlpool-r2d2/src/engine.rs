//! [`PoolEngine`] implementation for r2d2

use sqlpool_core::{Error, PoolEngine, PropertyBag, ProxyConnectionSource, Result};

use crate::config::PoolConfig;
use crate::datasource::PooledDataSource;

/// Pools proxy connection sources with r2d2.
///
/// Each pool starts from the engine's base [`PoolConfig`]; tuning properties
/// passed to [`create_pool`](PoolEngine::create_pool) override it per pool.
#[derive(Debug, Clone, Default)]
pub struct R2d2Engine {
   config: PoolConfig,
}

impl R2d2Engine {
   pub fn new(config: PoolConfig) -> Self {
      Self { config }
   }

   pub fn config(&self) -> &PoolConfig {
      &self.config
   }
}

impl PoolEngine for R2d2Engine {
   type Pool = PooledDataSource;

   fn create_pool(
      &self,
      source: ProxyConnectionSource,
      properties: Option<&PropertyBag>,
   ) -> Result<PooledDataSource> {
      let config = match properties {
         Some(properties) => self.config.clone().with_properties(properties),
         None => Ok(self.config.clone()),
      };

      config
         .and_then(|config| PooledDataSource::new(source, config))
         .map_err(|e| Error::PoolCreation(e.to_string()))
   }

   fn destroy_pool(&self, pool: &PooledDataSource) -> Result<()> {
      pool.destroy();
      Ok(())
   }
}
