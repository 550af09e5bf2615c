//! The seam to the pooling engine

use crate::Result;
use crate::properties::PropertyBag;
use crate::source::{ConnectionSource, ProxyConnectionSource};

/// A pooling engine: turns a connection source into a pooled one.
///
/// Sizing, idle eviction, and acquisition queuing all belong to the engine.
/// This layer only hands it a [`ProxyConnectionSource`] and whatever tuning
/// properties the caller supplied, uninterpreted.
pub trait PoolEngine: Send + Sync {
   /// The pooled connection source the engine produces
   type Pool: ConnectionSource + Clone + 'static;

   /// Create a pool drawing connections from `source`.
   ///
   /// Tuning properties the engine cannot use may be ignored or rejected
   /// with [`Error::PoolCreation`](crate::Error::PoolCreation), at the
   /// engine's discretion. A failed call leaves nothing to destroy.
   fn create_pool(
      &self,
      source: ProxyConnectionSource,
      properties: Option<&PropertyBag>,
   ) -> Result<Self::Pool>;

   /// Release everything the pool holds.
   ///
   /// Callers must stop acquiring from the pool before calling this; what
   /// happens to a second destroy is up to the engine.
   fn destroy_pool(&self, pool: &Self::Pool) -> Result<()>;
}
