//! Pooled connection source backed by r2d2

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use r2d2::Pool;
use scheduled_thread_pool::ScheduledThreadPool;
use sqlpool_core::{ConnectionError, ConnectionSource, ProxyConnectionSource};
use tracing::{debug, trace, warn};

use crate::config::{PoolConfig, TuningError};
use crate::manager::{Credentials, ProxyConnectionManager, TracingErrorHandler};

/// A connection checked out of a [`PooledDataSource`].
///
/// Derefs to the driver's `Box<dyn Connection>` and returns to its pool when
/// dropped.
pub type PooledConnection = r2d2::PooledConnection<ProxyConnectionManager>;

/// Worker threads shared by every pool of one data source
const WORKER_THREADS: usize = 3;

/// Connection counts for the default pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
   /// Connections currently open, idle or checked out
   pub connections: u32,
   /// Open connections waiting in the pool
   pub idle_connections: u32,
}

struct Pools {
   default: Pool<ProxyConnectionManager>,
   by_credentials: HashMap<Credentials, Pool<ProxyConnectionManager>>,
}

struct Inner {
   source: ProxyConnectionSource,
   config: PoolConfig,
   workers: Arc<ScheduledThreadPool>,
   /// `None` once destroyed
   pools: RwLock<Option<Pools>>,
}

/// A pooled [`ConnectionSource`].
///
/// ## Architecture
///
/// - **default pool**: serves [`get_connection`](ConnectionSource::get_connection)
///   with the credentials baked into the proxy source
/// - **credential sub-pools**: one per distinct username/password pair passed to
///   [`get_connection_as`](ConnectionSource::get_connection_as), created on
///   first use with the same [`PoolConfig`]
///
/// Every pool runs its connection opening and reaping on one worker thread
/// pool owned by the data source, so credential sub-pools cost no extra
/// threads. Sub-pools are kept until [`destroy`](Self::destroy); each holds
/// up to `max_size` connections of its own.
///
/// Pools open connections lazily, so creating a data source never touches the
/// database. Clones share the same pools.
#[derive(Clone)]
pub struct PooledDataSource {
   inner: Arc<Inner>,
}

impl PooledDataSource {
   pub fn new(source: ProxyConnectionSource, config: PoolConfig) -> Result<Self, TuningError> {
      config.validate()?;
      let workers = Arc::new(ScheduledThreadPool::with_name("sqlpool-r2d2-worker-{}", WORKER_THREADS));
      let default = build_pool(&config, &workers, ProxyConnectionManager::new(source.clone()));
      debug!(url = %source.url(), max_size = config.max_size, "Created connection pool");

      Ok(Self {
         inner: Arc::new(Inner {
            source,
            config,
            workers,
            pools: RwLock::new(Some(Pools {
               default,
               by_credentials: HashMap::new(),
            })),
         }),
      })
   }

   pub fn config(&self) -> &PoolConfig {
      &self.inner.config
   }

   pub fn url(&self) -> &str {
      self.inner.source.url()
   }

   /// Connection counts for the default pool, or `None` once destroyed.
   pub fn state(&self) -> Option<PoolState> {
      let pools = self.inner.pools.read();
      pools.as_ref().map(|p| {
         let state = p.default.state();
         PoolState {
            connections: state.connections,
            idle_connections: state.idle_connections,
         }
      })
   }

   /// Number of credential sub-pools created so far, or zero once destroyed.
   pub fn credential_pools(&self) -> usize {
      self.inner.pools.read().as_ref().map_or(0, |p| p.by_credentials.len())
   }

   pub fn is_destroyed(&self) -> bool {
      self.inner.pools.read().is_none()
   }

   /// Drop every pool held by this data source and its clones.
   ///
   /// Idle connections close immediately. Checked-out connections stay
   /// usable and are closed when returned. Later acquisitions fail with
   /// [`ConnectionError::PoolClosed`]. A second call only logs a warning.
   pub fn destroy(&self) {
      let pools = self.inner.pools.write().take();
      match pools {
         Some(pools) => {
            debug!(
               url = %self.url(),
               credential_pools = pools.by_credentials.len(),
               "Destroying connection pool"
            );
            drop(pools);
         }
         None => warn!(url = %self.url(), "Connection pool already destroyed"),
      }
   }

   fn credential_pool(
      &self,
      credentials: Credentials,
   ) -> Result<Pool<ProxyConnectionManager>, ConnectionError> {
      if let Some(pool) = self
         .inner
         .pools
         .read()
         .as_ref()
         .ok_or(ConnectionError::PoolClosed)?
         .by_credentials
         .get(&credentials)
      {
         return Ok(pool.clone());
      }

      let mut guard = self.inner.pools.write();
      let pools = guard.as_mut().ok_or(ConnectionError::PoolClosed)?;
      let pool = pools
         .by_credentials
         .entry(credentials)
         .or_insert_with_key(|credentials| {
            debug!(url = %self.url(), username = ?credentials.username, "Creating credential pool");
            build_pool(
               &self.inner.config,
               &self.inner.workers,
               ProxyConnectionManager::with_credentials(self.inner.source.clone(), credentials.clone()),
            )
         });
      Ok(pool.clone())
   }
}

impl ConnectionSource for PooledDataSource {
   type Connection = PooledConnection;

   fn get_connection(&self) -> Result<Self::Connection, ConnectionError> {
      // Clone the pool out so the lock is not held while waiting on a checkout
      let pool = self
         .inner
         .pools
         .read()
         .as_ref()
         .map(|p| p.default.clone())
         .ok_or(ConnectionError::PoolClosed)?;

      trace!(url = %self.url(), "Checking out connection");
      pool.get().map_err(|e| ConnectionError::Checkout(e.to_string()))
   }

   /// Check out a connection opened with explicit credentials.
   ///
   /// The first call for a username/password pair creates a sub-pool for it,
   /// which lives until the data source is destroyed.
   fn get_connection_as(
      &self,
      username: Option<&str>,
      password: Option<&str>,
   ) -> Result<Self::Connection, ConnectionError> {
      let pool = self.credential_pool(Credentials {
         username: username.map(str::to_string),
         password: password.map(str::to_string),
      })?;

      trace!(url = %self.url(), username = ?username, "Checking out connection");
      pool.get().map_err(|e| ConnectionError::Checkout(e.to_string()))
   }
}

impl fmt::Debug for PooledDataSource {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("PooledDataSource")
         .field("source", &self.inner.source)
         .field("config", &self.inner.config)
         .field("state", &self.state())
         .finish()
   }
}

fn build_pool(
   config: &PoolConfig,
   workers: &Arc<ScheduledThreadPool>,
   manager: ProxyConnectionManager,
) -> Pool<ProxyConnectionManager> {
   Pool::builder()
      .max_size(config.max_size)
      .min_idle(config.min_idle)
      .idle_timeout(config.idle_timeout.filter(|d| !d.is_zero()))
      .max_lifetime(config.max_lifetime.filter(|d| !d.is_zero()))
      .connection_timeout(config.connection_timeout)
      .test_on_check_out(config.test_on_check_out)
      .error_handler(Box::new(TracingErrorHandler))
      .thread_pool(Arc::clone(workers))
      .build_unchecked(manager)
}
