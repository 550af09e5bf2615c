//! Kept in its own test binary so no other test spawns threads while the
//! process thread count is sampled.

use std::sync::Arc;

use sqlpool_core::{
   Connection, ConnectionSource, Driver, DriverError, PoolEngine, PropertyBag, ProxyConnectionSource,
};
use sqlpool_r2d2::R2d2Engine;

struct NullConnection;

impl Connection for NullConnection {}

struct NullDriver;

impl Driver for NullDriver {
   fn accepts(&self, url: &str) -> bool {
      url.starts_with("null:")
   }

   fn connect(&self, _url: &str, _properties: &PropertyBag) -> Result<Box<dyn Connection>, DriverError> {
      Ok(Box::new(NullConnection))
   }
}

#[cfg(target_os = "linux")]
fn thread_count() -> usize {
   std::fs::read_dir("/proc/self/task").map_or(0, |tasks| tasks.count())
}

#[cfg(target_os = "linux")]
#[test]
fn test_credential_pools_share_worker_threads() {
   let source = ProxyConnectionSource::with_driver(Arc::new(NullDriver), "null:db", PropertyBag::new());
   let pool = R2d2Engine::default().create_pool(source, None).unwrap();
   drop(pool.get_connection().unwrap());

   let before = thread_count();
   for i in 0..50 {
      let user = format!("user-{i}");
      drop(pool.get_connection_as(Some(&user), Some("pw")).unwrap());
   }

   assert_eq!(pool.credential_pools(), 50);
   assert!(
      thread_count() <= before,
      "thread count grew from {before} to {}",
      thread_count()
   );

   pool.destroy();
   assert_eq!(pool.credential_pools(), 0);
}
