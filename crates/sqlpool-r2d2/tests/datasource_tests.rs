use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use sqlpool_core::{
   Connection, ConnectionError, ConnectionSource, Driver, DriverError, Error, PoolEngine,
   PropertyBag, ProxyConnectionSource,
};
use sqlpool_r2d2::{PoolConfig, PooledDataSource, R2d2Engine};

struct TestConnection {
   id: usize,
   properties: PropertyBag,
}

impl Connection for TestConnection {}

/// Counts connections and can be switched into refusing them.
#[derive(Default)]
struct CountingDriver {
   opened: AtomicUsize,
   refuse: AtomicBool,
}

impl Driver for CountingDriver {
   fn accepts(&self, url: &str) -> bool {
      url.starts_with("test:")
   }

   fn connect(&self, _url: &str, properties: &PropertyBag) -> Result<Box<dyn Connection>, DriverError> {
      if self.refuse.load(Ordering::SeqCst) {
         return Err("database is down".into());
      }
      let id = self.opened.fetch_add(1, Ordering::SeqCst);
      Ok(Box::new(TestConnection {
         id,
         properties: properties.clone(),
      }))
   }
}

fn init_tracing() {
   let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn setup(properties: Option<&PropertyBag>) -> (Arc<CountingDriver>, PooledDataSource) {
   init_tracing();
   let driver = Arc::new(CountingDriver::default());
   let source = ProxyConnectionSource::with_driver(
      driver.clone(),
      "test:db",
      PropertyBag::from_iter([("user", "app")]),
   );
   let pool = R2d2Engine::default().create_pool(source, properties).unwrap();
   (driver, pool)
}

fn test_conn(conn: &dyn Connection) -> &TestConnection {
   conn.downcast_ref::<TestConnection>().unwrap()
}

// ============================================================================
// Pool Creation
// ============================================================================

#[test]
fn test_create_pool_opens_nothing() {
   let (driver, pool) = setup(None);
   assert_eq!(driver.opened.load(Ordering::SeqCst), 0);
   assert_eq!(pool.state().unwrap().connections, 0);
}

#[test]
fn test_tuning_properties_reach_config() {
   let props = PropertyBag::from_iter([("maxPoolSize", "2"), ("acquireRetryAttempts", "3")]);
   let (_, pool) = setup(Some(&props));
   assert_eq!(pool.config().max_size, 2);
}

#[test]
fn test_malformed_tuning_is_pool_creation_error() {
   let source =
      ProxyConnectionSource::with_driver(Arc::new(CountingDriver::default()), "test:db", PropertyBag::new());
   let props = PropertyBag::from_iter([("max_size", "0")]);

   let err = R2d2Engine::default().create_pool(source, Some(&props)).unwrap_err();
   assert!(matches!(err, Error::PoolCreation(_)));
   assert_eq!(err.error_code(), "POOL_CREATION_ERROR");
}

#[test]
fn test_huge_timeout_fails_at_creation_not_checkout() {
   let source =
      ProxyConnectionSource::with_driver(Arc::new(CountingDriver::default()), "test:db", PropertyBag::new());
   let max = u64::MAX.to_string();
   let props = PropertyBag::from_iter([("connection_timeout", max.as_str())]);

   let err = R2d2Engine::default().create_pool(source, Some(&props)).unwrap_err();
   assert!(matches!(err, Error::PoolCreation(_)));
}

#[test]
fn test_engine_config_is_the_base() {
   let engine = R2d2Engine::new(PoolConfig {
      max_size: 3,
      ..Default::default()
   });
   let source =
      ProxyConnectionSource::with_driver(Arc::new(CountingDriver::default()), "test:db", PropertyBag::new());
   let pool = engine.create_pool(source, None).unwrap();
   assert_eq!(pool.config().max_size, 3);
}

// ============================================================================
// Acquisition
// ============================================================================

#[test]
fn test_connections_are_reused() {
   let (driver, pool) = setup(None);

   let first_id = {
      let conn = pool.get_connection().unwrap();
      test_conn(&**conn).id
   };
   let conn = pool.get_connection().unwrap();

   assert_eq!(test_conn(&**conn).id, first_id);
   assert_eq!(driver.opened.load(Ordering::SeqCst), 1);
   assert_eq!(test_conn(&**conn).properties.get("user"), Some("app"));
}

#[test]
fn test_explicit_credentials_use_their_own_pool() {
   let (driver, pool) = setup(None);

   let alice = pool.get_connection_as(Some("alice"), Some("a-pw")).unwrap();
   let bob = pool.get_connection_as(Some("bob"), None).unwrap();

   let alice_props = &test_conn(&**alice).properties;
   assert_eq!(alice_props.get("user"), Some("alice"));
   assert_eq!(alice_props.get("password"), Some("a-pw"));

   let bob_props = &test_conn(&**bob).properties;
   assert_eq!(bob_props.get("user"), Some("bob"));
   assert!(!bob_props.contains_key("password"));

   drop(alice);
   let again = pool.get_connection_as(Some("alice"), Some("a-pw")).unwrap();
   assert_eq!(test_conn(&**again).properties.get("user"), Some("alice"));
   assert_eq!(driver.opened.load(Ordering::SeqCst), 2);
}

#[test]
fn test_driver_failure_surfaces_as_checkout_error() {
   let props = PropertyBag::from_iter([("checkoutTimeout", "100")]);
   let (driver, pool) = setup(Some(&props));
   driver.refuse.store(true, Ordering::SeqCst);

   let err = pool.get_connection().unwrap_err();
   assert!(matches!(err, ConnectionError::Checkout(_)));
}

#[test]
fn test_concurrent_credentials_do_not_leak() {
   let (_, pool) = setup(None);

   std::thread::scope(|s| {
      for i in 0..8 {
         let pool = pool.clone();
         s.spawn(move || {
            let user = format!("user-{i}");
            let password = format!("pw-{i}");
            for _ in 0..20 {
               let conn = pool.get_connection_as(Some(&user), Some(&password)).unwrap();
               let props = &test_conn(&**conn).properties;
               assert_eq!(props.get("user"), Some(user.as_str()));
               assert_eq!(props.get("password"), Some(password.as_str()));
            }
         });
      }
   });
}

// ============================================================================
// Destruction
// ============================================================================

#[test]
fn test_destroy_closes_pool_for_all_clones() {
   let (_, pool) = setup(None);
   let clone = pool.clone();
   drop(pool.get_connection().unwrap());

   R2d2Engine::default().destroy_pool(&pool).unwrap();

   assert!(clone.is_destroyed());
   assert!(clone.state().is_none());
   assert!(matches!(clone.get_connection(), Err(ConnectionError::PoolClosed)));
   assert!(matches!(
      clone.get_connection_as(Some("u"), None),
      Err(ConnectionError::PoolClosed)
   ));
}

#[test]
fn test_checked_out_connection_outlives_destroy() {
   let (_, pool) = setup(None);
   let conn = pool.get_connection().unwrap();

   pool.destroy();

   assert_eq!(test_conn(&**conn).properties.get("user"), Some("app"));
   drop(conn);
}

#[test]
fn test_second_destroy_is_harmless() {
   let (_, pool) = setup(None);
   pool.destroy();
   pool.destroy();
   assert!(pool.is_destroyed());
}
