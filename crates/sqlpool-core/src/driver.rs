//! The driver seam and the ambient driver registry

use std::any::Any;
use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{ConnectionError, DriverError};
use crate::properties::PropertyBag;

/// A live connection produced by a [`Driver`].
///
/// Query execution belongs to the driver's own connection type; recover it
/// with [`downcast_ref`](dyn Connection::downcast_ref),
/// [`downcast_mut`](dyn Connection::downcast_mut) or, by value,
/// [`downcast`](dyn Connection::downcast).
pub trait Connection: Any + Send {
   /// Cheap liveness check used by pooling engines before handing out an
   /// idle connection.
   fn ping(&mut self) -> Result<(), DriverError> {
      Ok(())
   }

   /// Whether the connection is known to be unusable without a round trip.
   fn is_broken(&self) -> bool {
      false
   }
}

impl dyn Connection {
   pub fn downcast_ref<T: Connection>(&self) -> Option<&T> {
      let any: &dyn Any = self;
      any.downcast_ref()
   }

   pub fn downcast_mut<T: Connection>(&mut self) -> Option<&mut T> {
      let any: &mut dyn Any = self;
      any.downcast_mut()
   }

   /// Take ownership of the driver's connection, or get the box back if it
   /// holds some other type.
   pub fn downcast<T: Connection>(self: Box<Self>) -> Result<Box<T>, Box<dyn Connection>> {
      if self.downcast_ref::<T>().is_none() {
         return Err(self);
      }
      let any: Box<dyn Any> = self;
      match any.downcast::<T>() {
         Ok(conn) => Ok(conn),
         Err(_) => unreachable!("type checked above"),
      }
   }
}

impl fmt::Debug for dyn Connection {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str("Connection")
   }
}

/// A SQL driver.
pub trait Driver: Send + Sync {
   /// Whether this driver understands the connection string.
   fn accepts(&self, url: &str) -> bool;

   /// Open a new connection.
   fn connect(&self, url: &str, properties: &PropertyBag) -> Result<Box<dyn Connection>, DriverError>;
}

/// The scheme of a connection string: everything before the first `:`.
pub fn scheme_of(url: &str) -> &str {
   url.split_once(':').map_or(url, |(scheme, _)| scheme)
}

struct Registration {
   scheme: String,
   name: Option<String>,
   driver: Arc<dyn Driver>,
}

/// Thread-safe registry resolving connection strings to drivers.
///
/// Drivers are keyed by scheme and, optionally, by a name that a spec's
/// `classname` can refer to. When several drivers share a scheme, the
/// first one registered that [accepts](Driver::accepts) the string wins.
#[derive(Default)]
pub struct DriverRegistry {
   drivers: RwLock<Vec<Registration>>,
}

static GLOBAL: LazyLock<Arc<DriverRegistry>> = LazyLock::new(|| Arc::new(DriverRegistry::new()));

impl DriverRegistry {
   pub fn new() -> Self {
      Self::default()
   }

   /// The process-wide registry used when no registry is given explicitly.
   pub fn global() -> Arc<DriverRegistry> {
      Arc::clone(&GLOBAL)
   }

   pub fn register(&self, scheme: impl Into<String>, driver: Arc<dyn Driver>) {
      self.insert(scheme.into(), None, driver);
   }

   /// Register a driver that specs can also select by `classname`.
   pub fn register_named(
      &self,
      name: impl Into<String>,
      scheme: impl Into<String>,
      driver: Arc<dyn Driver>,
   ) {
      self.insert(scheme.into(), Some(name.into()), driver);
   }

   /// Remove every driver registered for `scheme`, returning how many were
   /// removed.
   pub fn deregister(&self, scheme: &str) -> usize {
      let mut drivers = self.drivers.write();
      let before = drivers.len();
      drivers.retain(|r| r.scheme != scheme);
      before - drivers.len()
   }

   /// Resolve the driver for a connection string.
   pub fn driver_for(&self, url: &str) -> Result<Arc<dyn Driver>, ConnectionError> {
      let scheme = scheme_of(url);
      debug!(url = %url, scheme = %scheme, "Resolving driver");
      self
         .drivers
         .read()
         .iter()
         .filter(|r| r.scheme == scheme)
         .find(|r| r.driver.accepts(url))
         .map(|r| Arc::clone(&r.driver))
         .ok_or_else(|| ConnectionError::NoSuitableDriver {
            url: url.to_string(),
         })
   }

   /// Look a driver up by its registration name.
   pub fn driver_named(&self, name: &str) -> Option<Arc<dyn Driver>> {
      self
         .drivers
         .read()
         .iter()
         .find(|r| r.name.as_deref() == Some(name))
         .map(|r| Arc::clone(&r.driver))
   }

   pub fn len(&self) -> usize {
      self.drivers.read().len()
   }

   pub fn is_empty(&self) -> bool {
      self.drivers.read().is_empty()
   }

   fn insert(&self, scheme: String, name: Option<String>, driver: Arc<dyn Driver>) {
      debug!(scheme = %scheme, name = ?name, "Registering driver");
      self.drivers.write().push(Registration {
         scheme,
         name,
         driver,
      });
   }
}

impl fmt::Debug for DriverRegistry {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let drivers = self.drivers.read();
      f.debug_list()
         .entries(drivers.iter().map(|r| (&r.scheme, &r.name)))
         .finish()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   struct Dummy(&'static str);

   impl Connection for Dummy {}

   struct PrefixDriver {
      tag: &'static str,
      prefix: &'static str,
   }

   impl Driver for PrefixDriver {
      fn accepts(&self, url: &str) -> bool {
         url.starts_with(self.prefix)
      }

      fn connect(&self, _url: &str, _props: &PropertyBag) -> Result<Box<dyn Connection>, DriverError> {
         Ok(Box::new(Dummy(self.tag)))
      }
   }

   fn driver(tag: &'static str, prefix: &'static str) -> Arc<dyn Driver> {
      Arc::new(PrefixDriver { tag, prefix })
   }

   fn tag_of(driver: &Arc<dyn Driver>, url: &str) -> &'static str {
      let conn = driver.connect(url, &PropertyBag::new()).unwrap();
      conn.downcast_ref::<Dummy>().unwrap().0
   }

   struct Other;

   impl Connection for Other {}

   #[test]
   fn test_downcast_by_value() {
      let conn: Box<dyn Connection> = Box::new(Dummy("owned"));
      let conn = match conn.downcast::<Other>() {
         Ok(_) => panic!("downcast to the wrong type succeeded"),
         Err(conn) => conn,
      };

      let dummy = conn.downcast::<Dummy>().unwrap();
      assert_eq!(dummy.0, "owned");
   }

   #[test]
   fn test_downcast_mut() {
      let mut conn: Box<dyn Connection> = Box::new(Dummy("before"));
      conn.downcast_mut::<Dummy>().unwrap().0 = "after";
      assert_eq!(conn.downcast_ref::<Dummy>().unwrap().0, "after");
      assert!(conn.downcast_mut::<Other>().is_none());
   }

   // Release builds compile logging out
   #[cfg(debug_assertions)]
   #[test]
   fn test_driver_resolution_is_logged() {
      use std::io;

      use parking_lot::Mutex;

      #[derive(Clone, Default)]
      struct Captured(Arc<Mutex<Vec<u8>>>);

      impl io::Write for Captured {
         fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
         }

         fn flush(&mut self) -> io::Result<()> {
            Ok(())
         }
      }

      let captured = Captured::default();
      let writer = captured.clone();
      let subscriber = tracing_subscriber::fmt()
         .with_max_level(tracing::Level::DEBUG)
         .with_ansi(false)
         .with_writer(move || writer.clone())
         .finish();

      let registry = DriverRegistry::new();
      registry.register("mysql", driver("my", "mysql:"));
      tracing::subscriber::with_default(subscriber, || {
         registry.driver_for("mysql://db/shop").unwrap();
      });

      let output = String::from_utf8(captured.0.lock().clone()).unwrap();
      assert!(output.contains("Resolving driver"), "{output}");
      assert!(output.contains("mysql://db/shop"), "{output}");
   }

   #[test]
   fn test_scheme_of() {
      assert_eq!(scheme_of("postgresql://localhost/db"), "postgresql");
      assert_eq!(scheme_of("sqlite::memory:"), "sqlite");
      assert_eq!(scheme_of("noscheme"), "noscheme");
   }

   #[test]
   fn test_resolves_by_scheme() {
      let registry = DriverRegistry::new();
      registry.register("postgresql", driver("pg", "postgresql:"));
      registry.register("mysql", driver("my", "mysql:"));

      let url = "mysql://db/shop";
      assert_eq!(tag_of(&registry.driver_for(url).unwrap(), url), "my");
   }

   #[test]
   fn test_first_accepting_driver_wins() {
      let registry = DriverRegistry::new();
      registry.register("sqlite", driver("file", "sqlite:/"));
      registry.register("sqlite", driver("mem", "sqlite::memory:"));

      let url = "sqlite::memory:";
      assert_eq!(tag_of(&registry.driver_for(url).unwrap(), url), "mem");
   }

   #[test]
   fn test_unknown_scheme_has_no_driver() {
      let registry = DriverRegistry::new();
      registry.register("postgresql", driver("pg", "postgresql:"));

      let err = registry.driver_for("oracle:thin:@x").err().unwrap();
      assert!(matches!(err, ConnectionError::NoSuitableDriver { ref url } if url == "oracle:thin:@x"));
   }

   #[test]
   fn test_named_lookup_and_deregister() {
      let registry = DriverRegistry::new();
      registry.register_named("pg.Driver", "postgresql", driver("pg", "postgresql:"));
      assert!(registry.driver_named("pg.Driver").is_some());
      assert!(registry.driver_named("other").is_none());

      assert_eq!(registry.deregister("postgresql"), 1);
      assert!(registry.is_empty());
   }
}
