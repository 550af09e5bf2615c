//! Connection sources and the proxy source handed to pooling engines

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::driver::{Connection, Driver, DriverRegistry};
use crate::error::ConnectionError;
use crate::properties::{PropertyBag, merge_credentials};

/// Something that produces live database connections on demand.
pub trait ConnectionSource: Send + Sync {
   type Connection;

   /// Acquire a connection with the credentials fixed at construction.
   fn get_connection(&self) -> Result<Self::Connection, ConnectionError>;

   /// Acquire a connection with explicit credentials, overriding the
   /// constructed ones for this call only. An absent credential is left
   /// out of the request entirely.
   fn get_connection_as(
      &self,
      username: Option<&str>,
      password: Option<&str>,
   ) -> Result<Self::Connection, ConnectionError>;
}

#[derive(Clone)]
enum DriverResolver {
   Registry(Arc<DriverRegistry>),
   Explicit(Arc<dyn Driver>),
}

/// Opens connections straight through a driver, for use as a pooling
/// engine's connection factory.
///
/// Engines that open connections by themselves tend to assume a driver
/// registry that custom drivers are not part of. This source resolves the
/// driver itself, either from a [`DriverRegistry`] by scheme or from a
/// driver given explicitly, and the engine only ever calls
/// [`ConnectionSource::get_connection`].
///
/// The source is immutable and cheap to clone. Every acquisition builds its
/// own property bag, so concurrent callers never observe each other's
/// credentials.
#[derive(Clone)]
pub struct ProxyConnectionSource {
   url: Arc<str>,
   properties: Arc<PropertyBag>,
   resolver: DriverResolver,
}

impl ProxyConnectionSource {
   /// Resolve drivers from the global registry.
   pub fn new(url: impl Into<String>, properties: PropertyBag) -> Self {
      Self::with_registry(DriverRegistry::global(), url, properties)
   }

   /// Resolve drivers from a specific registry.
   pub fn with_registry(
      registry: Arc<DriverRegistry>,
      url: impl Into<String>,
      properties: PropertyBag,
   ) -> Self {
      Self::build(DriverResolver::Registry(registry), url.into(), properties)
   }

   /// Always connect through `driver`, skipping registry resolution.
   pub fn with_driver(
      driver: Arc<dyn Driver>,
      url: impl Into<String>,
      properties: PropertyBag,
   ) -> Self {
      Self::build(DriverResolver::Explicit(driver), url.into(), properties)
   }

   fn build(resolver: DriverResolver, url: String, properties: PropertyBag) -> Self {
      Self {
         url: url.into(),
         properties: Arc::new(properties),
         resolver,
      }
   }

   pub fn url(&self) -> &str {
      &self.url
   }

   /// The base properties every acquisition starts from.
   pub fn properties(&self) -> &PropertyBag {
      &self.properties
   }

   fn connect(&self, properties: &PropertyBag) -> Result<Box<dyn Connection>, ConnectionError> {
      let driver = match &self.resolver {
         DriverResolver::Registry(registry) => registry.driver_for(&self.url)?,
         DriverResolver::Explicit(driver) => Arc::clone(driver),
      };

      trace!(url = %self.url, "Opening connection");
      driver
         .connect(&self.url, properties)
         .map_err(|source| ConnectionError::Driver {
            url: self.url.to_string(),
            source,
         })
   }
}

impl ConnectionSource for ProxyConnectionSource {
   type Connection = Box<dyn Connection>;

   fn get_connection(&self) -> Result<Self::Connection, ConnectionError> {
      self.connect(&self.properties)
   }

   fn get_connection_as(
      &self,
      username: Option<&str>,
      password: Option<&str>,
   ) -> Result<Self::Connection, ConnectionError> {
      let properties = merge_credentials(Some(&self.properties), username, password);
      self.connect(&properties)
   }
}

impl fmt::Debug for ProxyConnectionSource {
   // Property values may hold a password; only the keys are shown.
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let keys: Vec<&str> = self.properties.iter().map(|(k, _)| k).collect();
      let resolver = match self.resolver {
         DriverResolver::Registry(_) => "registry",
         DriverResolver::Explicit(_) => "explicit",
      };
      f.debug_struct("ProxyConnectionSource")
         .field("url", &self.url)
         .field("properties", &keys)
         .field("resolver", &resolver)
         .finish()
   }
}
