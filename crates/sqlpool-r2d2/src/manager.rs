//! r2d2 connection manager over a proxy connection source

use sqlpool_core::{Connection, ConnectionError, ConnectionSource, ProxyConnectionSource};
use tracing::warn;

/// Credentials a sub-pool opens its connections with
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct Credentials {
   pub username: Option<String>,
   pub password: Option<String>,
}

/// Adapts a [`ProxyConnectionSource`] to [`r2d2::ManageConnection`].
///
/// r2d2 never sees a driver; every new connection goes through the proxy
/// source, optionally with a fixed set of credentials.
#[derive(Debug)]
pub struct ProxyConnectionManager {
   source: ProxyConnectionSource,
   credentials: Option<Credentials>,
}

impl ProxyConnectionManager {
   pub fn new(source: ProxyConnectionSource) -> Self {
      Self {
         source,
         credentials: None,
      }
   }

   pub(crate) fn with_credentials(source: ProxyConnectionSource, credentials: Credentials) -> Self {
      Self {
         source,
         credentials: Some(credentials),
      }
   }
}

impl r2d2::ManageConnection for ProxyConnectionManager {
   type Connection = Box<dyn Connection>;
   type Error = ConnectionError;

   fn connect(&self) -> Result<Self::Connection, Self::Error> {
      match &self.credentials {
         None => self.source.get_connection(),
         Some(c) => self
            .source
            .get_connection_as(c.username.as_deref(), c.password.as_deref()),
      }
   }

   fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
      conn.ping().map_err(|source| ConnectionError::Driver {
         url: self.source.url().to_string(),
         source,
      })
   }

   fn has_broken(&self, conn: &mut Self::Connection) -> bool {
      conn.is_broken()
   }
}

/// Routes r2d2's background connection errors into `tracing`.
#[derive(Debug)]
pub(crate) struct TracingErrorHandler;

impl r2d2::HandleError<ConnectionError> for TracingErrorHandler {
   fn handle_error(&self, error: ConnectionError) {
      warn!(error = %error, "Pool failed to open a connection");
   }
}

impl std::fmt::Debug for Credentials {
   // Never print the password
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("Credentials")
         .field("username", &self.username)
         .field("password", &self.password.as_ref().map(|_| "***"))
         .finish()
   }
}
