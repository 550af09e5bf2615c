//! Error types for sqlpool-core

use thiserror::Error;

/// Boxed error produced by a [`Driver`](crate::Driver) implementation.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that may occur while building, tuning, or tearing down a pool
#[derive(Error, Debug)]
pub enum Error {
   /// The connection spec is missing a required field (or names an
   /// unknown driver)
   #[error("invalid connection spec: {0}")]
   InvalidSpec(String),

   /// A driver or the driver registry failed to produce a connection
   #[error(transparent)]
   Connection(#[from] ConnectionError),

   /// The pooling engine rejected pool construction
   #[error("pool creation failed: {0}")]
   PoolCreation(String),

   /// An operation received a value of a shape it does not accept
   #[error("invalid argument: {0}")]
   InvalidArgument(String),
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::InvalidSpec(_) => "INVALID_SPEC".to_string(),
         Error::Connection(_) => "CONNECTION_ERROR".to_string(),
         Error::PoolCreation(_) => "POOL_CREATION_ERROR".to_string(),
         Error::InvalidArgument(_) => "INVALID_ARGUMENT".to_string(),
      }
   }
}

/// Failures to produce a live connection.
///
/// Nothing at this layer retries; each variant surfaces as soon as it happens.
#[derive(Error, Debug)]
pub enum ConnectionError {
   /// No registered driver claims the connection string's scheme
   #[error("no suitable driver found for {url}")]
   NoSuitableDriver { url: String },

   /// The driver was found but failed to connect
   #[error("driver failed to connect to {url}: {source}")]
   Driver {
      url: String,
      #[source]
      source: DriverError,
   },

   /// The pooling engine could not hand out a connection (e.g. checkout
   /// timed out)
   #[error("connection checkout failed: {0}")]
   Checkout(String),

   /// The pool was destroyed
   #[error("pool has been destroyed")]
   PoolClosed,
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
