//! Configuration for r2d2-backed connection pools

use std::str::FromStr;
use std::time::Duration;

use sqlpool_core::PropertyBag;
use thiserror::Error;
use tracing::warn;

/// Longest checkout wait accepted. r2d2 adds the timeout to `Instant::now()`
/// on every checkout, which overflows for very large values.
pub const MAX_CONNECTION_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for [`PooledDataSource`](crate::PooledDataSource) pools
///
/// # Examples
///
/// ```
/// use sqlpool_r2d2::PoolConfig;
/// use std::time::Duration;
///
/// // Use defaults
/// let config = PoolConfig::default();
///
/// // Override just a few fields
/// let config = PoolConfig {
///     max_size: 4,
///     idle_timeout: Some(Duration::from_secs(60)),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
   /// Maximum number of connections, idle or checked out
   ///
   /// Default: 10
   pub max_size: u32,

   /// Number of idle connections the pool tries to keep open
   ///
   /// `None` keeps the pool filled to `max_size`. The default of zero opens
   /// connections only on demand, so creating a pool never touches the
   /// database.
   ///
   /// Default: `Some(0)`
   pub min_idle: Option<u32>,

   /// Idle connections older than this are closed. `None` never closes them.
   ///
   /// Default: 10 minutes
   pub idle_timeout: Option<Duration>,

   /// Connections older than this are closed when returned to the pool.
   ///
   /// Default: 30 minutes
   pub max_lifetime: Option<Duration>,

   /// How long a checkout waits for a connection before failing
   ///
   /// Must be non-zero and at most [`MAX_CONNECTION_TIMEOUT`].
   ///
   /// Default: 30 seconds
   pub connection_timeout: Duration,

   /// Ping idle connections before handing them out
   ///
   /// Default: true
   pub test_on_check_out: bool,
}

impl Default for PoolConfig {
   fn default() -> Self {
      Self {
         max_size: 10,
         min_idle: Some(0),
         idle_timeout: Some(Duration::from_secs(10 * 60)),
         max_lifetime: Some(Duration::from_secs(30 * 60)),
         connection_timeout: Duration::from_secs(30),
         test_on_check_out: true,
      }
   }
}

/// Why a set of tuning properties could not become a [`PoolConfig`]
#[derive(Error, Debug, PartialEq)]
pub enum TuningError {
   #[error("property `{key}` has invalid value `{value}`: expected {expected}")]
   InvalidValue {
      key: String,
      value: String,
      expected: &'static str,
   },

   #[error("`max_size` must be greater than zero")]
   ZeroMaxSize,

   #[error("`connection_timeout` must be greater than zero")]
   ZeroConnectionTimeout,

   #[error("`connection_timeout` ({timeout:?}) must not exceed {max:?}")]
   ConnectionTimeoutTooLong { timeout: Duration, max: Duration },

   #[error("`min_idle` ({min_idle}) must not exceed `max_size` ({max_size})")]
   MinIdleExceedsMaxSize { min_idle: u32, max_size: u32 },
}

impl PoolConfig {
   /// Apply tuning properties on top of this config.
   ///
   /// Keys are accepted in snake_case or in their legacy camelCase spelling.
   /// Durations are whole seconds, except `checkoutTimeout` which is in
   /// milliseconds. A zero `idle_timeout` or `max_lifetime` disables it.
   /// Unrecognized keys are logged and skipped.
   pub fn with_properties(mut self, properties: &PropertyBag) -> Result<Self, TuningError> {
      for (key, value) in properties.iter() {
         match key {
            "max_size" | "maxPoolSize" => self.max_size = parse(key, value, "an integer")?,
            "min_idle" | "minPoolSize" => self.min_idle = Some(parse(key, value, "an integer")?),
            "idle_timeout" | "maxIdleTime" => self.idle_timeout = optional_secs(key, value)?,
            "max_lifetime" | "maxConnectionAge" => self.max_lifetime = optional_secs(key, value)?,
            "connection_timeout" => {
               self.connection_timeout = Duration::from_secs(parse(key, value, "whole seconds")?)
            }
            "checkoutTimeout" => {
               self.connection_timeout =
                  Duration::from_millis(parse(key, value, "whole milliseconds")?)
            }
            "test_on_check_out" | "testConnectionOnCheckout" => {
               self.test_on_check_out = parse(key, value, "true or false")?
            }
            _ => warn!(key = %key, "Ignoring unrecognized pool property"),
         }
      }
      self.validate()?;
      Ok(self)
   }

   /// Reject settings r2d2 would panic on.
   pub fn validate(&self) -> Result<(), TuningError> {
      if self.max_size == 0 {
         return Err(TuningError::ZeroMaxSize);
      }
      if self.connection_timeout.is_zero() {
         return Err(TuningError::ZeroConnectionTimeout);
      }
      if self.connection_timeout > MAX_CONNECTION_TIMEOUT {
         return Err(TuningError::ConnectionTimeoutTooLong {
            timeout: self.connection_timeout,
            max: MAX_CONNECTION_TIMEOUT,
         });
      }
      if let Some(min_idle) = self.min_idle
         && min_idle > self.max_size
      {
         return Err(TuningError::MinIdleExceedsMaxSize {
            min_idle,
            max_size: self.max_size,
         });
      }
      Ok(())
   }
}

fn parse<T: FromStr>(key: &str, value: &str, expected: &'static str) -> Result<T, TuningError> {
   value.trim().parse().map_err(|_| TuningError::InvalidValue {
      key: key.to_string(),
      value: value.to_string(),
      expected,
   })
}

fn optional_secs(key: &str, value: &str) -> Result<Option<Duration>, TuningError> {
   let secs: u64 = parse(key, value, "whole seconds")?;
   Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
