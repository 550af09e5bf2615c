//! # sqlpool-core
//!
//! The data model and driver plumbing behind `sqlpool`: everything needed to
//! turn a connection spec into a source of live connections, without
//! touching a pooling engine.
//!
//! ## Core Types
//!
//! - **[`ConnectionSpec`]**: How to reach a database (scheme, address,
//!   credentials, driver options)
//! - **[`PropertyBag`]**: Flat string properties handed to drivers and engines
//! - **[`Driver`]** / **[`DriverRegistry`]**: The driver seam and the
//!   scheme-keyed registry resolving connection strings to drivers
//! - **[`ProxyConnectionSource`]**: Opens connections directly through a
//!   driver, for use as a pooling engine's connection factory
//! - **[`PoolEngine`]**: The seam a pooling engine plugs into
//! - **[`Error`]**: Error type for spec, connection, and pool failures
//!
//! ## Data Flow
//!
//! ```text
//! ConnectionSpec ─┬─ connection_string() ─┐
//!                 └─ properties() ────────┴─> ProxyConnectionSource ─> PoolEngine::create_pool
//! ```

mod driver;
mod engine;
mod error;
mod properties;
mod source;
mod spec;
mod value;

// Re-export public types
pub use driver::{Connection, Driver, DriverRegistry, scheme_of};
pub use engine::PoolEngine;
pub use error::{ConnectionError, DriverError, Error, Result};
pub use properties::{
   PASSWORD_KEY, PropertyBag, USER_KEY, canonical_key, encode, merge_credentials,
};
pub use source::{ConnectionSource, ProxyConnectionSource};
pub use spec::ConnectionSpec;
pub use value::{Enumerated, SpecMap, SpecValue};
