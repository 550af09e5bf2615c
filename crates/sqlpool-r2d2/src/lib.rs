//! # sqlpool-r2d2
//!
//! The default pooling engine for `sqlpool`: runs a
//! [`ProxyConnectionSource`](sqlpool_core::ProxyConnectionSource) through
//! [r2d2](https://docs.rs/r2d2).
//!
//! ## Core Types
//!
//! - **[`R2d2Engine`]**: [`PoolEngine`](sqlpool_core::PoolEngine) implementation
//! - **[`PooledDataSource`]**: The pooled connection source it produces
//! - **[`PoolConfig`]**: Pool sizing and timeouts, overridable per pool with
//!   tuning properties
//!
//! ## Tuning Properties
//!
//! | key | legacy key | unit |
//! |-----|------------|------|
//! | `max_size` | `maxPoolSize` | connections |
//! | `min_idle` | `minPoolSize` | connections |
//! | `idle_timeout` | `maxIdleTime` | seconds, 0 = never |
//! | `max_lifetime` | `maxConnectionAge` | seconds, 0 = never |
//! | `connection_timeout` | `checkoutTimeout` | seconds / milliseconds, at most one day |
//! | `test_on_check_out` | `testConnectionOnCheckout` | `true`/`false` |
//!
//! Any other key is logged at `warn` and ignored.

mod config;
mod datasource;
mod engine;
mod manager;

pub use config::{MAX_CONNECTION_TIMEOUT, PoolConfig, TuningError};
pub use datasource::{PoolState, PooledConnection, PooledDataSource};
pub use engine::R2d2Engine;
pub use manager::ProxyConnectionManager;
