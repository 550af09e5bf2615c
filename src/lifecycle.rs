//! Pool destruction targets

use std::any::Any;

use sqlpool_core::{Error, Result};

use crate::handle::PoolHandle;

/// What [`PoolFactory::destroy`](crate::PoolFactory::destroy) accepts: a
/// handle returned by the factory, or the pooled source taken out of one.
#[derive(Debug, Clone)]
pub enum DestroyTarget<P> {
   Handle(PoolHandle<P>),
   Source(P),
}

impl<P> DestroyTarget<P> {
   /// The pooled source this target ultimately refers to.
   pub fn into_source(self) -> P {
      match self {
         DestroyTarget::Handle(handle) => handle.into_datasource(),
         DestroyTarget::Source(source) => source,
      }
   }
}

impl<P> From<PoolHandle<P>> for DestroyTarget<P> {
   fn from(handle: PoolHandle<P>) -> Self {
      DestroyTarget::Handle(handle)
   }
}

impl<P> From<P> for DestroyTarget<P> {
   fn from(source: P) -> Self {
      DestroyTarget::Source(source)
   }
}

/// Recover a target from a dynamically typed value, such as one kept in a
/// heterogeneous resource map.
impl<P: 'static> TryFrom<Box<dyn Any + Send>> for DestroyTarget<P> {
   type Error = Error;

   fn try_from(value: Box<dyn Any + Send>) -> Result<Self> {
      let value = match value.downcast::<DestroyTarget<P>>() {
         Ok(target) => return Ok(*target),
         Err(value) => value,
      };
      let value = match value.downcast::<PoolHandle<P>>() {
         Ok(handle) => return Ok(DestroyTarget::Handle(*handle)),
         Err(value) => value,
      };
      match value.downcast::<P>() {
         Ok(source) => Ok(DestroyTarget::Source(*source)),
         Err(_) => Err(Error::InvalidArgument(format!(
            "cannot destroy this value: expected a PoolHandle<{0}> or a {0}",
            std::any::type_name::<P>()
         ))),
      }
   }
}
