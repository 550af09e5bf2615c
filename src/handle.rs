/// The record handed back by every [`PoolFactory`](crate::PoolFactory)
/// method: the pooled connection source under a fixed key.
#[derive(Debug, Clone)]
pub struct PoolHandle<P> {
   pub datasource: P,
}

impl<P> PoolHandle<P> {
   /// The key the pooled source is stored under
   pub const DATASOURCE_KEY: &'static str = "datasource";

   pub fn new(datasource: P) -> Self {
      Self { datasource }
   }

   pub fn datasource(&self) -> &P {
      &self.datasource
   }

   pub fn into_datasource(self) -> P {
      self.datasource
   }

   /// Key-based access, for callers that treat the handle as a record.
   pub fn get(&self, key: &str) -> Option<&P> {
      (key == Self::DATASOURCE_KEY).then_some(&self.datasource)
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_get_by_fixed_key() {
      let handle = PoolHandle::new(7);
      assert_eq!(handle.get("datasource"), Some(&7));
      assert_eq!(handle.get("pool"), None);
      assert_eq!(handle.into_datasource(), 7);
   }
}
