//! Flat string property bags consumed by drivers and pooling engines

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::SpecValue;

/// Property key reserved for the connecting user
pub const USER_KEY: &str = "user";

/// Property key reserved for the connecting user's password
pub const PASSWORD_KEY: &str = "password";

/// String-keyed, string-valued configuration handed to a driver or engine.
///
/// Equality ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(IndexMap<String, String>);

impl PropertyBag {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn get(&self, key: &str) -> Option<&str> {
      self.0.get(key).map(String::as_str)
   }

   pub fn contains_key(&self, key: &str) -> bool {
      self.0.contains_key(key)
   }

   /// Insert a property, returning the previous value if there was one.
   pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
      self.0.insert(key.into(), value.into())
   }

   pub fn remove(&mut self, key: &str) -> Option<String> {
      self.0.shift_remove(key)
   }

   pub fn len(&self) -> usize {
      self.0.len()
   }

   pub fn is_empty(&self) -> bool {
      self.0.is_empty()
   }

   pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
      self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
   }

   /// Copy of this bag with credentials merged in; see [`merge_credentials`].
   pub fn with_credentials(&self, username: Option<&str>, password: Option<&str>) -> Self {
      merge_credentials(Some(self), username, password)
   }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyBag {
   fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
      Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
   }
}

/// Reduce a key to its short name: a leading `:` is dropped, and a
/// namespaced key (`ns/name`) keeps only its final segment.
pub fn canonical_key(key: &str) -> &str {
   let key = key.strip_prefix(':').unwrap_or(key);
   match key.rsplit_once('/') {
      Some((_, name)) if !name.is_empty() => name,
      _ => key,
   }
}

/// Encode a generic mapping into a property bag.
///
/// Keys are reduced with [`canonical_key`]; values use
/// [`SpecValue::render`]. Nothing is dropped.
pub fn encode<'a, I>(mapping: I) -> PropertyBag
where
   I: IntoIterator<Item = (&'a String, &'a SpecValue)>,
{
   mapping
      .into_iter()
      .map(|(k, v)| (canonical_key(k).to_string(), v.render()))
      .collect()
}

/// Build a fresh bag from `bag` (or an empty one) with the credential keys
/// set from `username` and `password`.
///
/// An absent credential removes its key entirely. Drivers treat a missing
/// `password` differently from an empty one. The input is never mutated, so
/// each acquisition gets its own independent bag.
pub fn merge_credentials(
   bag: Option<&PropertyBag>,
   username: Option<&str>,
   password: Option<&str>,
) -> PropertyBag {
   let mut merged = bag.cloned().unwrap_or_default();
   for (key, value) in [(USER_KEY, username), (PASSWORD_KEY, password)] {
      match value {
         Some(value) => {
            merged.insert(key, value);
         }
         None => {
            merged.remove(key);
         }
      }
   }
   merged
}
