//! Values carried by connection specs and tuning maps

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// A generic configuration mapping: arbitrary keys to [`SpecValue`]s.
pub type SpecMap = IndexMap<String, SpecValue>;

/// Implemented by enums that are passed to drivers by symbolic name.
///
/// ```
/// use sqlpool_core::{Enumerated, SpecValue};
///
/// enum Mode {
///    Fast,
///    Safe,
/// }
///
/// impl Enumerated for Mode {
///    fn symbol(&self) -> &'static str {
///       match self {
///          Mode::Fast => "FAST",
///          Mode::Safe => "SAFE",
///       }
///    }
/// }
///
/// assert_eq!(SpecValue::from_enum(&Mode::Fast).render(), "FAST");
/// ```
pub trait Enumerated {
   /// The name the driver expects for this value
   fn symbol(&self) -> &'static str;
}

/// A spec or tuning value.
///
/// The set of shapes is closed, so rendering to a property string is decided
/// once here rather than at each use site.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecValue {
   /// Plain string, rendered verbatim
   Str(String),

   /// Enumerated value, rendered as its symbolic name
   Enum(String),

   /// Anything else (numbers, booleans, nested data), rendered via its
   /// display form
   Other(JsonValue),
}

impl SpecValue {
   /// Wrap an enumerated value by its symbol.
   pub fn from_enum<E: Enumerated + ?Sized>(value: &E) -> Self {
      SpecValue::Enum(value.symbol().to_string())
   }

   /// Canonical string form used in property bags.
   pub fn render(&self) -> String {
      match self {
         SpecValue::Str(s) | SpecValue::Enum(s) => s.clone(),
         SpecValue::Other(JsonValue::String(s)) => s.clone(),
         SpecValue::Other(v) => v.to_string(),
      }
   }
}

impl fmt::Display for SpecValue {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.render())
   }
}

impl From<&str> for SpecValue {
   fn from(value: &str) -> Self {
      SpecValue::Str(value.to_string())
   }
}

impl From<String> for SpecValue {
   fn from(value: String) -> Self {
      SpecValue::Str(value)
   }
}

impl From<JsonValue> for SpecValue {
   fn from(value: JsonValue) -> Self {
      match value {
         JsonValue::String(s) => SpecValue::Str(s),
         other => SpecValue::Other(other),
      }
   }
}

macro_rules! impl_from_primitive {
   ($($ty:ty),*) => {
      $(
         impl From<$ty> for SpecValue {
            fn from(value: $ty) -> Self {
               SpecValue::Other(JsonValue::from(value))
            }
         }
      )*
   };
}

impl_from_primitive!(bool, i32, i64, u32, u64, usize, f64);

impl Serialize for SpecValue {
   fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
      match self {
         SpecValue::Str(s) | SpecValue::Enum(s) => serializer.serialize_str(s),
         SpecValue::Other(v) => v.serialize(serializer),
      }
   }
}

impl<'de> Deserialize<'de> for SpecValue {
   fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
      JsonValue::deserialize(deserializer).map(SpecValue::from)
   }
}
