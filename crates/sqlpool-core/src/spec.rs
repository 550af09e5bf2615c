//! Connection specs: how to reach a database

use serde::{Deserialize, Serialize};

use crate::properties::{PropertyBag, encode, merge_credentials};
use crate::value::{SpecMap, SpecValue};
use crate::{Error, Result};

/// Describes how to reach a database.
///
/// `subprotocol` and `subname` are required by every operation that derives
/// a connection string; they are optional here so that specs loaded from
/// configuration can be validated with a proper error instead of failing
/// to deserialize.
///
/// # Examples
///
/// ```
/// use sqlpool_core::ConnectionSpec;
///
/// let spec = ConnectionSpec::new("postgresql", "//localhost/app")
///    .with_username("app")
///    .with_option("sslmode", "require");
///
/// assert_eq!(spec.connection_string().unwrap(), "postgresql://localhost/app");
///
/// let props = spec.properties().unwrap();
/// assert_eq!(props.get("user"), Some("app"));
/// assert_eq!(props.get("sslmode"), Some("require"));
/// assert!(!props.contains_key("password"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSpec {
   /// Driver family, also the connection-string scheme (e.g. `postgresql`)
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub subprotocol: Option<String>,

   /// Driver-specific remainder of the connection string (e.g.
   /// `//localhost/db`)
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub subname: Option<String>,

   /// Name of the registered driver to use instead of scheme resolution
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub classname: Option<String>,

   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub username: Option<String>,

   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub password: Option<String>,

   /// Additional driver options
   #[serde(flatten)]
   pub options: SpecMap,
}

impl ConnectionSpec {
   pub fn new(subprotocol: impl Into<String>, subname: impl Into<String>) -> Self {
      Self {
         subprotocol: Some(subprotocol.into()),
         subname: Some(subname.into()),
         ..Default::default()
      }
   }

   pub fn with_classname(mut self, classname: impl Into<String>) -> Self {
      self.classname = Some(classname.into());
      self
   }

   pub fn with_username(mut self, username: impl Into<String>) -> Self {
      self.username = Some(username.into());
      self
   }

   pub fn with_password(mut self, password: impl Into<String>) -> Self {
      self.password = Some(password.into());
      self
   }

   pub fn with_credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
      self.with_username(username).with_password(password)
   }

   pub fn with_option(mut self, key: impl Into<String>, value: impl Into<SpecValue>) -> Self {
      self.options.insert(key.into(), value.into());
      self
   }

   /// Check that both identity fields are present and non-empty.
   pub fn validate(&self) -> Result<()> {
      self.identity().map(|_| ())
   }

   /// `"<subprotocol>:<subname>"`, the string drivers are resolved by.
   pub fn connection_string(&self) -> Result<String> {
      let (subprotocol, subname) = self.identity()?;
      Ok(format!("{subprotocol}:{subname}"))
   }

   /// Driver properties: every option, plus `user`/`password` from the
   /// credential fields.
   ///
   /// The identity fields (`classname`, `subprotocol`, `subname`) select the
   /// driver and are never passed to it.
   pub fn properties(&self) -> Result<PropertyBag> {
      self.validate()?;
      let bag = encode(&self.options);
      Ok(merge_credentials(
         Some(&bag),
         self.username.as_deref(),
         self.password.as_deref(),
      ))
   }

   fn identity(&self) -> Result<(&str, &str)> {
      let subprotocol = required(self.subprotocol.as_deref(), "subprotocol")?;
      let subname = required(self.subname.as_deref(), "subname")?;
      Ok((subprotocol, subname))
   }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
   match value {
      Some(v) if !v.is_empty() => Ok(v),
      _ => Err(Error::InvalidSpec(format!("missing required field `{field}`"))),
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   #[test]
   fn test_connection_string_is_deterministic() {
      let spec = ConnectionSpec::new("mysql", "//db:3306/shop");
      assert_eq!(spec.connection_string().unwrap(), "mysql://db:3306/shop");
      assert_eq!(spec.connection_string().unwrap(), spec.clone().connection_string().unwrap());
   }

   #[test]
   fn test_missing_subprotocol_is_invalid() {
      let spec = ConnectionSpec {
         subname: Some("//x".into()),
         ..Default::default()
      };
      let err = spec.connection_string().unwrap_err();
      assert!(matches!(err, Error::InvalidSpec(_)));
      assert!(err.to_string().contains("subprotocol"));
   }

   #[test]
   fn test_empty_subname_is_invalid() {
      let spec = ConnectionSpec::new("sqlite", "");
      assert!(matches!(spec.properties(), Err(Error::InvalidSpec(_))));
   }

   #[test]
   fn test_identity_fields_excluded_from_properties() {
      let spec = ConnectionSpec::new("postgresql", "//localhost/db")
         .with_classname("org.postgresql.Driver")
         .with_option("ssl", true);
      let props = spec.properties().unwrap();

      assert_eq!(props.len(), 1);
      assert_eq!(props.get("ssl"), Some("true"));
      for key in ["classname", "subprotocol", "subname"] {
         assert!(!props.contains_key(key), "{key} leaked into properties");
      }
   }

   #[test]
   fn test_deserialize_from_config() {
      let spec: ConnectionSpec = serde_json::from_value(json!({
         "subprotocol": "postgresql",
         "subname": "//localhost/db",
         "username": "u",
         "sslmode": "disable",
         "connectTimeout": 10
      }))
      .unwrap();

      assert_eq!(spec.username.as_deref(), Some("u"));
      assert_eq!(spec.options.len(), 2);

      let props = spec.properties().unwrap();
      assert_eq!(props.get("user"), Some("u"));
      assert_eq!(props.get("connectTimeout"), Some("10"));
      assert!(!props.contains_key("password"));
   }
}
