//! Preprocessor macro definitions.
//!
//! Build files can spell macros either as a mapping (`{NAME = "VALUE"}`) or as a
//! list of `(name, value?)` pairs. Both collapse into [`MacroMap`], where a macro
//! defined without a value maps to [`MacroValue::NoValue`].

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::Serialize;

/// Value side of a macro definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum MacroValue {
  /// `-DNAME=VALUE`
  Value(String),
  /// `-DNAME`
  NoValue,
}

impl MacroValue {
  pub fn as_value(&self) -> Option<&str> {
    match self {
      MacroValue::Value(v) => Some(v),
      MacroValue::NoValue => None,
    }
  }
}

impl From<&str> for MacroValue {
  fn from(value: &str) -> Self {
    MacroValue::Value(value.to_string())
  }
}

impl From<String> for MacroValue {
  fn from(value: String) -> Self {
    MacroValue::Value(value)
  }
}

impl From<Option<String>> for MacroValue {
  fn from(value: Option<String>) -> Self {
    value.map(MacroValue::Value).unwrap_or(MacroValue::NoValue)
  }
}

/// Ordered mapping from macro name to value.
///
/// Redefining a name replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MacroMap(BTreeMap<String, MacroValue>);

impl MacroMap {
  pub fn new() -> Self {
    Self(BTreeMap::new())
  }

  pub fn define(&mut self, name: impl Into<String>, value: impl Into<MacroValue>) {
    self.0.insert(name.into(), value.into());
  }

  pub fn get(&self, name: &str) -> Option<&MacroValue> {
    self.0.get(name)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> btree_map::Iter<'_, String, MacroValue> {
    self.0.iter()
  }

  /// Render as C compiler `-D` flags, in name order.
  pub fn to_define_flags(&self) -> Vec<String> {
    self
      .0
      .iter()
      .map(|(name, value)| match value.as_value() {
        Some(v) => format!("-D{}={}", name, v),
        None => format!("-D{}", name),
      })
      .collect()
  }

  /// Copy every definition from `overrides`, replacing clashing names.
  pub fn overlay(&mut self, overrides: &MacroMap) {
    for (name, value) in overrides {
      self.define(name, value.clone());
    }
  }
}

impl<K: Into<String>, V: Into<MacroValue>> FromIterator<(K, V)> for MacroMap {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut map = MacroMap::new();
    for (name, value) in iter {
      map.define(name, value);
    }
    map
  }
}

impl<'a> IntoIterator for &'a MacroMap {
  type Item = (&'a String, &'a MacroValue);
  type IntoIter = btree_map::Iter<'a, String, MacroValue>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}
