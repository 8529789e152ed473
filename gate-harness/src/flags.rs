use crate::HarnessError;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while evaluating a gate predicate against a flag set.
///
/// Looking up a flag that was never declared is an error, not a default.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlagError {
  #[error("unknown flag '{0}'")]
  Unknown(String),
  #[error("flag '{0}' is not a boolean")]
  NotBool(String),
  #[error("flag '{0}' is not a tag")]
  NotTag(String),
}

/// A flag value: a boolean toggle or a named tag (e.g. a release channel).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FlagValue {
  Bool(bool),
  Tag(String),
}

/// The resolved feature-flag set for the current test run.
///
/// Immutable once constructed; every gate evaluation in the process observes
/// the same values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
  flags: BTreeMap<String, FlagValue>,
}

impl FlagSet {
  pub fn empty() -> FlagSet {
    FlagSet::default()
  }

  pub fn from_path(path: &Path) -> Result<FlagSet, HarnessError> {
    let raw = fs::read_to_string(path)?;
    FlagSet::from_str(&raw).map_err(|err| match err {
      HarnessError::Manifest(msg) => HarnessError::Manifest(format!("{}: {msg}", path.display())),
      other => other,
    })
  }

  pub fn from_str(raw: &str) -> Result<FlagSet, HarnessError> {
    let manifest = match toml::from_str::<RawManifest>(raw) {
      Ok(manifest) => manifest,
      Err(toml_err) => serde_json::from_str::<RawManifest>(raw).map_err(|json_err| {
        HarnessError::Manifest(format!(
          "failed to parse manifest as TOML ({toml_err}) or JSON ({json_err})"
        ))
      })?,
    };

    Ok(FlagSet {
      flags: manifest.flags,
    })
  }

  pub fn get(&self, name: &str) -> Option<&FlagValue> {
    self.flags.get(name)
  }

  /// The boolean value of `name`. Errors when the flag is undeclared or not
  /// a boolean.
  pub fn enabled(&self, name: &str) -> Result<bool, FlagError> {
    match self.flags.get(name) {
      None => Err(FlagError::Unknown(name.to_string())),
      Some(FlagValue::Bool(value)) => Ok(*value),
      Some(FlagValue::Tag(_)) => Err(FlagError::NotBool(name.to_string())),
    }
  }

  /// The tag value of `name`. Errors when the flag is undeclared or not a
  /// tag.
  pub fn tag(&self, name: &str) -> Result<&str, FlagError> {
    match self.flags.get(name) {
      None => Err(FlagError::Unknown(name.to_string())),
      Some(FlagValue::Tag(value)) => Ok(value),
      Some(FlagValue::Bool(_)) => Err(FlagError::NotTag(name.to_string())),
    }
  }

  pub fn len(&self) -> usize {
    self.flags.len()
  }

  pub fn is_empty(&self) -> bool {
    self.flags.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
    self.flags.iter().map(|(name, value)| (name.as_str(), value))
  }
}

impl<K: Into<String>> FromIterator<(K, FlagValue)> for FlagSet {
  fn from_iter<I: IntoIterator<Item = (K, FlagValue)>>(iter: I) -> FlagSet {
    FlagSet {
      flags: iter
        .into_iter()
        .map(|(name, value)| (name.into(), value))
        .collect(),
    }
  }
}

impl<K: Into<String>> FromIterator<(K, bool)> for FlagSet {
  fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> FlagSet {
    iter
      .into_iter()
      .map(|(name, value)| (name, FlagValue::Bool(value)))
      .collect()
  }
}

#[derive(Debug, Clone, Deserialize)]
struct RawManifest {
  #[serde(default)]
  flags: BTreeMap<String, FlagValue>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_toml_manifests() {
    let flags = FlagSet::from_str(
      r#"
[flags]
enable_something = true
enable_other = false
channel = "experimental"
"#,
    )
    .unwrap();

    assert_eq!(flags.enabled("enable_something"), Ok(true));
    assert_eq!(flags.enabled("enable_other"), Ok(false));
    assert_eq!(flags.tag("channel"), Ok("experimental"));
  }

  #[test]
  fn parses_json_manifests() {
    let flags = FlagSet::from_str(
      r#"{"flags": {"enable_something": true, "channel": "stable"}}"#,
    )
    .unwrap();

    assert_eq!(flags.enabled("enable_something"), Ok(true));
    assert_eq!(flags.tag("channel"), Ok("stable"));
  }

  #[test]
  fn rejects_unparseable_manifests() {
    let err = FlagSet::from_str("not a manifest").unwrap_err();
    assert!(matches!(err, HarnessError::Manifest(_)));
  }

  #[test]
  fn unknown_flags_error_by_name() {
    let flags = FlagSet::from_iter([("declared", true)]);
    assert_eq!(
      flags.enabled("undeclared"),
      Err(FlagError::Unknown("undeclared".to_string()))
    );
  }

  #[test]
  fn type_mismatches_are_errors() {
    let flags = FlagSet::from_iter([("channel", FlagValue::Tag("stable".to_string()))]);
    assert_eq!(
      flags.enabled("channel"),
      Err(FlagError::NotBool("channel".to_string()))
    );
    let flags = FlagSet::from_iter([("toggle", true)]);
    assert_eq!(flags.tag("toggle"), Err(FlagError::NotTag("toggle".to_string())));
  }

  #[test]
  fn iteration_is_ordered_by_name() {
    let flags = FlagSet::from_iter([("b", true), ("a", false)]);
    let names: Vec<&str> = flags.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["a", "b"]);
  }
}
