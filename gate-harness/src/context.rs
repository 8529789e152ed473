use crate::flags::FlagSet;
use crate::Result;
use semver_js::Version;
use std::env;

/// The frozen inputs of every gate evaluation: the subject version being
/// tested against and the resolved flag set.
///
/// Construct once at suite startup and share by reference; nothing in the
/// harness mutates it afterwards.
#[derive(Debug, Clone)]
pub struct GateContext {
  version: Version,
  flags: FlagSet,
}

impl GateContext {
  pub fn new(version: Version, flags: FlagSet) -> GateContext {
    GateContext { version, flags }
  }

  /// Resolves the subject version from the environment variable
  /// `override_env` when set, falling back to `default_version`.
  pub fn resolve(default_version: &str, override_env: &str, flags: FlagSet) -> Result<GateContext> {
    let raw = env::var(override_env).unwrap_or_else(|_| default_version.to_string());
    Ok(GateContext::new(Version::parse(&raw)?, flags))
  }

  pub fn subject_version(&self) -> &Version {
    &self.version
  }

  pub fn flags(&self) -> &FlagSet {
    &self.flags
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolve_falls_back_to_the_default() {
    let context =
      GateContext::resolve("18.2.0", "GATE_HARNESS_TEST_UNSET_VAR", FlagSet::empty()).unwrap();
    assert_eq!(context.subject_version(), &Version::parse("18.2.0").unwrap());
  }

  #[test]
  fn resolve_rejects_malformed_defaults() {
    assert!(GateContext::resolve("not-a-version", "GATE_HARNESS_TEST_UNSET_VAR", FlagSet::empty())
      .is_err());
  }
}
