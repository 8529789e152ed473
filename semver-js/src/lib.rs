//! npm-flavored semantic version parsing and range matching.
//!
//! Implements the version grammar of SemVer 2.0.0 plus the range grammar of
//! the npm ecosystem: comparator sets joined by `||`, x-ranges (`1.2.x`,
//! `*`), tilde and caret sugar, and hyphen ranges. Pre-release versions only
//! satisfy a range when one of its comparators opts into pre-releases for
//! the same `[major, minor, patch]` tuple.

use thiserror::Error;

pub mod range;
pub mod version;

pub use range::Range;
pub use version::Version;

pub type Result<T> = std::result::Result<T, SemverError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SemverError {
  #[error("invalid version '{input}': {reason}")]
  InvalidVersion { input: String, reason: String },
  #[error("invalid range '{input}': {reason}")]
  InvalidRange { input: String, reason: String },
}

/// Returns whether `version` satisfies `range`.
///
/// Both arguments are parsed eagerly; either failing to parse is an error
/// rather than a non-match.
pub fn satisfies(version: &str, range: &str) -> Result<bool> {
  let version = Version::parse(version)?;
  let range = Range::parse(range)?;
  Ok(range.satisfies(&version))
}

/// Returns whether version `a` is greater than or equal to version `b` under
/// SemVer precedence.
pub fn gte(a: &str, b: &str) -> Result<bool> {
  let a = Version::parse(a)?;
  let b = Version::parse(b)?;
  Ok(a >= b)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn satisfies_parses_both_arguments() {
    assert!(satisfies("18.2.0", ">=17.0.0").unwrap());
    assert!(!satisfies("18.2.0", ">=19.0.0").unwrap());
    assert!(satisfies("1.0.0", "*").unwrap());
  }

  #[test]
  fn satisfies_rejects_malformed_input() {
    assert!(matches!(
      satisfies("not-a-version", "*"),
      Err(SemverError::InvalidVersion { .. })
    ));
    assert!(matches!(
      satisfies("1.0.0", ">=>1"),
      Err(SemverError::InvalidRange { .. })
    ));
  }

  #[test]
  fn gte_agrees_with_precedence() {
    assert!(gte("17.0.0", "17.0.0").unwrap());
    assert!(gte("17.0.1", "17.0.0").unwrap());
    assert!(!gte("17.0.0-rc.1", "17.0.0").unwrap());
  }
}
