use crate::Result;
use crate::SemverError;
use std::cmp::Ordering;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::str::FromStr;

/// A single pre-release identifier.
///
/// Numeric identifiers always have lower precedence than alphanumeric ones,
/// so the derived ordering (variant order, then contents) is exactly the
/// SemVer precedence rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Identifier {
  Numeric(u64),
  AlphaNumeric(String),
}

impl Display for Identifier {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Identifier::Numeric(value) => write!(f, "{}", value),
      Identifier::AlphaNumeric(value) => f.write_str(value),
    }
  }
}

/// A parsed semantic version.
///
/// Comparison, equality, and hashing follow SemVer precedence: build
/// metadata is ignored, and a pre-release sorts below the corresponding
/// release.
#[derive(Debug, Clone)]
pub struct Version {
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
  pub pre: Vec<Identifier>,
  pub build: Vec<String>,
}

impl Version {
  pub fn new(major: u64, minor: u64, patch: u64) -> Version {
    Version {
      major,
      minor,
      patch,
      pre: Vec::new(),
      build: Vec::new(),
    }
  }

  /// Parses a version string. A single leading `v` or `V` is tolerated, as
  /// npm does.
  pub fn parse(input: &str) -> Result<Version> {
    let err = |reason: String| SemverError::InvalidVersion {
      input: input.to_string(),
      reason,
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
      return Err(err("empty string".to_string()));
    }
    let body = trimmed
      .strip_prefix('v')
      .or_else(|| trimmed.strip_prefix('V'))
      .unwrap_or(trimmed);

    let (body, build) = match body.split_once('+') {
      Some((rest, raw)) => (rest, parse_build(raw).map_err(&err)?),
      None => (body, Vec::new()),
    };
    let (core, pre) = match body.split_once('-') {
      Some((core, raw)) => (core, parse_prerelease(raw).map_err(&err)?),
      None => (body, Vec::new()),
    };

    let mut parts = core.split('.');
    let major = parse_component(parts.next(), "major").map_err(&err)?;
    let minor = parse_component(parts.next(), "minor").map_err(&err)?;
    let patch = parse_component(parts.next(), "patch").map_err(&err)?;
    if parts.next().is_some() {
      return Err(err("expected exactly three numeric components".to_string()));
    }

    Ok(Version {
      major,
      minor,
      patch,
      pre,
      build,
    })
  }

  pub fn is_prerelease(&self) -> bool {
    !self.pre.is_empty()
  }

  /// The `[major, minor, patch]` tuple, without pre-release or build.
  pub fn release_tuple(&self) -> (u64, u64, u64) {
    (self.major, self.minor, self.patch)
  }

  fn cmp_precedence(&self, other: &Version) -> Ordering {
    self
      .release_tuple()
      .cmp(&other.release_tuple())
      .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
        (true, true) => Ordering::Equal,
        // A pre-release sorts below the release it precedes.
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        // Element-wise identifier comparison; when one list is a prefix of
        // the other, the longer list has higher precedence.
        (false, false) => self.pre.cmp(&other.pre),
      })
  }
}

impl PartialEq for Version {
  fn eq(&self, other: &Self) -> bool {
    self.cmp_precedence(other) == Ordering::Equal
  }
}

impl Eq for Version {}

impl PartialOrd for Version {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Version {
  fn cmp(&self, other: &Self) -> Ordering {
    self.cmp_precedence(other)
  }
}

impl Hash for Version {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.release_tuple().hash(state);
    self.pre.hash(state);
  }
}

impl Display for Version {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
    for (idx, id) in self.pre.iter().enumerate() {
      f.write_str(if idx == 0 { "-" } else { "." })?;
      write!(f, "{}", id)?;
    }
    for (idx, id) in self.build.iter().enumerate() {
      f.write_str(if idx == 0 { "+" } else { "." })?;
      f.write_str(id)?;
    }
    Ok(())
  }
}

impl FromStr for Version {
  type Err = SemverError;

  fn from_str(raw: &str) -> Result<Version> {
    Version::parse(raw)
  }
}

fn parse_component(part: Option<&str>, name: &str) -> std::result::Result<u64, String> {
  let part = part.ok_or_else(|| format!("missing {} component", name))?;
  parse_numeric(part).map_err(|reason| format!("{} component {}", name, reason))
}

fn parse_numeric(raw: &str) -> std::result::Result<u64, String> {
  if raw.is_empty() {
    return Err("is empty".to_string());
  }
  if !raw.bytes().all(|b| b.is_ascii_digit()) {
    return Err(format!("'{}' is not numeric", raw));
  }
  if raw.len() > 1 && raw.starts_with('0') {
    return Err(format!("'{}' has a leading zero", raw));
  }
  raw
    .parse::<u64>()
    .map_err(|_| format!("'{}' is out of range", raw))
}

pub(crate) fn parse_prerelease(raw: &str) -> std::result::Result<Vec<Identifier>, String> {
  raw
    .split('.')
    .map(|part| {
      if part.is_empty() {
        return Err("empty pre-release identifier".to_string());
      }
      if !part
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
      {
        return Err(format!("invalid pre-release identifier '{}'", part));
      }
      if part.bytes().all(|b| b.is_ascii_digit()) {
        if part.len() > 1 && part.starts_with('0') {
          return Err(format!("pre-release identifier '{}' has a leading zero", part));
        }
        return Ok(Identifier::Numeric(
          part
            .parse::<u64>()
            .map_err(|_| format!("pre-release identifier '{}' is out of range", part))?,
        ));
      }
      Ok(Identifier::AlphaNumeric(part.to_string()))
    })
    .collect()
}

fn parse_build(raw: &str) -> std::result::Result<Vec<String>, String> {
  raw
    .split('.')
    .map(|part| {
      if part.is_empty() {
        return Err("empty build identifier".to_string());
      }
      if !part
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
      {
        return Err(format!("invalid build identifier '{}'", part));
      }
      Ok(part.to_string())
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn v(raw: &str) -> Version {
    Version::parse(raw).expect(raw)
  }

  #[test]
  fn parses_plain_versions() {
    let parsed = v("18.2.0");
    assert_eq!(parsed.release_tuple(), (18, 2, 0));
    assert!(parsed.pre.is_empty());
    assert!(parsed.build.is_empty());
  }

  #[test]
  fn parses_prerelease_and_build() {
    let parsed = v("1.2.3-alpha.1+build.7");
    assert_eq!(parsed.pre, vec![
      Identifier::AlphaNumeric("alpha".to_string()),
      Identifier::Numeric(1),
    ]);
    assert_eq!(parsed.build, vec!["build".to_string(), "7".to_string()]);
    assert_eq!(parsed.to_string(), "1.2.3-alpha.1+build.7");
  }

  #[test]
  fn tolerates_leading_v() {
    assert_eq!(v("v17.0.2"), v("17.0.2"));
    assert_eq!(v("V17.0.2"), v("17.0.2"));
  }

  #[test]
  fn rejects_malformed_versions() {
    for raw in ["", "1", "1.2", "1.2.3.4", "1.02.3", "1.2.x", "1.2.3-", "1.2.3-a..b", "a.b.c"] {
      assert!(Version::parse(raw).is_err(), "{raw:?} should not parse");
    }
  }

  #[test]
  fn precedence_follows_the_semver_chain() {
    let chain = [
      "1.0.0-alpha",
      "1.0.0-alpha.1",
      "1.0.0-alpha.beta",
      "1.0.0-beta",
      "1.0.0-beta.2",
      "1.0.0-beta.11",
      "1.0.0-rc.1",
      "1.0.0",
    ];
    for pair in chain.windows(2) {
      assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
    }
  }

  #[test]
  fn build_metadata_is_ignored_by_comparison() {
    assert_eq!(v("1.2.3+a"), v("1.2.3+b"));
    assert_eq!(v("1.2.3+a").cmp(&v("1.2.3")), Ordering::Equal);
  }

  #[test]
  fn numeric_identifiers_sort_below_alphanumeric() {
    assert!(v("1.0.0-0") < v("1.0.0-alpha"));
    assert!(v("1.0.0-2") < v("1.0.0-11"));
  }
}
