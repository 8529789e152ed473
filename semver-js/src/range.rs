use crate::version::parse_prerelease;
use crate::version::Identifier;
use crate::version::Version;
use crate::Result;
use crate::SemverError;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
  Lt,
  Lte,
  Gt,
  Gte,
  Eq,
}

#[derive(Debug, Clone)]
struct Comparator {
  op: Op,
  version: Version,
}

impl Comparator {
  fn matches(&self, version: &Version) -> bool {
    match self.op {
      Op::Lt => version < &self.version,
      Op::Lte => version <= &self.version,
      Op::Gt => version > &self.version,
      Op::Gte => version >= &self.version,
      Op::Eq => version == &self.version,
    }
  }
}

/// One `||` alternative: a conjunction of comparators. An empty set matches
/// any release version.
#[derive(Debug, Clone, Default)]
struct ComparatorSet {
  comparators: Vec<Comparator>,
}

impl ComparatorSet {
  fn satisfies(&self, version: &Version) -> bool {
    if !self.comparators.iter().all(|c| c.matches(version)) {
      return false;
    }
    if version.is_prerelease() {
      // A pre-release only satisfies a set that mentions a pre-release for
      // the same [major, minor, patch] tuple.
      return self.comparators.iter().any(|c| {
        c.version.is_prerelease() && c.version.release_tuple() == version.release_tuple()
      });
    }
    true
  }
}

/// A parsed npm-style version range.
///
/// Grammar: comparator sets joined by `||`; a set is whitespace-separated
/// comparators (`=`, `<`, `<=`, `>`, `>=`, `~`, `^` over full or x-range
/// operands) or a hyphen range. The empty range and `*` match any release.
#[derive(Debug, Clone)]
pub struct Range {
  raw: String,
  sets: Vec<ComparatorSet>,
}

impl Range {
  pub fn parse(input: &str) -> Result<Range> {
    let err = |reason: String| SemverError::InvalidRange {
      input: input.to_string(),
      reason,
    };

    let mut sets = Vec::new();
    for alternative in input.split("||") {
      let tokens: Vec<&str> = alternative.split_whitespace().collect();
      let set = if tokens.contains(&"-") {
        parse_hyphen(&tokens).map_err(&err)?
      } else {
        let mut comparators = Vec::new();
        for token in &tokens {
          comparators.extend(parse_comparator(token).map_err(&err)?);
        }
        ComparatorSet { comparators }
      };
      sets.push(set);
    }

    Ok(Range {
      raw: input.trim().to_string(),
      sets,
    })
  }

  /// Returns whether `version` satisfies any `||` alternative of this range.
  pub fn satisfies(&self, version: &Version) -> bool {
    self.sets.iter().any(|set| set.satisfies(version))
  }
}

impl Display for Range {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}

impl FromStr for Range {
  type Err = SemverError;

  fn from_str(raw: &str) -> Result<Range> {
    Range::parse(raw)
  }
}

/// A comparator operand with possibly-missing (wildcard) components.
struct Partial {
  major: Option<u64>,
  minor: Option<u64>,
  patch: Option<u64>,
  pre: Vec<Identifier>,
}

enum Sugar {
  Op(Op),
  Tilde,
  Caret,
}

fn parse_comparator(token: &str) -> std::result::Result<Vec<Comparator>, String> {
  let (sugar, rest) = if let Some(rest) = token.strip_prefix(">=") {
    (Sugar::Op(Op::Gte), rest)
  } else if let Some(rest) = token.strip_prefix("<=") {
    (Sugar::Op(Op::Lte), rest)
  } else if let Some(rest) = token.strip_prefix("~>") {
    (Sugar::Tilde, rest)
  } else if let Some(rest) = token.strip_prefix('>') {
    (Sugar::Op(Op::Gt), rest)
  } else if let Some(rest) = token.strip_prefix('<') {
    (Sugar::Op(Op::Lt), rest)
  } else if let Some(rest) = token.strip_prefix('=') {
    (Sugar::Op(Op::Eq), rest)
  } else if let Some(rest) = token.strip_prefix('~') {
    (Sugar::Tilde, rest)
  } else if let Some(rest) = token.strip_prefix('^') {
    (Sugar::Caret, rest)
  } else {
    (Sugar::Op(Op::Eq), token)
  };

  if rest.is_empty() {
    return Err(format!("comparator '{}' is missing a version", token));
  }

  desugar(sugar, parse_partial(rest)?)
}

fn parse_partial(raw: &str) -> std::result::Result<Partial, String> {
  let body = match raw.split_once('+') {
    Some((body, _build)) => body,
    None => raw,
  };
  let (core, pre_raw) = match body.split_once('-') {
    Some((core, pre)) => (core, Some(pre)),
    None => (body, None),
  };
  if core.is_empty() {
    return Err(format!("'{}' is missing version components", raw));
  }

  let mut components = [None, None, None];
  let mut wildcard_seen = false;
  for (idx, segment) in core.split('.').enumerate() {
    if idx >= 3 {
      return Err(format!("'{}' has too many version components", raw));
    }
    if wildcard_seen {
      // Everything after a wildcard is itself a wildcard.
      continue;
    }
    if matches!(segment, "x" | "X" | "*") {
      wildcard_seen = true;
      continue;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) || segment.is_empty() {
      return Err(format!("invalid version component '{}'", segment));
    }
    components[idx] = Some(
      segment
        .parse::<u64>()
        .map_err(|_| format!("version component '{}' is out of range", segment))?,
    );
  }

  let pre = match pre_raw {
    Some(pre_raw) => {
      if components.iter().any(Option::is_none) {
        return Err(format!("'{}' combines a wildcard with a pre-release", raw));
      }
      parse_prerelease(pre_raw)?
    }
    None => Vec::new(),
  };

  Ok(Partial {
    major: components[0],
    minor: components[1],
    patch: components[2],
    pre,
  })
}

fn release(major: u64, minor: u64, patch: u64) -> Version {
  Version::new(major, minor, patch)
}

/// The lowest pre-release of a version, used as an exclusive upper bound so
/// that e.g. `^1.2.3` excludes `2.0.0-alpha`.
fn floor(major: u64, minor: u64, patch: u64) -> Version {
  Version {
    major,
    minor,
    patch,
    pre: vec![Identifier::Numeric(0)],
    build: Vec::new(),
  }
}

fn desugar(sugar: Sugar, partial: Partial) -> std::result::Result<Vec<Comparator>, String> {
  let cmp = |op: Op, version: Version| Comparator { op, version };

  let Some(major) = partial.major else {
    // A bare wildcard: matches everything, except under a strict inequality
    // where nothing can satisfy it.
    return Ok(match sugar {
      Sugar::Op(Op::Gt) | Sugar::Op(Op::Lt) => vec![cmp(Op::Lt, floor(0, 0, 0))],
      _ => Vec::new(),
    });
  };

  Ok(match (partial.minor, partial.patch) {
    (None, _) => match sugar {
      Sugar::Op(Op::Gt) => vec![cmp(Op::Gte, floor(major.saturating_add(1), 0, 0))],
      Sugar::Op(Op::Gte) => vec![cmp(Op::Gte, release(major, 0, 0))],
      Sugar::Op(Op::Lt) => vec![cmp(Op::Lt, floor(major, 0, 0))],
      Sugar::Op(Op::Lte) => vec![cmp(Op::Lt, floor(major.saturating_add(1), 0, 0))],
      Sugar::Op(Op::Eq) | Sugar::Tilde | Sugar::Caret => vec![
        cmp(Op::Gte, release(major, 0, 0)),
        cmp(Op::Lt, floor(major.saturating_add(1), 0, 0)),
      ],
    },
    (Some(minor), None) => match sugar {
      Sugar::Op(Op::Gt) => vec![cmp(Op::Gte, floor(major, minor.saturating_add(1), 0))],
      Sugar::Op(Op::Gte) => vec![cmp(Op::Gte, release(major, minor, 0))],
      Sugar::Op(Op::Lt) => vec![cmp(Op::Lt, floor(major, minor, 0))],
      Sugar::Op(Op::Lte) => vec![cmp(Op::Lt, floor(major, minor.saturating_add(1), 0))],
      Sugar::Op(Op::Eq) | Sugar::Tilde => vec![
        cmp(Op::Gte, release(major, minor, 0)),
        cmp(Op::Lt, floor(major, minor.saturating_add(1), 0)),
      ],
      Sugar::Caret => {
        let upper = if major > 0 {
          floor(major.saturating_add(1), 0, 0)
        } else {
          floor(0, minor.saturating_add(1), 0)
        };
        vec![cmp(Op::Gte, release(major, minor, 0)), cmp(Op::Lt, upper)]
      }
    },
    (Some(minor), Some(patch)) => {
      let exact = Version {
        major,
        minor,
        patch,
        pre: partial.pre,
        build: Vec::new(),
      };
      match sugar {
        Sugar::Op(op) => vec![cmp(op, exact)],
        Sugar::Tilde => vec![
          cmp(Op::Gte, exact),
          cmp(Op::Lt, floor(major, minor.saturating_add(1), 0)),
        ],
        Sugar::Caret => {
          let upper = if major > 0 {
            floor(major.saturating_add(1), 0, 0)
          } else if minor > 0 {
            floor(0, minor.saturating_add(1), 0)
          } else {
            floor(0, 0, patch.saturating_add(1))
          };
          vec![cmp(Op::Gte, exact), cmp(Op::Lt, upper)]
        }
      }
    }
  })
}

fn parse_hyphen(tokens: &[&str]) -> std::result::Result<ComparatorSet, String> {
  if tokens.len() != 3 || tokens[1] != "-" {
    return Err("malformed hyphen range".to_string());
  }

  let lower = parse_partial(tokens[0])?;
  let upper = parse_partial(tokens[2])?;
  let mut comparators = Vec::new();

  if let Some(major) = lower.major {
    comparators.push(Comparator {
      op: Op::Gte,
      version: Version {
        major,
        minor: lower.minor.unwrap_or(0),
        patch: lower.patch.unwrap_or(0),
        pre: lower.pre,
        build: Vec::new(),
      },
    });
  }

  if let Some(major) = upper.major {
    let comparator = match (upper.minor, upper.patch) {
      (Some(minor), Some(patch)) => Comparator {
        op: Op::Lte,
        version: Version {
          major,
          minor,
          patch,
          pre: upper.pre,
          build: Vec::new(),
        },
      },
      (Some(minor), None) => Comparator {
        op: Op::Lt,
        version: floor(major, minor.saturating_add(1), 0),
      },
      (None, _) => Comparator {
        op: Op::Lt,
        version: floor(major.saturating_add(1), 0, 0),
      },
    };
    comparators.push(comparator);
  }

  Ok(ComparatorSet { comparators })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn matches(range: &str, version: &str) -> bool {
    let range = Range::parse(range).expect(range);
    let version = Version::parse(version).expect(version);
    range.satisfies(&version)
  }

  #[test]
  fn plain_comparators() {
    assert!(matches(">=17.0.0", "18.2.0"));
    assert!(!matches(">=19.0.0", "18.2.0"));
    assert!(matches("<19.0.0", "18.2.0"));
    assert!(matches("=18.2.0", "18.2.0"));
    assert!(matches("18.2.0", "18.2.0"));
    assert!(!matches(">18.2.0", "18.2.0"));
  }

  #[test]
  fn comparator_sets_are_conjunctions() {
    assert!(matches(">=1.2.0 <1.3.0", "1.2.5"));
    assert!(!matches(">=1.2.0 <1.3.0", "1.3.0"));
  }

  #[test]
  fn alternatives_are_disjunctions() {
    let range = "<1.0.0 || >=2.0.0";
    assert!(matches(range, "0.9.9"));
    assert!(matches(range, "2.0.0"));
    assert!(!matches(range, "1.5.0"));
  }

  #[test]
  fn wildcards() {
    assert!(matches("*", "1.2.3"));
    assert!(matches("", "1.2.3"));
    assert!(matches("1", "1.9.9"));
    assert!(!matches("1", "2.0.0"));
    assert!(matches("1.2.x", "1.2.7"));
    assert!(!matches("1.2.x", "1.3.0"));
    assert!(matches("1.x", "1.3.0"));
  }

  #[test]
  fn wildcards_exclude_prereleases() {
    assert!(!matches("*", "1.0.0-alpha"));
    assert!(!matches("", "1.0.0-alpha"));
  }

  #[test]
  fn tilde_ranges() {
    assert!(matches("~1.2.3", "1.2.9"));
    assert!(!matches("~1.2.3", "1.3.0"));
    assert!(matches("~1.2", "1.2.0"));
    assert!(!matches("~1.2", "1.3.0"));
    assert!(matches("~1", "1.9.0"));
  }

  #[test]
  fn caret_ranges() {
    assert!(matches("^1.2.3", "1.9.0"));
    assert!(!matches("^1.2.3", "2.0.0"));
    assert!(matches("^0.2.3", "0.2.9"));
    assert!(!matches("^0.2.3", "0.3.0"));
    assert!(matches("^0.0.3", "0.0.3"));
    assert!(!matches("^0.0.3", "0.0.4"));
  }

  #[test]
  fn hyphen_ranges() {
    assert!(matches("1.2.3 - 2.3.4", "1.2.3"));
    assert!(matches("1.2.3 - 2.3.4", "2.3.4"));
    assert!(!matches("1.2.3 - 2.3.4", "2.3.5"));
    // A partial upper bound widens to the end of its implied range.
    assert!(matches("1.2 - 2", "2.9.9"));
    assert!(!matches("1.2 - 2", "3.0.0"));
    assert!(matches("1.2 - 2.3", "2.3.4"));
    assert!(!matches("1.2 - 2.3", "2.4.0"));
  }

  #[test]
  fn partial_inequalities() {
    assert!(!matches(">1.2", "1.2.9"));
    assert!(matches(">1.2", "1.3.0"));
    assert!(matches("<=1.2", "1.2.9"));
    assert!(!matches("<1.2", "1.2.0"));
  }

  #[test]
  fn prereleases_require_a_matching_comparator_tuple() {
    assert!(!matches(">=1.2.3", "1.2.4-alpha"));
    assert!(matches(">=1.2.3-0", "1.2.3-alpha"));
    assert!(matches("^1.2.3-beta", "1.2.3-beta.4"));
    assert!(!matches("^1.2.3-beta", "1.2.4-alpha"));
    assert!(matches("=1.2.3-beta", "1.2.3-beta"));
  }

  #[test]
  fn range_parse_errors() {
    for raw in [">=>1", "1.2.3 -", "- 1.2.3", "1.2.3 - 2.0.0 - 3.0.0", "oops", "1.2.3-"] {
      assert!(Range::parse(raw).is_err(), "{raw:?} should not parse");
    }
  }

  #[test]
  fn display_round_trips_the_raw_text() {
    let range = Range::parse(" >=1.0.0 <2.0.0 ").unwrap();
    assert_eq!(range.to_string(), ">=1.0.0 <2.0.0");
  }
}
