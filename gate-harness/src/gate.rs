use crate::body::Failure;
use crate::body::TestBody;
use crate::context::GateContext;
use crate::flags::FlagError;
use crate::flags::FlagSet;
use crate::invert::expect_failure;
use crate::invert::UnexpectedPass;
use crate::plan::Registrar;
use crate::Result;
use semver_js::Range;
use serde::Serialize;

/// How a declaration resolves against the frozen context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Run,
  RunOnly,
  Skip,
  RunExpectingFailure,
  RunOnlyExpectingFailure,
}

/// Prefix decorating the registered name of an inverted test.
pub const GATED_NAME_PREFIX: &str = "[GATED, SHOULD FAIL] ";

pub fn gated_name(name: &str) -> String {
  format!("{GATED_NAME_PREFIX}{name}")
}

type NoPredicate = fn(&FlagSet) -> std::result::Result<bool, FlagError>;

/// Computes the registration outcome for one declaration.
///
/// Pure: depends only on the frozen context and the declaration parameters.
/// The version range is checked first; when it does not match, the predicate
/// is never invoked and the outcome is an unconditional skip. A predicate
/// evaluation error is returned as `Err`, not mapped to an outcome.
pub fn decide<P>(
  context: &GateContext,
  range: Option<&Range>,
  predicate: Option<P>,
  focus: bool,
) -> std::result::Result<Outcome, FlagError>
where
  P: FnOnce(&FlagSet) -> std::result::Result<bool, FlagError>,
{
  if let Some(range) = range {
    if !range.satisfies(context.subject_version()) {
      return Ok(Outcome::Skip);
    }
  }

  let Some(predicate) = predicate else {
    return Ok(if focus { Outcome::RunOnly } else { Outcome::Run });
  };

  if predicate(context.flags())? {
    Ok(if focus { Outcome::RunOnly } else { Outcome::Run })
  } else if focus {
    Ok(Outcome::RunOnlyExpectingFailure)
  } else {
    Ok(Outcome::RunExpectingFailure)
  }
}

/// The declaration API: every method takes a test name and body, evaluates
/// its gate against the frozen [`GateContext`], and registers through the
/// [`Registrar`].
pub struct Gates<'a, R: Registrar> {
  context: &'a GateContext,
  registrar: &'a mut R,
}

impl<'a, R: Registrar> Gates<'a, R> {
  pub fn new(context: &'a GateContext, registrar: &'a mut R) -> Gates<'a, R> {
    Gates { context, registrar }
  }

  /// Registers `name` to run only when the subject version satisfies
  /// `range`; otherwise registers a skip. Range syntax errors propagate.
  pub fn test_for_version(&mut self, range: &str, name: &str, body: TestBody) -> Result<()> {
    self.version_gate(range, name, body, false)
  }

  pub fn test_for_version_focus(&mut self, range: &str, name: &str, body: TestBody) -> Result<()> {
    self.version_gate(range, name, body, true)
  }

  /// Registers an unconditional skip, for tests known inapplicable to the
  /// current testing pass.
  pub fn ignore_for_version(&mut self, name: &str, body: TestBody) {
    self.registrar.register_skip(name, body);
  }

  /// Registers `name` according to `predicate` over the flag set: run
  /// normally when it holds, run inverted (the body must fail) when it does
  /// not.
  pub fn test_gated<P>(&mut self, predicate: P, name: &str, body: TestBody)
  where
    P: FnOnce(&FlagSet) -> std::result::Result<bool, FlagError>,
  {
    self.apply(None, Some(predicate), name, body, false);
  }

  pub fn test_gated_focus<P>(&mut self, predicate: P, name: &str, body: TestBody)
  where
    P: FnOnce(&FlagSet) -> std::result::Result<bool, FlagError>,
  {
    self.apply(None, Some(predicate), name, body, true);
  }

  /// Version gate composed with a flag gate: the range is checked first and
  /// a mismatch skips unconditionally, without evaluating the predicate.
  pub fn test_for_version_gated<P>(
    &mut self,
    range: &str,
    predicate: P,
    name: &str,
    body: TestBody,
  ) -> Result<()>
  where
    P: FnOnce(&FlagSet) -> std::result::Result<bool, FlagError>,
  {
    let range = Range::parse(range)?;
    self.apply(Some(&range), Some(predicate), name, body, false);
    Ok(())
  }

  pub fn test_for_version_gated_focus<P>(
    &mut self,
    range: &str,
    predicate: P,
    name: &str,
    body: TestBody,
  ) -> Result<()>
  where
    P: FnOnce(&FlagSet) -> std::result::Result<bool, FlagError>,
  {
    let range = Range::parse(range)?;
    self.apply(Some(&range), Some(predicate), name, body, true);
    Ok(())
  }

  /// Registers an unconditional skip regardless of range or flags.
  pub fn ignore_for_version_gated<P>(
    &mut self,
    _range: &str,
    _predicate: P,
    name: &str,
    body: TestBody,
  ) where
    P: FnOnce(&FlagSet) -> std::result::Result<bool, FlagError>,
  {
    self.registrar.register_skip(name, body);
  }

  /// Inline dynamic check: evaluates `predicate` against the frozen flag
  /// set and returns the result. No registration side effect.
  pub fn gate<P>(&self, predicate: P) -> std::result::Result<bool, FlagError>
  where
    P: FnOnce(&FlagSet) -> std::result::Result<bool, FlagError>,
  {
    predicate(self.context.flags())
  }

  fn version_gate(&mut self, range: &str, name: &str, body: TestBody, focus: bool) -> Result<()> {
    let range = Range::parse(range)?;
    self.apply(Some(&range), None::<NoPredicate>, name, body, focus);
    Ok(())
  }

  fn apply<P>(
    &mut self,
    range: Option<&Range>,
    predicate: Option<P>,
    name: &str,
    body: TestBody,
    focus: bool,
  ) where
    P: FnOnce(&FlagSet) -> std::result::Result<bool, FlagError>,
  {
    match decide(self.context, range, predicate, focus) {
      Ok(outcome) => {
        tracing::debug!(test = name, outcome = ?outcome, "gate decision");
        self.register(outcome, name, body);
      }
      Err(err) => {
        // A predicate that cannot be evaluated registers as a guaranteed
        // failure rather than a skip.
        tracing::warn!(test = name, error = %err, "gate predicate failed to evaluate");
        let message = format!("gate predicate failed to evaluate: {err}");
        let failing = TestBody::sync(move || Err(Failure::new(message)));
        if focus {
          self.registrar.register_only(name, failing);
        } else {
          self.registrar.register(name, failing);
        }
      }
    }
  }

  fn register(&mut self, outcome: Outcome, name: &str, body: TestBody) {
    match outcome {
      Outcome::Run => self.registrar.register(name, body),
      Outcome::RunOnly => self.registrar.register_only(name, body),
      Outcome::Skip => self.registrar.register_skip(name, body),
      Outcome::RunExpectingFailure => {
        let wrapped = expect_failure(body, UnexpectedPass::capture());
        self.registrar.register(&gated_name(name), wrapped);
      }
      Outcome::RunOnlyExpectingFailure => {
        let wrapped = expect_failure(body, UnexpectedPass::capture());
        self.registrar.register_only(&gated_name(name), wrapped);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flags::FlagSet;
  use semver_js::Version;
  use std::sync::atomic::AtomicUsize;
  use std::sync::atomic::Ordering;
  use std::sync::Arc;

  fn context(version: &str, flags: FlagSet) -> GateContext {
    GateContext::new(Version::parse(version).unwrap(), flags)
  }

  fn range(raw: &str) -> Range {
    Range::parse(raw).unwrap()
  }

  #[test]
  fn decide_runs_when_nothing_gates() {
    let ctx = context("18.2.0", FlagSet::empty());
    assert_eq!(
      decide(&ctx, None, None::<NoPredicate>, false),
      Ok(Outcome::Run)
    );
    assert_eq!(
      decide(&ctx, None, None::<NoPredicate>, true),
      Ok(Outcome::RunOnly)
    );
  }

  #[test]
  fn decide_skips_on_version_mismatch_even_under_focus() {
    let ctx = context("18.2.0", FlagSet::empty());
    let range = range(">=19.0.0");
    assert_eq!(
      decide(&ctx, Some(&range), None::<NoPredicate>, true),
      Ok(Outcome::Skip)
    );
  }

  #[test]
  fn decide_maps_predicate_results_to_outcomes() {
    let ctx = context("18.2.0", FlagSet::from_iter([("enable_something", false)]));
    assert_eq!(
      decide(&ctx, None, Some(|flags: &FlagSet| flags.enabled("enable_something")), false),
      Ok(Outcome::RunExpectingFailure)
    );
    assert_eq!(
      decide(&ctx, None, Some(|flags: &FlagSet| flags.enabled("enable_something")), true),
      Ok(Outcome::RunOnlyExpectingFailure)
    );
    assert_eq!(
      decide(&ctx, None, Some(|_: &FlagSet| Ok(true)), false),
      Ok(Outcome::Run)
    );
  }

  #[test]
  fn decide_short_circuits_the_predicate_on_version_mismatch() {
    let ctx = context("18.2.0", FlagSet::empty());
    let range = range(">=19.0.0");
    let evaluated = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&evaluated);
    let outcome = decide(
      &ctx,
      Some(&range),
      Some(move |flags: &FlagSet| {
        seen.fetch_add(1, Ordering::Relaxed);
        flags.enabled("missing")
      }),
      false,
    );
    assert_eq!(outcome, Ok(Outcome::Skip));
    assert_eq!(evaluated.load(Ordering::Relaxed), 0);
  }

  #[test]
  fn decide_surfaces_predicate_errors() {
    let ctx = context("18.2.0", FlagSet::empty());
    assert_eq!(
      decide(&ctx, None, Some(|flags: &FlagSet| flags.enabled("missing")), false),
      Err(FlagError::Unknown("missing".to_string()))
    );
  }

  #[test]
  fn gated_name_is_decorated() {
    assert_eq!(gated_name("adds"), "[GATED, SHOULD FAIL] adds");
  }
}
