use crate::body::run_body;
use crate::body::Failure;
use crate::body::TestBody;
use std::backtrace::Backtrace;

/// The fixed message of the sentinel failure thrown when a gated body passes.
/// Seeing it in test output means the gate predicate should be flipped on.
pub const UNEXPECTED_PASS_MESSAGE: &str = "gated test was expected to fail, but it passed";

/// Inversion only supports bodies whose completion it can await directly.
pub const CALLBACK_BODY_MESSAGE: &str =
  "gated test helpers do not support callback-style bodies; return a future instead";

/// The sentinel for an inverted test, capturing the backtrace at the gate
/// declaration site so the eventual failure report points there rather than
/// at the wrapper.
#[derive(Debug)]
pub struct UnexpectedPass {
  backtrace: Backtrace,
}

impl UnexpectedPass {
  pub fn capture() -> UnexpectedPass {
    UnexpectedPass {
      backtrace: Backtrace::capture(),
    }
  }

  fn into_failure(self) -> Failure {
    Failure::with_backtrace(UNEXPECTED_PASS_MESSAGE, self.backtrace)
  }
}

/// Wraps `body` so that the wrapping test passes if and only if `body`
/// fails.
///
/// A failing body (an `Err` return, a rejected future, or a panic) is
/// swallowed: the known failure is still present. A body that completes
/// fails the wrapper with `sentinel`. Callback-style bodies fail
/// immediately, before the body is invoked.
pub fn expect_failure(body: TestBody, sentinel: UnexpectedPass) -> TestBody {
  TestBody::sync(move || {
    if body.is_callback() {
      return Err(Failure::new(CALLBACK_BODY_MESSAGE));
    }
    match run_body(body) {
      Err(_) => Ok(()),
      Ok(()) => Err(sentinel.into_failure()),
    }
  })
}
