use futures::executor::block_on;
use futures::future::BoxFuture;
use std::any::Any;
use std::backtrace::Backtrace;
use std::backtrace::BacktraceStatus;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::future::Future;
use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;

/// A test failure: a message, plus the backtrace of the declaration site for
/// failures manufactured by the gate layer.
#[derive(Debug)]
pub struct Failure {
  message: String,
  backtrace: Option<Backtrace>,
}

impl Failure {
  pub fn new(message: impl Into<String>) -> Failure {
    Failure {
      message: message.into(),
      backtrace: None,
    }
  }

  pub fn with_backtrace(message: impl Into<String>, backtrace: Backtrace) -> Failure {
    Failure {
      message: message.into(),
      backtrace: Some(backtrace),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn backtrace(&self) -> Option<&Backtrace> {
    self.backtrace.as_ref()
  }

  /// The message, with the captured backtrace appended when one exists.
  pub fn render(&self) -> String {
    match &self.backtrace {
      Some(backtrace) if backtrace.status() == BacktraceStatus::Captured => {
        format!("{}\n{}", self.message, backtrace)
      }
      _ => self.message.clone(),
    }
  }
}

impl Display for Failure {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message)
  }
}

impl std::error::Error for Failure {}

pub type BodyResult = std::result::Result<(), Failure>;

/// Completion handle for callback-style bodies. Dropping it without
/// signaling makes the test fail rather than hang.
pub struct Done {
  tx: mpsc::Sender<BodyResult>,
}

impl Done {
  pub fn ok(self) {
    let _ = self.tx.send(Ok(()));
  }

  pub fn fail(self, message: impl Into<String>) {
    let _ = self.tx.send(Err(Failure::new(message)));
  }
}

/// A registered test body.
///
/// `Sync` bodies return their result directly; `Future` bodies are driven to
/// completion by the executor; `Callback` bodies signal through a [`Done`]
/// handle. Panics anywhere are caught and reported as failures.
pub enum TestBody {
  Sync(Box<dyn FnOnce() -> BodyResult + Send + 'static>),
  Future(Box<dyn FnOnce() -> BoxFuture<'static, BodyResult> + Send + 'static>),
  Callback(Box<dyn FnOnce(Done) + Send + 'static>),
}

impl TestBody {
  pub fn sync(body: impl FnOnce() -> BodyResult + Send + 'static) -> TestBody {
    TestBody::Sync(Box::new(body))
  }

  pub fn future<F, Fut>(body: F) -> TestBody
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = BodyResult> + Send + 'static,
  {
    TestBody::Future(Box::new(move || Box::pin(body())))
  }

  pub fn callback(body: impl FnOnce(Done) + Send + 'static) -> TestBody {
    TestBody::Callback(Box::new(body))
  }

  pub fn is_callback(&self) -> bool {
    matches!(self, TestBody::Callback(_))
  }
}

impl Debug for TestBody {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      TestBody::Sync(_) => "TestBody::Sync",
      TestBody::Future(_) => "TestBody::Future",
      TestBody::Callback(_) => "TestBody::Callback",
    })
  }
}

/// Runs a body to completion, converting panics into failures.
pub(crate) fn run_body(body: TestBody) -> BodyResult {
  match body {
    TestBody::Sync(body) => caught(body),
    TestBody::Future(body) => caught(move || block_on(body())),
    TestBody::Callback(body) => {
      let (tx, rx) = mpsc::channel();
      let done = Done { tx };
      caught(move || {
        body(done);
        Ok(())
      })?;
      match rx.recv() {
        Ok(result) => result,
        // Every sender is gone without a signal.
        Err(_) => Err(Failure::new(
          "callback body completed without signaling `Done`",
        )),
      }
    }
  }
}

fn caught(body: impl FnOnce() -> BodyResult) -> BodyResult {
  match catch_unwind(AssertUnwindSafe(body)) {
    Ok(result) => result,
    Err(payload) => Err(Failure::new(panic_message(payload))),
  }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "test body panicked".to_string()
  }
}
