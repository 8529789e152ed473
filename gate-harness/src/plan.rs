use crate::body::run_body;
use crate::body::TestBody;
use serde::Serialize;

/// The registration primitives of the underlying test runner.
///
/// The gate layer only ever calls these three; everything else about the
/// runner (ordering, timeouts, output) is its own business.
pub trait Registrar {
  fn register(&mut self, name: &str, body: TestBody);
  fn register_only(&mut self, name: &str, body: TestBody);
  fn register_skip(&mut self, name: &str, body: TestBody);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterMode {
  Normal,
  Only,
  Skip,
}

/// A collected registration, waiting to be executed.
#[derive(Debug)]
pub struct PlannedTest {
  pub name: String,
  pub mode: RegisterMode,
  body: TestBody,
}

/// A [`Registrar`] that collects registrations during suite collection and
/// executes them sequentially, in registration order.
#[derive(Debug, Default)]
pub struct TestPlan {
  tests: Vec<PlannedTest>,
}

impl Registrar for TestPlan {
  fn register(&mut self, name: &str, body: TestBody) {
    self.push(name, RegisterMode::Normal, body);
  }

  fn register_only(&mut self, name: &str, body: TestBody) {
    self.push(name, RegisterMode::Only, body);
  }

  fn register_skip(&mut self, name: &str, body: TestBody) {
    self.push(name, RegisterMode::Skip, body);
  }
}

impl TestPlan {
  pub fn new() -> TestPlan {
    TestPlan::default()
  }

  pub fn len(&self) -> usize {
    self.tests.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tests.is_empty()
  }

  pub fn tests(&self) -> &[PlannedTest] {
    &self.tests
  }

  fn push(&mut self, name: &str, mode: RegisterMode, body: TestBody) {
    self.tests.push(PlannedTest {
      name: name.to_string(),
      mode,
      body,
    });
  }

  /// Executes every planned test and reports the outcomes.
  ///
  /// If any test was registered with exclusive focus, every other runnable
  /// test is demoted to a skip, mirroring the runner's `only` semantics.
  /// Skipped bodies are never invoked.
  pub fn run(self) -> RunReport {
    let focused = self.tests.iter().any(|test| test.mode == RegisterMode::Only);
    let mut results = Vec::with_capacity(self.tests.len());
    for test in self.tests {
      let status = match test.mode {
        RegisterMode::Skip => TestStatus::Skipped {
          reason: SkipReason::Registered,
        },
        RegisterMode::Normal if focused => TestStatus::Skipped {
          reason: SkipReason::FocusDemoted,
        },
        RegisterMode::Normal | RegisterMode::Only => match run_body(test.body) {
          Ok(()) => TestStatus::Passed,
          Err(failure) => TestStatus::Failed {
            message: failure.render(),
          },
        },
      };
      tracing::debug!(test = %test.name, status = ?status, "test executed");
      results.push(TestReport {
        name: test.name,
        status,
      });
    }

    RunReport::new(results)
  }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  /// Registered as a skip (version mismatch or an ignore declaration).
  Registered,
  /// Demoted because another test in the plan holds exclusive focus.
  FocusDemoted,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TestStatus {
  Passed,
  Failed { message: String },
  Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TestReport {
  pub name: String,
  #[serde(flatten)]
  pub status: TestStatus,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Summary {
  pub total: usize,
  pub passed: usize,
  pub failed: usize,
  pub skipped: usize,
}

impl Summary {
  fn record(&mut self, status: &TestStatus) {
    self.total += 1;
    match status {
      TestStatus::Passed => self.passed += 1,
      TestStatus::Failed { .. } => self.failed += 1,
      TestStatus::Skipped { .. } => self.skipped += 1,
    }
  }
}

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// The outcome of executing a [`TestPlan`], in registration order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunReport {
  pub schema_version: u32,
  pub summary: Summary,
  pub results: Vec<TestReport>,
}

impl RunReport {
  fn new(results: Vec<TestReport>) -> RunReport {
    let mut summary = Summary::default();
    for result in &results {
      summary.record(&result.status);
    }
    RunReport {
      schema_version: REPORT_SCHEMA_VERSION,
      summary,
      results,
    }
  }

  pub fn has_failures(&self) -> bool {
    self.summary.failed > 0
  }

  pub fn status_of(&self, name: &str) -> Option<&TestStatus> {
    self
      .results
      .iter()
      .find(|result| result.name == name)
      .map(|result| &result.status)
  }
}
