//! Conditional test registration for version- and flag-gated suites.
//!
//! A suite declares that a test is expected to pass only under certain
//! conditions (the subject version satisfying a range, or a predicate over
//! the resolved feature-flag set), and the harness registers the test with
//! the runner accordingly: run normally, skip, or run *inverted*, where the
//! registered test passes only while the original body keeps failing.
//!
//! Gate evaluation happens entirely at suite-collection time against a
//! frozen [`GateContext`]; the outcome of a declaration never depends on
//! execution order or any other mutable state.
//!
//! ```
//! use gate_harness::{FlagSet, GateContext, Gates, TestBody, TestPlan};
//! use semver_js::Version;
//!
//! let context = GateContext::new(
//!   Version::parse("18.2.0").unwrap(),
//!   FlagSet::from_iter([("enable_something", false)]),
//! );
//! let mut plan = TestPlan::new();
//! let mut gates = Gates::new(&context, &mut plan);
//!
//! gates
//!   .test_for_version(">=17.0.0", "renders", TestBody::sync(|| Ok(())))
//!   .unwrap();
//! gates.test_gated(
//!   |flags| flags.enabled("enable_something"),
//!   "still broken",
//!   TestBody::sync(|| panic!("not supported")),
//! );
//!
//! let report = plan.run();
//! assert!(!report.has_failures());
//! ```

use std::io;
use thiserror::Error;

pub mod body;
pub mod context;
pub mod flags;
pub mod gate;
pub mod invert;
pub mod plan;
pub mod report;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
  #[error(transparent)]
  Io(#[from] io::Error),
  #[error(transparent)]
  Semver(#[from] semver_js::SemverError),
  #[error("invalid flag manifest: {0}")]
  Manifest(String),
  #[error("output failed: {0}")]
  Output(String),
}

pub use body::BodyResult;
pub use body::Done;
pub use body::Failure;
pub use body::TestBody;
pub use context::GateContext;
pub use flags::FlagError;
pub use flags::FlagSet;
pub use flags::FlagValue;
pub use gate::decide;
pub use gate::gated_name;
pub use gate::Gates;
pub use gate::Outcome;
pub use gate::GATED_NAME_PREFIX;
pub use invert::expect_failure;
pub use invert::UnexpectedPass;
pub use invert::CALLBACK_BODY_MESSAGE;
pub use invert::UNEXPECTED_PASS_MESSAGE;
pub use plan::RegisterMode;
pub use plan::Registrar;
pub use plan::RunReport;
pub use plan::SkipReason;
pub use plan::Summary;
pub use plan::TestPlan;
pub use plan::TestReport;
pub use plan::TestStatus;
pub use plan::REPORT_SCHEMA_VERSION;
pub use report::to_json_pretty_stable;
pub use report::write_json_report;
pub use report::write_json_report_to_stdout;
pub use report::write_json_report_to_writer;
