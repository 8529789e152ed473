use crate::HarnessError;
use crate::Result;
use serde::Serialize;
use std::fs;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

/// Serialize `value` as pretty JSON.
///
/// Output is deterministic because every report type keeps its collections
/// in a stable order (registration order for results, `BTreeMap` for maps).
pub fn to_json_pretty_stable<T: Serialize>(value: &T) -> Result<String> {
  serde_json::to_string_pretty(value).map_err(|err| HarnessError::Output(err.to_string()))
}

/// Write a pretty, deterministic JSON report to `path`, creating parent
/// directories as needed.
pub fn write_json_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }

  let file = fs::File::create(path)?;
  let mut writer = BufWriter::new(file);
  write_json_report_to_writer(&mut writer, report)?;
  writer.flush().ok();
  Ok(())
}

/// Write a pretty, deterministic JSON report to `writer`.
pub fn write_json_report_to_writer<W: Write, T: Serialize>(writer: &mut W, report: &T) -> Result<()> {
  serde_json::to_writer_pretty(&mut *writer, report)
    .map_err(|err| HarnessError::Output(err.to_string()))?;
  writeln!(&mut *writer).ok();
  Ok(())
}

/// Write a pretty, deterministic JSON report to stdout.
pub fn write_json_report_to_stdout<T: Serialize>(report: &T) -> Result<()> {
  let stdout = io::stdout();
  let mut handle = stdout.lock();
  write_json_report_to_writer(&mut handle, report)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::body::TestBody;
  use crate::plan::Registrar;
  use crate::plan::TestPlan;

  #[test]
  fn run_report_serialization_is_stable_and_ordered() {
    let mut plan = TestPlan::new();
    plan.register("a", TestBody::sync(|| Ok(())));
    plan.register_skip("b", TestBody::sync(|| Ok(())));
    let report = plan.run();

    let json_one = to_json_pretty_stable(&report).unwrap();
    let json_two = to_json_pretty_stable(&report).unwrap();
    assert_eq!(json_one, json_two);

    let schema_idx = json_one.find("\"schema_version\"").unwrap();
    let summary_idx = json_one.find("\"summary\"").unwrap();
    let results_idx = json_one.find("\"results\"").unwrap();
    assert!(schema_idx < summary_idx);
    assert!(summary_idx < results_idx);
  }

  #[test]
  fn report_entries_flatten_the_outcome() {
    let mut plan = TestPlan::new();
    plan.register("adds", TestBody::sync(|| Ok(())));
    let report = plan.run();

    let json = to_json_pretty_stable(&report).unwrap();
    assert!(json.contains("\"name\": \"adds\""));
    assert!(json.contains("\"outcome\": \"passed\""));
  }
}
