#![cfg(unix)]

//! Kept in its own test binary: it mutates the process environment.

use std::collections::HashMap;
use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;

use cadence_action::{Action, Shell, Step};
use cadence_runtime::{RunnerConfig, StepRunner};
use indexmap::IndexMap;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_non_utf8_environment_variable_does_not_break_runs() {
  // SAFETY: this is the only test in the binary, so no other thread reads
  // the environment concurrently.
  unsafe {
    std::env::set_var("CADENCE_TEST_NON_UTF8", OsString::from_vec(vec![0xff]));
    std::env::set_var("CADENCE_TEST_PLAIN", "plain");
  }

  let tmp = TempDir::new().unwrap();
  let action = Action {
    name: "env".to_string(),
    description: String::new(),
    inputs: IndexMap::new(),
    steps: vec![
      Step::run("home", Shell::Sh, "echo ${{ env.CADENCE_TEST_PLAIN }}"),
      Step::run("inherited", Shell::Sh, "test -n \"$CADENCE_TEST_NON_UTF8\""),
    ],
  };
  let runner = StepRunner::new(RunnerConfig::new(tmp.path().join("tools")));
  let ctx = runner
    .prepare(&action, &HashMap::new(), tmp.path())
    .unwrap();
  assert!(!ctx.env.contains_key("CADENCE_TEST_NON_UTF8"));

  let report = runner
    .execute(&action, ctx, CancellationToken::new())
    .wait()
    .await;

  assert!(report.success(), "{:?}", report);
  assert_eq!(report.results[0].stdout, "plain\n");
}
