#![cfg(unix)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cadence_action::{Action, ActionReference, InputSpec, Shell, Step};
use cadence_invoker::{HostPassthrough, Invokers, SetupRuntime};
use cadence_resolver::{InputError, Resolver, StandardResolver};
use cadence_runtime::{
  AbortReason, ChannelNotifier, ExecutionEvent, ExecutionNotifier, RunStatus, RunnerConfig,
  RuntimeError, StepFailure, StepRunner, exit_code,
};
use indexmap::IndexMap;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const SHA: &str = "1a4442cacd436585916779262731d5b162bc6ec7";

fn make_action(inputs: Vec<InputSpec>, steps: Vec<Step>) -> Action {
  Action {
    name: "test-action".to_string(),
    description: String::new(),
    inputs: inputs.into_iter().map(|i| (i.name.clone(), i)).collect(),
    steps,
  }
}

fn sh(name: &str, command: &str) -> Step {
  Step::run(name, Shell::Sh, command)
}

fn runner(tmp: &TempDir) -> StepRunner {
  StepRunner::new(RunnerConfig::new(tmp.path().join("tools")))
}

fn no_inputs() -> HashMap<String, String> {
  HashMap::new()
}

#[tokio::test]
async fn test_fail_fast_skips_remaining_steps() {
  let tmp = TempDir::new().unwrap();
  let action = make_action(
    vec![],
    vec![sh("A", "exit 0"), sh("B", "exit 1"), sh("C", "echo unreachable")],
  );

  let report = runner(&tmp)
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.results.len(), 2);
  assert!(report.results[0].succeeded());
  assert_eq!(report.results[1].exit_code, Some(1));
  assert_eq!(
    report.results[1].failure(),
    Some(&StepFailure::NonZeroExit { code: 1 })
  );
  assert_eq!(report.not_run, vec!["C".to_string()]);
  assert_eq!(
    report.status,
    RunStatus::Aborted(AbortReason::Failed {
      step: "B".to_string()
    })
  );
  assert!(!report.success());
  assert_eq!(report.exit_code(), exit_code::STEP_FAILED);
}

#[tokio::test]
async fn test_tolerant_mode_runs_every_step() {
  let tmp = TempDir::new().unwrap();
  let mut config = RunnerConfig::new(tmp.path().join("tools"));
  config.fail_fast = false;
  let runner = StepRunner::new(config);
  let action = make_action(
    vec![],
    vec![sh("A", "exit 0"), sh("B", "exit 1"), sh("C", "echo reached")],
  );

  let report = runner
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.results.len(), 3);
  assert_eq!(report.results[2].stdout, "reached\n");
  assert!(report.not_run.is_empty());
  assert_eq!(report.status, RunStatus::Completed);
  assert!(!report.success());
  assert_eq!(report.exit_code(), exit_code::STEP_FAILED);
}

#[tokio::test]
async fn test_working_directory_from_input_default() {
  let tmp = TempDir::new().unwrap();
  std::fs::create_dir(tmp.path().join("proj")).unwrap();
  let action = make_action(
    vec![InputSpec::optional("working-directory", Some("proj/"))],
    vec![sh("where", "pwd -P").with_working_directory("${{ inputs.working-directory }}")],
  );

  let report = runner(&tmp)
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await
    .unwrap();

  assert!(report.success());
  let expected = tmp.path().join("proj").canonicalize().unwrap();
  assert_eq!(Path::new(report.results[0].stdout.trim()), expected);
}

#[tokio::test]
async fn test_supplied_input_overrides_default() {
  let tmp = TempDir::new().unwrap();
  let action = make_action(
    vec![InputSpec::optional("greeting", Some("hello"))],
    vec![sh("greet", "echo ${{ inputs.greeting }}")],
  );
  let supplied: HashMap<String, String> = [("greeting".to_string(), "hi".to_string())].into();

  let report = runner(&tmp)
    .run(&action, &supplied, tmp.path(), CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.results[0].stdout, "hi\n");
}

#[tokio::test]
async fn test_unresolved_placeholder_aborts_run() {
  let tmp = TempDir::new().unwrap();
  let action = make_action(
    vec![],
    vec![
      sh("first", "echo ok"),
      sh("second", "echo ${{ inputs.nope }}"),
      sh("third", "echo never"),
    ],
  );

  let report = runner(&tmp)
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.results.len(), 1);
  assert!(matches!(
    &report.status,
    RunStatus::Aborted(AbortReason::TemplateResolution { step, .. }) if step == "second"
  ));
  assert_eq!(
    report.not_run,
    vec!["second".to_string(), "third".to_string()]
  );
  assert_eq!(report.exit_code(), exit_code::TEMPLATE_ERROR);
}

#[tokio::test]
async fn test_missing_required_input_fails_before_any_step() {
  let tmp = TempDir::new().unwrap();
  let marker = tmp.path().join("ran");
  let action = make_action(
    vec![InputSpec::required("token")],
    vec![sh("touch", &format!("touch {}", marker.display()))],
  );

  let result = runner(&tmp)
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await;

  assert!(matches!(
    result,
    Err(RuntimeError::Input(InputError::MissingRequiredInput(ref name))) if name == "token"
  ));
  assert!(!marker.exists());
}

#[tokio::test]
async fn test_cancel_before_start() {
  let tmp = TempDir::new().unwrap();
  let action = make_action(vec![], vec![sh("A", "echo a"), sh("B", "echo b")]);
  let cancel = CancellationToken::new();
  cancel.cancel();

  let report = runner(&tmp)
    .run(&action, &no_inputs(), tmp.path(), cancel)
    .await
    .unwrap();

  assert!(report.results.is_empty());
  assert_eq!(report.status, RunStatus::Aborted(AbortReason::Cancelled));
  assert_eq!(report.not_run.len(), 2);
  assert_eq!(report.exit_code(), exit_code::CANCELLED);
}

/// Cancels the run as soon as the first step finishes.
struct CancelAfterFirstStep(CancellationToken);

impl ExecutionNotifier for CancelAfterFirstStep {
  fn notify(&self, event: ExecutionEvent) {
    if matches!(event, ExecutionEvent::StepFinished { .. }) {
      self.0.cancel();
    }
  }
}

#[tokio::test]
async fn test_cancel_at_step_boundary_keeps_results() {
  let tmp = TempDir::new().unwrap();
  let cancel = CancellationToken::new();
  let runner =
    runner(&tmp).with_notifier(Arc::new(CancelAfterFirstStep(cancel.clone())));
  let action = make_action(
    vec![],
    vec![sh("A", "echo a"), sh("B", "echo b"), sh("C", "echo c")],
  );

  let report = runner
    .run(&action, &no_inputs(), tmp.path(), cancel)
    .await
    .unwrap();

  assert_eq!(report.results.len(), 1);
  assert_eq!(report.results[0].stdout, "a\n");
  assert_eq!(report.status, RunStatus::Aborted(AbortReason::Cancelled));
  assert_eq!(report.not_run, vec!["B".to_string(), "C".to_string()]);
}

#[tokio::test]
async fn test_step_timeout_kills_and_fails() {
  let tmp = TempDir::new().unwrap();
  let action = make_action(
    vec![],
    vec![
      sh("slow", "sleep 5").with_timeout(Duration::from_millis(100)),
      sh("after", "echo after"),
    ],
  );

  let started = Instant::now();
  let report = runner(&tmp)
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await
    .unwrap();

  assert!(started.elapsed() < Duration::from_secs(4));
  assert_eq!(report.results.len(), 1);
  assert_eq!(
    report.results[0].failure(),
    Some(&StepFailure::Timeout { after_ms: 100 })
  );
  assert_eq!(report.not_run, vec!["after".to_string()]);
}

#[tokio::test]
async fn test_default_timeout_applies_to_steps_without_one() {
  let tmp = TempDir::new().unwrap();
  let mut config = RunnerConfig::new(tmp.path().join("tools"));
  config.default_timeout = Some(Duration::from_millis(100));
  let action = make_action(vec![], vec![sh("slow", "sleep 5")]);

  let report = StepRunner::new(config)
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await
    .unwrap();

  assert!(matches!(
    report.results[0].failure(),
    Some(StepFailure::Timeout { .. })
  ));
}

#[tokio::test]
async fn test_step_env_does_not_leak() {
  let tmp = TempDir::new().unwrap();
  let action = make_action(
    vec![],
    vec![
      sh("set", "echo \"$CADENCE_TEST_SECRET\"").with_env("CADENCE_TEST_SECRET", "s3cret"),
      sh("check", "echo \"[${CADENCE_TEST_SECRET:-}]\""),
    ],
  );

  let report = runner(&tmp)
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.results[0].stdout, "s3cret\n");
  assert_eq!(report.results[1].stdout, "[]\n");
}

#[tokio::test]
async fn test_installed_runtime_is_on_path_for_later_steps() {
  use std::os::unix::fs::PermissionsExt;

  let tmp = TempDir::new().unwrap();
  let tools = tmp.path().join("tools");
  let bin = tools.join("node/20.11.1/x64/bin");
  std::fs::create_dir_all(&bin).unwrap();
  let tool = bin.join("cadence-fake-node");
  std::fs::write(&tool, "#!/bin/sh\necho v20.11.1\n").unwrap();
  std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

  let invokers = Invokers::new(Arc::new(HostPassthrough::disabled()))
    .with(Arc::new(SetupRuntime::new(&tools).with_arch("x64")));
  let runner = StepRunner::new(RunnerConfig::new(&tools)).with_invokers(invokers);

  let mut with = IndexMap::new();
  with.insert(
    "node-version".to_string(),
    "${{ inputs.node-version }}".to_string(),
  );
  let reference = ActionReference::parse(&format!("actions/setup-node@{}", SHA)).unwrap();
  let action = make_action(
    vec![InputSpec::optional("node-version", Some("20"))],
    vec![
      Step::uses("setup", reference, with),
      sh("version", "cadence-fake-node"),
    ],
  );

  let ctx = runner.prepare(&action, &no_inputs(), tmp.path()).unwrap();
  let report = runner
    .execute(&action, ctx, CancellationToken::new())
    .wait()
    .await;

  assert!(report.success(), "{:?}", report);
  assert_eq!(report.results[1].stdout, "v20.11.1\n");
}

#[tokio::test]
async fn test_unpinned_reference_fails_step() {
  let tmp = TempDir::new().unwrap();
  let reference = ActionReference::parse("actions/checkout@v4").unwrap();
  let action = make_action(
    vec![],
    vec![
      Step::uses("checkout", reference, IndexMap::new()),
      sh("after", "echo after"),
    ],
  );

  let report = runner(&tmp)
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.results.len(), 1);
  assert!(matches!(
    report.results[0].failure(),
    Some(StepFailure::UnpinnedReference { reference }) if reference.contains("actions/checkout")
  ));
  assert_eq!(report.results[0].exit_code, None);
  assert_eq!(report.not_run, vec!["after".to_string()]);
}

#[tokio::test]
async fn test_channel_notifier_sees_lifecycle() {
  let tmp = TempDir::new().unwrap();
  let (notifier, mut events) = ChannelNotifier::channel();
  let runner = runner(&tmp).with_notifier(Arc::new(notifier));
  let action = make_action(vec![], vec![sh("A", "true"), sh("B", "true")]);

  let report = runner
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await
    .unwrap();
  drop(runner);

  let mut seen = Vec::new();
  while let Some(event) = events.recv().await {
    seen.push(event);
  }

  assert_eq!(seen.len(), 6);
  assert!(matches!(&seen[0], ExecutionEvent::RunStarted { run_id, .. } if *run_id == report.run_id));
  assert!(matches!(&seen[1], ExecutionEvent::StepStarted { index: 0, step, .. } if step == "A"));
  assert!(matches!(&seen[2], ExecutionEvent::StepFinished { result, .. } if result.name == "A"));
  assert!(matches!(&seen[3], ExecutionEvent::StepStarted { index: 1, .. }));
  assert!(matches!(&seen[4], ExecutionEvent::StepFinished { .. }));
  assert!(matches!(
    &seen[5],
    ExecutionEvent::RunCompleted { success: true, .. }
  ));
}

#[tokio::test]
async fn test_loaded_yaml_action_runs() {
  let tmp = TempDir::new().unwrap();
  let yaml = r#"
name: build
inputs:
  target:
    description: what to build
    default: all
runs:
  using: composite
  steps:
    - name: announce
      shell: sh
      run: echo "building ${{ inputs.target }}"
    - id: count
      shell: sh
      env:
        RETRIES: 3
      run: echo "$RETRIES"
"#;
  let def = cadence_config::from_yaml_str(yaml).unwrap();
  let action = StandardResolver::new().resolve(def).unwrap();

  let report = runner(&tmp)
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await
    .unwrap();

  assert!(report.success());
  assert_eq!(report.results[0].stdout, "building all\n");
  assert_eq!(report.results[1].id.as_deref(), Some("count"));
  assert_eq!(report.results[1].stdout, "3\n");
}

/// Installer stand-in that reports a tool directory containing `:`.
struct BadPathInstaller;

#[async_trait::async_trait]
impl cadence_invoker::ActionInvoker for BadPathInstaller {
  fn handles(&self, reference: &ActionReference) -> bool {
    reference.name == "acme/setup-odd"
  }

  async fn invoke(
    &self,
    _request: cadence_invoker::InvokeRequest<'_>,
  ) -> Result<cadence_invoker::InvokeOutput, cadence_invoker::InvokeError> {
    let mut output = cadence_invoker::InvokeOutput::success("");
    output.path_additions.push("/opt/odd:dir/bin".into());
    Ok(output)
  }
}

#[tokio::test]
async fn test_unusable_tool_path_fails_next_step_clearly() {
  let tmp = TempDir::new().unwrap();
  let invokers =
    Invokers::new(Arc::new(HostPassthrough::disabled())).with(Arc::new(BadPathInstaller));
  let runner = runner(&tmp).with_invokers(invokers);
  let reference = ActionReference::parse(&format!("acme/setup-odd@{}", SHA)).unwrap();
  let action = make_action(
    vec![],
    vec![
      Step::uses("setup", reference, IndexMap::new()),
      sh("use", "echo ran"),
    ],
  );

  let report = runner
    .run(&action, &no_inputs(), tmp.path(), CancellationToken::new())
    .await
    .unwrap();

  assert!(report.results[0].succeeded());
  assert!(matches!(
    report.results[1].failure(),
    Some(StepFailure::Invoke { message }) if message.contains("/opt/odd:dir/bin")
  ));
  assert_eq!(report.results[1].stdout, "");
}
