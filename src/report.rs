//! Human-readable run report.

use cadence_runtime::{AbortReason, RunReport, RunStatus, StepResult};

pub fn print_text(report: &RunReport) {
  print!("{}", render_text(report));
}

fn render_text(report: &RunReport) -> String {
  let mut out = format!("{} ({})\n", report.action, report.run_id);

  for result in &report.results {
    out.push_str(&step_line(result));
    append_stream(&mut out, "stdout", &result.stdout);
    append_stream(&mut out, "stderr", &result.stderr);
  }
  for name in &report.not_run {
    out.push_str(&format!("[skip] {}\n", name));
  }

  let status = match &report.status {
    RunStatus::Completed if report.success() => "succeeded".to_string(),
    RunStatus::Completed => "completed with failures".to_string(),
    RunStatus::Aborted(AbortReason::Failed { step }) => format!("aborted: step '{}' failed", step),
    RunStatus::Aborted(AbortReason::Cancelled) => "cancelled".to_string(),
    RunStatus::Aborted(AbortReason::TemplateResolution { step, message }) => {
      format!("aborted: step '{}': {}", step, message)
    }
  };
  out.push_str(&format!("{} in {} ms\n", status, report.duration_ms));

  out
}

fn step_line(result: &StepResult) -> String {
  let tag = if result.succeeded() { "ok" } else { "fail" };
  let code = result
    .exit_code
    .map(|c| c.to_string())
    .unwrap_or_else(|| "-".to_string());
  format!(
    "[{}] {} (exit {}, {} ms)\n",
    tag, result.name, code, result.duration_ms
  )
}

fn append_stream(out: &mut String, label: &str, text: &str) {
  if text.trim().is_empty() {
    return;
  }
  for line in text.lines() {
    out.push_str(&format!("  {}| {}\n", label, line));
  }
}
