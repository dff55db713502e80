//! CLI output formatting

use crate::{
    actions::{CommandSpec, ExitPolicy},
    core::ExecutionStatus,
    execution::ExecutionEvent,
    report::{StepStatus, StepSummary},
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("SUCCESS").green().to_string(),
        ExecutionStatus::Failed => style("FAILURE").red().to_string(),
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            run_id,
            workflow_name,
            event,
            total_steps,
        } => format!(
            "{} Starting {} on {} ({} steps, {})",
            ROCKET,
            style(workflow_name).bold(),
            style(event).cyan(),
            total_steps,
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StepStarted { step_id, name, .. } => {
            if name == step_id {
                format!("{} {}", SPINNER, style(step_id).cyan())
            } else {
                format!("{} {} {}", SPINNER, style(step_id).cyan(), style(name).dim())
            }
        }
        ExecutionEvent::StepOutput { step_id, output } => {
            format!("  {} {}", style(format!("{} |", step_id)).dim(), output)
        }
        ExecutionEvent::StepCompleted { step_id, report } => {
            let mut line = format!("{} {}", CHECK, style(step_id).green());
            if let Some(findings) = report.findings {
                line.push_str(&format!(" ({} finding(s))", findings));
            }
            if let Some(tests) = report.tests {
                line.push_str(&format!(" ({} passed)", tests.passed));
            }
            let skipped = report.skipped_commands();
            if skipped > 0 {
                line.push_str(&format!(" ({} skipped)", skipped));
            }
            line
        }
        ExecutionEvent::StepFailed {
            step_id,
            error,
            tolerated,
        } => {
            if *tolerated {
                format!(
                    "{} {}: {} (continue-on-error)",
                    WARN,
                    style(step_id).yellow(),
                    style(error).dim()
                )
            } else {
                format!("{} {}: {}", CROSS, style(step_id).red(), style(error).dim())
            }
        }
        ExecutionEvent::StepSkipped { step_id, reason } => {
            format!("{} {} ({})", SKIP, style(step_id).dim(), style(reason).dim())
        }
        ExecutionEvent::RunCompleted { run_id, status } => format!(
            "{} Run {} finished: {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Format one planned command
pub fn format_command(command: &CommandSpec) -> String {
    let mut line = format!("    $ {}", command.script);
    if let Some(guard) = &command.guard {
        line.push_str(&format!(
            " {}",
            style(format!("[if {} exists]", guard.display())).dim()
        ));
    }
    if command.policy == ExitPolicy::Advisory {
        line.push_str(&format!(" {}", style("[advisory]").yellow()));
    }
    line
}

/// Format a step line of the final summary
pub fn format_step_summary(step: &StepSummary) -> String {
    let icon = match step.status {
        StepStatus::Completed => CHECK,
        StepStatus::Failed if step.continue_on_error => WARN,
        StepStatus::Failed => CROSS,
        StepStatus::Skipped => SKIP,
        StepStatus::Pending | StepStatus::Running => SPINNER,
    };

    let detail = step
        .error
        .as_deref()
        .or(step.reason.as_deref())
        .map(|d| format!(" - {}", style(d).dim()))
        .unwrap_or_default();

    format!("  {}{}{}", icon, style(&step.id).bold(), detail)
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
