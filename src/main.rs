use anyhow::{Context, Result};
use ci_runner::cli::commands::{PlanCommand, RunCommand, ValidateCommand};
use ci_runner::cli::output::*;
use ci_runner::cli::{Cli, Command};
use ci_runner::core::config::WorkflowConfig;
use ci_runner::core::{Event, ExecutionStatus};
use ci_runner::execution::{ExecutionEngine, ExecutionEvent};
use ci_runner::report::create_summary;
use ci_runner::shell::SubprocessRunner;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let default_filter = if cli.verbose {
        "ci_runner=debug"
    } else {
        "ci_runner=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_workflow(cmd).await?,
        Command::Validate(cmd) => validate_workflow(cmd)?,
        Command::Plan(cmd) => plan_workflow(cmd)?,
    }

    Ok(())
}

async fn run_workflow(cmd: &RunCommand) -> Result<()> {
    let config = WorkflowConfig::from_file(&cmd.file).context("Failed to load workflow config")?;
    let workflow = config.to_workflow()?;

    println!("{} Loaded workflow: {}", INFO, style(&workflow.name).bold());

    let event = Event::new(cmd.event.as_str(), &cmd.branch);
    let Some(mut run) = workflow.start_run(event.clone()) else {
        println!(
            "{} {} does not trigger {}, nothing to do",
            INFO,
            style(&event).cyan(),
            style(&workflow.name).bold()
        );
        return Ok(());
    };

    // Apply variable overrides
    for (key, value) in &cmd.var {
        run.variables.insert(key.clone(), value.clone());
        println!(
            "{} Variable override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
    }

    let workdir = match &cmd.workdir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to resolve working directory")?,
    };

    let engine = ExecutionEngine::new(SubprocessRunner::new())
        .with_working_dir(workdir)
        .skip_debug_sessions(cmd.no_debug_session);

    // Console output goes through the progress bar
    let progress = create_progress_bar(run.steps.len());
    let bar = progress.clone();
    engine
        .add_event_handler(move |event| {
            match &event {
                ExecutionEvent::StepStarted { name, .. } => bar.set_message(name.clone()),
                ExecutionEvent::StepCompleted { .. }
                | ExecutionEvent::StepFailed { .. }
                | ExecutionEvent::StepSkipped { .. } => bar.inc(1),
                _ => {}
            }
            bar.println(format_execution_event(&event));
        })
        .await;

    println!();
    let status = engine.execute(&mut run).await?;
    progress.finish_and_clear();

    let summary = create_summary(&run);

    println!("\n{}", style("Summary").bold());
    for step in &summary.steps {
        println!("{}", format_step_summary(step));
    }
    if let (Some(started), Some(completed)) = (summary.started_at, summary.completed_at) {
        if let Ok(duration) = completed.signed_duration_since(started).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }

    if let Some(path) = &cmd.report {
        summary.write_to(path)?;
        println!("{} Report written to {}", INFO, style(path.display()).dim());
    }

    // Print final status
    if status == ExecutionStatus::Completed {
        println!(
            "\n{} {} {}",
            CHECK,
            style(&run.workflow_name).bold(),
            style("succeeded").green()
        );
    } else {
        println!(
            "\n{} {} {}",
            CROSS,
            style(&run.workflow_name).bold(),
            style("failed").red()
        );
        std::process::exit(1);
    }

    Ok(())
}

fn validate_workflow(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating workflow...", INFO);

    let result = WorkflowConfig::from_file(&cmd.file);

    match result {
        Ok(config) => {
            println!("{} Workflow configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Steps: {}", style(config.steps.len()).cyan());
            println!("  Variables: {}", style(config.variable_count()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

fn plan_workflow(cmd: &PlanCommand) -> Result<()> {
    let config = WorkflowConfig::from_file(&cmd.file).context("Failed to load workflow config")?;
    let workflow = config.to_workflow()?;
    let event = Event::new(cmd.event.as_str(), &cmd.branch);

    let variables = workflow.plan_variables(&cmd.var);

    if workflow.is_triggered_by(&event) {
        println!(
            "{} {} triggers {}",
            CHECK,
            style(&event).cyan(),
            style(&workflow.name).bold()
        );
    } else {
        println!(
            "{} {} does not trigger {}",
            WARN,
            style(&event).cyan(),
            style(&workflow.name).bold()
        );
    }

    for (index, step) in workflow.steps.iter().enumerate() {
        println!(
            "\n{}. {} {} {}",
            index + 1,
            style(&step.id).bold(),
            style(format!("({})", step.action.kind())).dim(),
            style(format!("if: {}", step.condition)).dim()
        );
        if step.continue_on_error {
            println!("    {}", style("continue-on-error").yellow());
        }
        for command in step.commands(&variables) {
            println!("{}", format_command(&command));
        }
    }

    Ok(())
}
