//! Per-subcommand wiring: construct the core services over the loaded
//! configuration and run one operation.

use std::io::Read;
use std::time::Duration;

use anyhow::{Context, bail};

use cronman_config::CronmanConfig;
use cronman_exec::{Executor, ExternalExecution, apikey, history, log, wrapper};
use cronman_schedule::{serialize_line, validate_schedule};
use cronman_store::TableStore;
use cronman_sync::Reconciler;
use cronman_types::{Schedule, Task, TaskStatus};

use crate::Commands;

pub async fn dispatch(config: CronmanConfig, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::List { system } => {
            let tasks = if system {
                cronman_system::detect(&config.system).tasks()?
            } else {
                open_store(&config)?.tasks()?
            };
            print_tasks(&tasks);
        }
        Commands::Add { schedule, command } => {
            let schedule = parse_schedule(&schedule)?;
            let store = open_store(&config)?;
            store.append(&serialize_line(&schedule, &command))?;
            println!("Task added.");
        }
        Commands::Update {
            index,
            schedule,
            command,
        } => {
            let schedule = parse_schedule(&schedule)?;
            let store = open_store(&config)?;
            store.replace_at(index, &serialize_line(&schedule, &command))?;
            println!("Task {index} updated.");
        }
        Commands::Remove { index } => {
            open_store(&config)?.remove_at(index)?;
            println!("Task {index} removed.");
        }
        Commands::Run { command } => {
            let mut executor = Executor::new(&config.table.execution_log);
            if let Some(secs) = config.exec.timeout_secs {
                executor = executor.with_timeout(Duration::from_secs(secs));
            }
            let result = executor.run(&command).await?;
            if !result.output.is_empty() {
                print!("{}", result.output);
            }
            if !result.error.is_empty() {
                eprint!("{}", result.error);
            }
            if result.success {
                println!("Executed in {}s", result.duration);
            } else {
                println!(
                    "Failed with exit code {} after {}s",
                    result.exit_code, result.duration
                );
            }
        }
        Commands::Export => {
            print!("{}", open_store(&config)?.read_all()?);
        }
        Commands::Import { file } => {
            let content = read_input(&file)?;
            open_store(&config)?.replace_all(&content)?;
            println!("Cron content imported.");
        }
        Commands::Track { file, api_key } => {
            if let Some(provided) = api_key {
                let expected = apikey::load_or_generate(&config.api.key_file)?;
                if !apikey::verify_key(&expected, &provided) {
                    bail!("Invalid API key");
                }
            }
            let payload: ExternalExecution = serde_json::from_str(&read_input(&file)?)?;
            let record =
                Executor::new(&config.table.execution_log).track_external(&payload)?;
            println!("Tracked {} (exit {})", record.task_id, record.exit_code);
        }
        Commands::Diff => {
            let store = open_store_plain(&config)?;
            let system = cronman_system::detect(&config.system);
            let tagged = Reconciler::new(&store, system.as_ref()).diff()?;
            print_tasks(&tagged);
        }
        Commands::Pull => {
            let store = open_store(&config)?;
            let system = cronman_system::detect(&config.system);
            Reconciler::new(&store, system.as_ref()).pull_from_system()?;
            println!("Adopted live table.");
        }
        Commands::Push => {
            let store = open_store_plain(&config)?;
            let system = cronman_system::detect(&config.system);
            let reconciler = Reconciler::new(&store, system.as_ref());
            if !reconciler.has_changed()? {
                println!("Live table already up to date.");
            } else {
                reconciler.push_to_system()?;
                println!("Local table pushed to live scheduler.");
            }
        }
        Commands::Stats { days } => {
            let stats = history::statistics(&config.table.execution_log, days)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::History { limit } => {
            for record in log::read_records(&config.table.execution_log, limit)? {
                println!(
                    "{} {:7} exit={:<3} {:>8.3}s  {} [{}]",
                    record.timestamp,
                    format!("{:?}", record.status).to_uppercase(),
                    record.exit_code,
                    record.duration,
                    record.command,
                    record.task_id,
                );
            }
        }
        Commands::Audit { limit } => {
            for line in open_store_plain(&config)?.recent_audit(limit)? {
                println!("{line}");
            }
        }
        Commands::Wrapper => {
            let key = apikey::load_or_generate(&config.api.key_file)?;
            print!("{}", wrapper::wrapper_script(&config.api.base_url, &key));
        }
    }
    Ok(())
}

/// Store with the live-scheduler adapter injected, so mutations push.
fn open_store(config: &CronmanConfig) -> anyhow::Result<TableStore> {
    Ok(open_store_plain(config)?.with_adapter(cronman_system::detect(&config.system)))
}

/// Store without a push adapter, for read-only and reconciler paths (the
/// reconciler drives the adapter itself).
fn open_store_plain(config: &CronmanConfig) -> anyhow::Result<TableStore> {
    Ok(TableStore::open(
        &config.table.file,
        &config.table.audit_log,
    )?)
}

/// Read a payload from a file, or from stdin when the path is `-`.
fn read_input(file: &std::path::Path) -> anyhow::Result<String> {
    if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
    }
}

fn parse_schedule(schedule: &str) -> anyhow::Result<Schedule> {
    if !validate_schedule(schedule) {
        bail!("Invalid cron schedule format: {schedule}");
    }
    let fields: Vec<&str> = schedule.split_whitespace().collect();
    Ok(Schedule::new(
        fields[0], fields[1], fields[2], fields[3], fields[4],
    ))
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    for task in tasks {
        let tag = match task.status {
            Some(TaskStatus::Known) => " [known]",
            Some(TaskStatus::Unknown) => " [unknown]",
            None => "",
        };
        println!(
            "{:>3}  {}  {}{}\n     {}",
            task.index, task.schedule, task.command, tag, task.description
        );
    }
}
