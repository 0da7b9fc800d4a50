use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context as _, Result};
use std::path::PathBuf;
use std::process;
use togo_store::{Clock, Config, Context, SystemClock, Task, TaskStore, format_date, parse_date};

#[derive(Parser)]
#[command(name = "togo-store")]
#[command(about = "Inspect and edit the togo task database")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/togo/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(short, long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a user's tasks for one day
    List {
        #[arg(short, long)]
        user: String,
        /// YYYY-MM-DD (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add a task
    Add {
        #[arg(short, long)]
        user: String,
        #[arg(long)]
        content: String,
        /// Task id (default: a new UUIDv7)
        #[arg(long)]
        id: Option<String>,
        /// YYYY-MM-DD (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Set the status of one task
    SetStatus {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        task: String,
        status: String,
    },

    /// Set the status of every task a user has on one day
    SetStatusAll {
        #[arg(short, long)]
        user: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        status: String,
    },

    /// Delete one task
    Delete {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        task: String,
    },

    /// Delete all of a user's tasks for one day
    DeleteDay {
        #[arg(short, long)]
        user: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Check a user's credentials
    Login {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        password: String,
    },

    /// Show today's task count against the user's quota
    Quota {
        #[arg(short, long)]
        user: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }

    let store = TaskStore::open_with(&config)
        .with_context(|| format!("Failed to open {}", config.database.display()))?;

    let ctx = match config.statement_timeout() {
        Some(timeout) => Context::background().with_timeout(timeout),
        None => Context::background(),
    };

    let today = || format_date(SystemClock.today());

    match cli.command {
        Commands::List { user, date, json } => {
            let date = date.map(format_date).unwrap_or_else(today);
            let tasks = store.retrieve_tasks(&ctx, &user, &date)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks for {} on {}", user, date);
            } else {
                for task in tasks {
                    let status = task.status.as_deref().unwrap_or("-");
                    println!("{}  {:<10}  {}", task.id.dimmed(), status.yellow(), task.content);
                }
            }
        }
        Commands::Add { user, content, id, date } => {
            let id = id.unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
            let date = date.map(format_date).unwrap_or_else(today);
            let task = Task::new(id, content, user, date);

            store.add_task(&ctx, &task)?;
            println!("{} {}", "Added".green(), task.id);
        }
        Commands::SetStatus { user, task, status } => {
            store.update_status_task(&ctx, &user, &task, &status)?;
            println!("{} {} -> {}", "Updated".green(), task, status);
        }
        Commands::SetStatusAll { user, date, status } => {
            let date = date.map(format_date).unwrap_or_else(today);
            store.update_all_status_tasks(&ctx, &user, &date, &status)?;
            println!("{} tasks of {} on {} -> {}", "Updated".green(), user, date, status);
        }
        Commands::Delete { user, task } => {
            store.delete_task(&ctx, &user, &task)?;
            println!("{} {}", "Deleted".red(), task);
        }
        Commands::DeleteDay { user, date } => {
            let date = date.map(format_date).unwrap_or_else(today);
            store.delete_tasks(&ctx, &user, &date)?;
            println!("{} tasks of {} on {}", "Deleted".red(), user, date);
        }
        Commands::Login { user, password } => {
            if store.validate_user(&ctx, &user, &password) {
                println!("{}", "valid".green());
            } else {
                println!("{}", "invalid".red());
                process::exit(1);
            }
        }
        Commands::Quota { user } => {
            let max = store.get_user_max_task(&ctx, &user)?;
            let used = store.get_user_today_task(&ctx, &user)?;
            let summary = format!("{}/{}", used, max);
            if used >= max {
                println!("{} {}", summary.red(), "(quota reached)".dimmed());
            } else {
                println!("{}", summary.green());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_flag_is_normalized() {
        let cli = Cli::try_parse_from([
            "togo-store", "add", "--user", "u1", "--content", "x", "--date", "2024-1-5",
        ])
        .unwrap();

        match cli.command {
            Commands::Add { date, .. } => assert_eq!(date.map(format_date).as_deref(), Some("2024-01-05")),
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn test_date_flag_rejects_other_formats() {
        let result = Cli::try_parse_from(["togo-store", "list", "--user", "u1", "--date", "15/01/2024"]);
        assert!(result.is_err());
    }
}
