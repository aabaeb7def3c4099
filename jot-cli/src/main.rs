use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use jot_core::TaskStatus;
use jot_store::TaskPatch;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod limits;
mod llm;
mod server;
mod state;
mod tasks_cmd;

use tasks_cmd::{parse_status, Session};

#[derive(Parser, Debug)]
#[command(name = "jot", version, about = "Turn short notes into prioritized tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Bind address (default: config server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port (default: config server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Extract a task from text without saving it
    Parse {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Print the draft as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Extract a task from text and save it
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// List tasks, newest first
    List {
        /// pending | in_progress | completed
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
    },

    /// Show one task
    Show { id: i64 },

    /// Change fields of a task
    Update {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,

        /// YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        priority: Option<u8>,
    },

    /// Delete a task
    Delete { id: i64 },

    /// Recommend a priority for a stored task
    Recommend {
        id: i64,

        /// Store the recommended priority
        #[arg(long, default_value_t = false)]
        apply: bool,
    },

    /// Urgency/importance analysis of a stored task
    Analyze { id: i64 },

    /// Task counts, completion rate and priority distribution
    Stats,

    /// Export all tasks
    Export {
        /// Write CSV to this path
        #[arg(long)]
        csv: PathBuf,
    },

    /// Manage ~/.jot/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,

    /// Print the effective config (file + env overrides)
    Show,
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep command output quiet unless RUST_LOG says otherwise.
    let level = match cli.command {
        Command::Serve { .. } => "info",
        _ => "warn",
    };
    init_logging(level);

    match cli.command {
        Command::Serve { host, port } => {
            let mut cfg = config::load_config()?;
            if let Some(host) = host {
                cfg.server.host = host;
            }
            if let Some(port) = port {
                cfg.server.port = port;
            }
            server::serve(&cfg).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },

        command => {
            let cfg = config::load_config()?;
            let s = Session::open(&cfg)?;
            run_task_command(&s, command)?;
        }
    }

    Ok(())
}

fn run_task_command(s: &Session, command: Command) -> Result<()> {
    match command {
        Command::Parse { text, json } => tasks_cmd::parse(s, &text.join(" "), json),
        Command::Add { text } => tasks_cmd::add(s, &text.join(" ")),
        Command::List { status } => tasks_cmd::list(s, status),
        Command::Show { id } => tasks_cmd::show(s, id),
        Command::Update {
            id,
            title,
            description,
            status,
            due,
            priority,
        } => tasks_cmd::update(
            s,
            id,
            TaskPatch {
                title,
                description,
                status,
                due_date: due,
                priority,
            },
        ),
        Command::Delete { id } => tasks_cmd::delete(s, id),
        Command::Recommend { id, apply } => tasks_cmd::recommend(s, id, apply),
        Command::Analyze { id } => tasks_cmd::analyze_task(s, id),
        Command::Stats => tasks_cmd::stats(s),
        Command::Export { csv } => tasks_cmd::export_csv(s, &csv),
        Command::Serve { .. } | Command::Config { .. } => unreachable!("handled in main"),
    }
}
