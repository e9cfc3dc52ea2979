//! groupctl - operator console
//!
//! Inspects and changes per-group service controls in the same database the
//! bot uses. Services come from the configuration file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use groupctl_core::{
    logging, Admin, AdminCommand, CommandContext, ControlConfig, ControlError, Registry,
};

#[derive(Debug, Parser)]
#[command(name = "groupctl", version, about = "Per-group service controls")]
struct Cli {
    /// Configuration file (defaults to ~/.groupctl and ./.groupctl)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the configuration
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Enable a service for a group
    Enable {
        service: String,
        #[arg(long)]
        group: i64,
    },
    /// Disable a service for a group
    Disable {
        service: String,
        #[arg(long)]
        group: i64,
    },
    /// Print a service's help text
    Usage { service: String },
    /// List registered services
    List {
        #[arg(long)]
        json: bool,
    },
    /// Run the gating check for a group (writes the default on first contact)
    Check {
        service: String,
        #[arg(long)]
        group: i64,
    },
    /// Show the stored state for a group
    State {
        service: String,
        #[arg(long)]
        group: i64,
    },
    /// Forget the stored state for a group
    Reset {
        service: String,
        #[arg(long)]
        group: i64,
    },
    /// Run a chat command (e.g. "禁用 weather") as a group administrator
    Exec {
        #[arg(long)]
        group: i64,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ControlConfig::load(path)?,
        None => ControlConfig::load_standard(std::env::current_dir().ok().as_deref())?,
    };
    if let Some(db) = cli.db {
        config.store.path = db;
    }
    logging::init(&config.logging.filter);

    let registry = Registry::open(&config.store)?;
    registry.register_all(&config)?;
    tracing::debug!(services = registry.len(), "registry ready");

    let admin = Admin::new(&registry);
    let control = |service: &str| {
        registry
            .lookup(service)
            .ok_or_else(|| ControlError::NotFound(service.to_string()))
    };

    match cli.command {
        Command::Enable { service, group } => println!("{}", admin.enable(&service, group)),
        Command::Disable { service, group } => println!("{}", admin.disable(&service, group)),
        Command::Usage { service } => println!("{}", admin.usage(&service)),
        Command::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&registry.services())?);
            } else {
                println!("{}", admin.list_services());
            }
        }
        Command::Check { service, group } => {
            let gate = control(&service)?.check(group);
            println!("{}", gate);
        }
        Command::State { service, group } => {
            println!("{}", control(&service)?.state(group)?);
        }
        Command::Reset { service, group } => {
            let existed = control(&service)?.reset(group)?;
            println!("{}", if existed { "reset" } else { "unconfigured" });
        }
        Command::Exec { group, text } => {
            let text = text.join(" ");
            let reply = match AdminCommand::parse(&text) {
                Some(command) => admin.execute(&command, &CommandContext::group_admin(group)),
                None => format!("unknown command: {text}"),
            };
            println!("{}", reply);
        }
    }

    Ok(())
}
