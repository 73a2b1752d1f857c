//! Visit Panel CLI - Terminal front end for the dashboard and admin panel.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and log in (the session is kept on disk)
//! vp-cli register alice -p secret
//! vp-cli login alice -p secret
//!
//! # Price, start and follow a task
//! vp-cli coins 2500
//! vp-cli start 123456789 2500
//! vp-cli watch
//!
//! # Admin panel (password from VP_ADMIN_PASS)
//! vp-cli admin -u root users
//! vp-cli admin -u root approve 7
//! ```
//!
//! # Commands
//!
//! - `register`, `login`, `logout` - Account and session
//! - `coins`, `start`, `stop`, `tasks`, `task`, `history`, `watch` - Tasks
//! - `admin` - Users, coin credits, redeems, audit trail, exports

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
use visit_panel_client::{ClientConfig, LogFormat};
use visit_panel_core::{ExportTarget, RedeemId, TaskId, UserId};

mod commands;
mod view;

#[derive(Parser)]
#[command(name = "vp-cli")]
#[command(author, version, about = "Visit Panel terminal client")]
struct Cli {
    /// Backend origin, overriding `VP_BASE_URL`
    #[arg(long, global = true)]
    base_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    User(UserCommand),
    /// Admin panel
    Admin {
        /// Admin username
        #[arg(short, long, env = "VP_ADMIN_USER")]
        username: String,

        /// Admin password
        #[arg(short, long, env = "VP_ADMIN_PASS", hide_env_values = true)]
        password: String,

        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Create an account
    Register {
        username: String,
        #[arg(short, long, env = "VP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and keep the session
    Login {
        username: String,
        #[arg(short, long, env = "VP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the coins a task of this many visits costs
    Coins { visits: i64 },
    /// Start a visit task
    Start { uid: String, visits: i64 },
    /// Request a running task to stop
    Stop { id: TaskId },
    /// List your tasks
    Tasks,
    /// Show one task with live progress
    Task { id: TaskId },
    /// Show your audit trail
    History,
    /// Keep the task list refreshed until interrupted
    Watch,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Open the panel and show users and redeems
    Login,
    /// List users
    Users,
    /// Credit coins to a user
    AddCoins { user_id: UserId, coins: String },
    /// Ask for an amount, then credit it to a user
    PromptAdd { user_id: UserId },
    /// List redeem requests
    Redeems,
    /// Approve a redeem request
    Approve { id: RedeemId },
    /// Show the global audit trail
    History,
    /// Download a raw data file (users, tasks, redeems, audit, settings)
    Export {
        target: ExportTarget,

        /// Output file (default: `<target>.json`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "visit_panel_client=info,vp_cli=info".into());

    // stdout carries view output only
    let is_json = format == LogFormat::Json;
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Text);
            tracing::error!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    init_tracing(config.log_format);

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut config: ClientConfig) -> Result<(), commands::CliError> {
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command {
        Commands::Admin {
            username,
            password,
            action,
        } => {
            let ctx = commands::admin::AdminContext::new(&config, username, password)?;
            match action {
                AdminAction::Login => ctx.login().await?,
                AdminAction::Users => ctx.users().await?,
                AdminAction::AddCoins { user_id, coins } => ctx.add_coins(user_id, &coins).await?,
                AdminAction::PromptAdd { user_id } => ctx.prompt_add(user_id).await?,
                AdminAction::Redeems => ctx.redeems().await?,
                AdminAction::Approve { id } => ctx.approve(id).await?,
                AdminAction::History => ctx.history().await?,
                AdminAction::Export { target, output } => ctx.export(target, output).await?,
            }
        }
        Commands::User(command) => {
            let ctx = commands::user::UserContext::new(&config)?;
            match command {
                UserCommand::Register { username, password } => {
                    ctx.register(username, password).await?;
                }
                UserCommand::Login { username, password } => ctx.login(username, password).await?,
                UserCommand::Logout => ctx.logout()?,
                UserCommand::Coins { visits } => ctx.coins(visits).await?,
                UserCommand::Start { uid, visits } => ctx.start(&uid, visits).await?,
                UserCommand::Stop { id } => ctx.stop(id).await?,
                UserCommand::Tasks => ctx.tasks().await?,
                UserCommand::Task { id } => ctx.task(id).await?,
                UserCommand::History => ctx.history().await?,
                UserCommand::Watch => ctx.watch().await?,
            }
        }
    }
    Ok(())
}
