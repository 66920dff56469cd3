use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedly_notifier::app::AppContext;
use feedly_notifier::cli::{commands, ActionCommand, Cli, Commands, DaemonAction};
use feedly_notifier::daemon::{self, Daemon};

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feedly_notifier=info"));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .init();
        }
    }
    Ok(())
}

async fn run_daemon_action(
    action: DaemonAction,
    config: Option<PathBuf>,
    state: Option<PathBuf>,
) -> anyhow::Result<()> {
    match action {
        DaemonAction::Start { .. } => {
            let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
            let ctx = Arc::new(AppContext::from_paths(config, state, ticks_tx)?);
            Daemon::new(ctx, ticks_rx).run().await?;
        }
        DaemonAction::Stop => {
            daemon::stop_daemon()?;
            println!("Daemon stopped");
        }
        DaemonAction::Status => {
            println!("{}", daemon::daemon_status());
        }
        DaemonAction::Reload => {
            daemon::reload_daemon()?;
            println!("Reload requested");
        }
    }
    Ok(())
}

async fn run_action(
    action: ActionCommand,
    config: Option<PathBuf>,
    state: Option<PathBuf>,
) -> anyhow::Result<()> {
    // One-shot commands don't run the scheduler, ticks are discarded.
    let (ticks_tx, _ticks_rx) = mpsc::unbounded_channel();
    let ctx = AppContext::from_paths(config, state, ticks_tx)?;
    ctx.configure_client().await;

    match action {
        ActionCommand::Feeds { force } => commands::list_feeds(&ctx, force).await?,
        ActionCommand::Saved { force } => commands::list_saved(&ctx, force).await?,
        ActionCommand::Counter => commands::show_counter(&ctx).await?,
        ActionCommand::MarkRead { ids } => commands::mark_read(&ctx, &ids).await?,
        ActionCommand::Save { id } => commands::toggle_saved(&ctx, &id, true).await?,
        ActionCommand::Unsave { id } => commands::toggle_saved(&ctx, &id, false).await?,
        ActionCommand::Open { id } => commands::open_entry(&ctx, &id).await?,
        ActionCommand::Icon => commands::icon(&ctx).await?,
        ActionCommand::RefreshToken => commands::refresh_token(&ctx).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Daemon {
            action: DaemonAction::Start { log },
        } => log.clone(),
        _ => None,
    };
    init_tracing(log_file.as_deref())?;

    match cli.command {
        Commands::Daemon { action } => run_daemon_action(action, cli.config, cli.state).await,
        Commands::Action(action) => run_action(action, cli.config, cli.state).await,
    }
}
