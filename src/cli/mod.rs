pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedly-notifier")]
#[command(about = "Unread counter and new entry notifications for Feedly", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/feedly-notifier/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// State database (default: <data dir>/feedly-notifier/state.db)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Background daemon polling Feedly
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
    #[command(flatten)]
    Action(ActionCommand),
}

/// Commands running once against the Feedly API.
#[derive(Subcommand)]
pub enum ActionCommand {
    /// List unread entries
    Feeds {
        /// Refetch instead of using cached entries
        #[arg(short, long)]
        force: bool,
    },
    /// List entries saved for later
    Saved {
        #[arg(short, long)]
        force: bool,
    },
    /// Refresh the unread counter
    Counter,
    /// Mark entries as read
    MarkRead {
        /// Entry ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Save an entry for later
    Save { id: String },
    /// Remove an entry from the saved ones
    Unsave { id: String },
    /// Open an unread entry in the browser
    Open { id: String },
    /// Act as if the application icon was clicked
    Icon,
    /// Trade the refresh token for a new access token
    RefreshToken,
}

#[derive(Subcommand)]
pub enum DaemonAction {
    /// Start the background daemon
    Start {
        /// Log file path (default: stdout)
        #[arg(short, long)]
        log: Option<PathBuf>,
    },
    /// Stop the running daemon
    Stop,
    /// Check daemon status
    Status,
    /// Make the running daemon re-read its configuration
    Reload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mark_read() {
        let cli = Cli::parse_from(["feedly-notifier", "mark-read", "a", "b"]);
        match cli.command {
            Commands::Action(ActionCommand::MarkRead { ids }) => assert_eq!(ids, vec!["a", "b"]),
            _ => panic!("expected mark-read"),
        }
    }

    #[test]
    fn test_global_paths_after_subcommand() {
        let cli = Cli::parse_from([
            "feedly-notifier",
            "feeds",
            "--force",
            "--config",
            "/tmp/c.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(
            cli.command,
            Commands::Action(ActionCommand::Feeds { force: true })
        ));
    }

    #[test]
    fn test_mark_read_requires_ids() {
        assert!(Cli::try_parse_from(["feedly-notifier", "mark-read"]).is_err());
    }

    #[test]
    fn test_daemon_and_actions_share_top_level() {
        let cli = Cli::parse_from(["feedly-notifier", "daemon", "start", "--log", "/tmp/d.log"]);
        assert!(matches!(
            cli.command,
            Commands::Daemon {
                action: DaemonAction::Start { log: Some(_) }
            }
        ));

        let cli = Cli::parse_from(["feedly-notifier", "refresh-token"]);
        assert!(matches!(
            cli.command,
            Commands::Action(ActionCommand::RefreshToken)
        ));
    }
}
