//! Background daemon keeping the counter and the entry cache up to date.
//!
//! The daemon owns the receiving end of the scheduler ticks and runs each
//! refresh as its own task. `SIGHUP` re-reads the configuration, `SIGTERM`
//! and `SIGINT` shut it down.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::{AppContext, NotifierError, Result};
use crate::scheduler::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Re-read the options store
    Reload,
    Shutdown,
}

pub struct Daemon {
    ctx: Arc<AppContext>,
    ticks: mpsc::UnboundedReceiver<Tick>,
    control_tx: mpsc::UnboundedSender<Control>,
    control_rx: mpsc::UnboundedReceiver<Control>,
}

impl Daemon {
    /// `ticks` must be the receiver paired with the context's scheduler.
    pub fn new(ctx: Arc<AppContext>, ticks: mpsc::UnboundedReceiver<Tick>) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        Self {
            ctx,
            ticks,
            control_tx,
            control_rx,
        }
    }

    pub fn control(&self) -> mpsc::UnboundedSender<Control> {
        self.control_tx.clone()
    }

    /// Get the PID file path
    pub fn pid_file_path() -> Option<PathBuf> {
        dirs::runtime_dir()
            .or_else(dirs::cache_dir)
            .map(|d| d.join("feedly-notifier").join("daemon.pid"))
    }

    fn read_pid() -> Option<u32> {
        let pid_path = Self::pid_file_path()?;
        fs::read_to_string(pid_path).ok()?.trim().parse().ok()
    }

    /// Check if another daemon is already running
    pub fn is_running() -> bool {
        Self::read_pid().is_some_and(process_exists)
    }

    fn write_pid_file(&self) -> std::io::Result<()> {
        if let Some(pid_path) = Self::pid_file_path() {
            if let Some(parent) = pid_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(&pid_path)?;
            writeln!(file, "{}", std::process::id())?;
        }
        Ok(())
    }

    fn remove_pid_file() {
        if let Some(pid_path) = Self::pid_file_path() {
            let _ = fs::remove_file(pid_path);
        }
    }

    /// Run the daemon until a shutdown signal arrives.
    pub async fn run(self) -> Result<()> {
        if Self::is_running() {
            return Err(NotifierError::Other(
                "Another daemon instance is already running".to_string(),
            ));
        }

        self.write_pid_file()
            .map_err(|e| NotifierError::Other(format!("Failed to write PID file: {}", e)))?;

        if let Err(e) = listen_for_signals(self.control()) {
            Self::remove_pid_file();
            return Err(e.into());
        }

        info!(pid = std::process::id(), "feedly-notifier daemon started");

        self.serve().await;
        Self::remove_pid_file();
        Ok(())
    }

    /// Initialize the context and process ticks and control messages.
    pub async fn serve(mut self) {
        self.ctx.initialize().await;

        loop {
            tokio::select! {
                Some(tick) = self.ticks.recv() => self.spawn_refresh(tick),
                Some(control) = self.control_rx.recv() => match control {
                    Control::Reload => self.spawn_reload(),
                    Control::Shutdown => break,
                },
                else => break,
            }
        }

        info!("Daemon shutting down...");
        self.ctx.stop_scheduler();
    }

    fn spawn_refresh(&self, tick: Tick) {
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            let result = match tick {
                Tick::Counter => ctx.update_counter().await.map(|_| ()),
                Tick::Feeds => ctx.update_feeds(false).await.map(|_| ()),
            };
            if let Err(e) = result {
                warn!(?tick, error = %e, "Scheduled refresh failed");
            }
        });
    }

    fn spawn_reload(&self) {
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            match ctx.reload_options().await {
                Ok(restarted) => info!(restarted, "Configuration reloaded"),
                Err(e) => warn!(error = %e, "Failed to reload configuration"),
            }
        });
    }
}

#[cfg(unix)]
fn listen_for_signals(control: mpsc::UnboundedSender<Control>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                _ = sigterm.recv() => Control::Shutdown,
                _ = sigint.recv() => Control::Shutdown,
                _ = sighup.recv() => Control::Reload,
            };
            if control.send(message).is_err() || message == Control::Shutdown {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(windows)]
fn listen_for_signals(control: mpsc::UnboundedSender<Control>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = control.send(Control::Shutdown);
        }
    });
    Ok(())
}

#[cfg(unix)]
fn process_exists(pid: u32) -> bool {
    use std::process::Command;
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(windows)]
fn process_exists(pid: u32) -> bool {
    use std::process::Command;
    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid)])
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).contains(&pid.to_string()))
        .unwrap_or(false)
}

fn running_pid() -> Result<u32> {
    Daemon::read_pid()
        .ok_or_else(|| NotifierError::Other("No daemon is running (PID file not found)".into()))
}

/// Stop a running daemon by reading PID file and sending signal
pub fn stop_daemon() -> Result<()> {
    let pid = running_pid()?;

    #[cfg(unix)]
    let status = std::process::Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status()?;

    #[cfg(windows)]
    let status = std::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .status()?;

    if !status.success() {
        return Err(NotifierError::Other(format!(
            "Failed to stop daemon (PID {})",
            pid
        )));
    }

    Daemon::remove_pid_file();
    Ok(())
}

/// Ask a running daemon to re-read its configuration
#[cfg(unix)]
pub fn reload_daemon() -> Result<()> {
    let pid = running_pid()?;
    let status = std::process::Command::new("kill")
        .args(["-HUP", &pid.to_string()])
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(NotifierError::Other(format!(
            "Failed to signal daemon (PID {})",
            pid
        )))
    }
}

#[cfg(windows)]
pub fn reload_daemon() -> Result<()> {
    Err(NotifierError::Other(
        "Reloading is not supported on this platform, restart the daemon instead".into(),
    ))
}

/// Check daemon status
pub fn daemon_status() -> String {
    match Daemon::read_pid() {
        Some(pid) if process_exists(pid) => format!("Daemon is running (PID: {})", pid),
        Some(_) => "Daemon is not running (stale PID file)".to_string(),
        None => "Daemon is not running".to_string(),
    }
}
