//! `pipebridge` Daemon
//!
//! Bridges a single long-running stdio subprocess to one WebSocket peer at
//! a time. The subprocess is spawned once and owned for the daemon's whole
//! lifetime; its exit code becomes the daemon's exit code.

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use pipebridge_core::BridgeConfig;
use pipebridge_daemon::relay::{BridgeEngine, BridgeEvent};
use pipebridge_daemon::server;
use pipebridge_daemon::subprocess::{ChildHandle, SpawnConfig};

#[derive(Parser, Debug)]
#[command(name = "pipebridge-daemon")]
#[command(version, about = "pipebridge daemon - stdio subprocess to WebSocket bridge")]
struct Args {
    /// Listening host for the bridge endpoint
    #[arg(long, default_value = pipebridge_core::config::DEFAULT_HOST, env = "PIPEBRIDGE_HOST")]
    host: String,

    /// Listening port for the bridge endpoint
    #[arg(long, default_value_t = pipebridge_core::config::DEFAULT_PORT, env = "PIPEBRIDGE_PORT")]
    port: u16,

    /// Enable debug-level payload logging
    #[arg(long, env = "PIPEBRIDGE_DEBUG")]
    debug: bool,

    /// Log level filter for the daemon (e.g. "info", "debug", "warn").
    #[arg(long, default_value = "info", env = "PIPEBRIDGE_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "PIPEBRIDGE_LOG_JSON")]
    log_json: bool,

    /// Seconds between liveness probes to the connected peer.
    #[arg(
        long,
        default_value_t = pipebridge_core::config::DEFAULT_PROBE_INTERVAL_SECS,
        env = "PIPEBRIDGE_PROBE_INTERVAL"
    )]
    probe_interval: u64,

    /// Seconds to wait for graceful subprocess shutdown before SIGKILL.
    #[arg(
        long,
        default_value_t = pipebridge_core::config::DEFAULT_TERMINATE_TIMEOUT_SECS,
        env = "PIPEBRIDGE_TERMINATE_TIMEOUT"
    )]
    terminate_timeout: u64,

    /// Program the bridged subprocess runs.
    #[arg(required = true)]
    command: String,

    /// Arguments passed to the bridged subprocess.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command_args: Vec<String>,
}

impl Args {
    fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            host: self.host.clone(),
            port: self.port,
            debug: self.debug,
            probe_interval_secs: self.probe_interval,
            terminate_timeout_secs: self.terminate_timeout,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.bridge_config();

    let log_filter = if config.debug {
        "pipebridge_core=debug,pipebridge_daemon=debug".to_string()
    } else {
        format!("pipebridge_daemon={}", args.log_level)
    };
    pipebridge_core::tracing_init::init_tracing(&log_filter, args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.bind_addr(),
        command = %args.command,
        "Starting pipebridge-daemon"
    );

    // Spawn the bridged subprocess; a spawn failure is fatal with exit 1.
    let (child, child_events) = match ChildHandle::spawn(SpawnConfig {
        program: args.command.clone(),
        args: args.command_args.clone(),
        terminate_timeout: config.terminate_timeout(),
    }) {
        Ok(spawned) => spawned,
        Err(e) => {
            error!(error = %e, "Subprocess spawn failed");
            std::process::exit(1);
        }
    };
    info!(pid = ?child.pid(), "Subprocess running");

    let (event_tx, event_rx) = mpsc::channel::<BridgeEvent>(256);

    // Listening endpoint.
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "Bridge endpoint ready");
    let server_task = tokio::spawn(server::run(listener, event_tx.clone()));

    // Termination signals request a graceful shutdown with exit code 0.
    spawn_signal_watcher(event_tx);

    // Notify systemd that the bridge is ready to serve (unix only).
    #[cfg(unix)]
    if let Err(e) = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]) {
        warn!(error = %e, "sd_notify failed");
    }

    let engine = BridgeEngine::new(child.sink(), config.probe_interval());
    let exit_code = engine.run(event_rx, child_events).await;

    // Close the listening endpoint, then terminate the child if it is
    // still running, then exit with the propagated code.
    server_task.abort();
    child.terminate().await;

    info!(exit_code, "Bridge stopped");
    std::process::exit(exit_code);
}


/// Forward SIGINT/SIGTERM to the event loop as a shutdown request.
fn spawn_signal_watcher(event_tx: mpsc::Sender<BridgeEvent>) {
    tokio::spawn(async move {
        #[cfg(unix)]
        let sigterm_future = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let sigterm_future = std::future::pending::<()>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C shutdown signal");
            }
            () = sigterm_future => {
                info!("Received SIGTERM shutdown signal");
            }
        }
        event_tx.send(BridgeEvent::ShutdownRequested).await.ok();
    });
}
