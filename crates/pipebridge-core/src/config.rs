//! Bridge configuration.
//!
//! Built-in defaults plus the resolved runtime values. Environment and CLI
//! overrides are applied by the daemon's argument parser, which reads the
//! `PIPEBRIDGE_*` variables through its own env-backed flags.

use serde::{Deserialize, Serialize};

/// Default listening port for the bridge endpoint.
pub const DEFAULT_PORT: u16 = 8765;

/// Default listening host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default liveness probe interval, in seconds.
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 30;

/// Default grace period for child termination before SIGKILL, in seconds.
pub const DEFAULT_TERMINATE_TIMEOUT_SECS: u64 = 5;

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Host the listening endpoint binds to.
    pub host: String,
    /// Port the listening endpoint binds to.
    pub port: u16,
    /// Enable debug-level payload logging.
    pub debug: bool,
    /// Seconds between liveness probes to the connected peer.
    pub probe_interval_secs: u64,
    /// Seconds to wait for graceful child shutdown before SIGKILL.
    pub terminate_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            terminate_timeout_secs: DEFAULT_TERMINATE_TIMEOUT_SECS,
        }
    }
}

impl BridgeConfig {
    /// The `host:port` string the listening endpoint binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Liveness probe interval as a [`std::time::Duration`].
    pub const fn probe_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.probe_interval_secs)
    }

    /// Child termination grace period as a [`std::time::Duration`].
    pub const fn terminate_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.terminate_timeout_secs)
    }
}
