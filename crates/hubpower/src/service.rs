//! Systemd service integration
//!
//! The daemon is meant to run under a supervisor that restarts it after a
//! failed power cycle. When started by systemd with `Type=notify`, it reports
//! readiness and shutdown over the sd-notify socket.

use anyhow::{Context, Result};
use std::env;
use std::os::unix::net::UnixDatagram;
use tracing::debug;

/// Send a raw sd-notify message, if running under systemd
fn notify(message: &str) -> Result<()> {
    let Ok(socket_path) = env::var("NOTIFY_SOCKET") else {
        debug!("NOTIFY_SOCKET not set, skipping systemd notification");
        return Ok(());
    };

    let socket = UnixDatagram::unbound().context("Failed to create Unix socket")?;
    socket
        .send_to(message.as_bytes(), &socket_path)
        .with_context(|| format!("Failed to send '{}' notification to systemd", message))?;
    debug!("Notified systemd: {}", message);
    Ok(())
}

/// Notify systemd that the daemon is waiting for events
pub fn notify_ready() -> Result<()> {
    notify("READY=1")
}

/// Notify systemd that the daemon is shutting down
pub fn notify_stopping() -> Result<()> {
    notify("STOPPING=1")
}

/// Send a status line, visible in `systemctl status`
pub fn notify_status(status: &str) -> Result<()> {
    notify(&format!("STATUS={}", status))
}

/// Check if running under systemd
pub fn is_systemd() -> bool {
    env::var("NOTIFY_SOCKET").is_ok()
}
