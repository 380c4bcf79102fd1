//! Line-oriented event sources
//!
//! Platform lock watchers (a notification listener, `dbus-monitor`, a
//! shell script) print one line per event. A line yields an event when one of
//! its whitespace-separated tokens equals a configured notification name.

use super::{EventSource, LockEvent};
use common::{Error, Result};
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{info, trace, warn};

/// Notification names mapped to lock events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationNames {
    pub locked: Vec<String>,
    pub unlocked: Vec<String>,
}

impl Default for NotificationNames {
    fn default() -> Self {
        Self {
            locked: vec!["com.apple.screenIsLocked".to_string(), "locked".to_string()],
            unlocked: vec![
                "com.apple.screenIsUnlocked".to_string(),
                "unlocked".to_string(),
            ],
        }
    }
}

impl NotificationNames {
    /// Map one line of watcher output to an event
    pub fn classify(&self, line: &str) -> Option<LockEvent> {
        for token in line.split_whitespace() {
            if self.locked.iter().any(|name| name == token) {
                return Some(LockEvent::Locked);
            }
            if self.unlocked.iter().any(|name| name == token) {
                return Some(LockEvent::Unlocked);
            }
        }
        None
    }
}

/// Reads events from lines of text
pub struct LineEventSource<R> {
    lines: Lines<R>,
    names: NotificationNames,
}

impl<R: AsyncBufRead + Unpin> LineEventSource<R> {
    pub fn new(reader: R, names: NotificationNames) -> Self {
        Self {
            lines: reader.lines(),
            names,
        }
    }
}

impl LineEventSource<BufReader<Stdin>> {
    /// Events from standard input
    pub fn stdin(names: NotificationNames) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), names)
    }
}

impl<R: AsyncBufRead + Unpin> EventSource for LineEventSource<R> {
    async fn next_event(&mut self) -> Result<Option<LockEvent>> {
        while let Some(line) = self.lines.next_line().await? {
            match self.names.classify(&line) {
                Some(event) => return Ok(Some(event)),
                None => trace!("Ignoring line: {}", line),
            }
        }
        Ok(None)
    }
}

/// Events from the stdout of a watcher process
///
/// The watcher is killed when the source is dropped.
pub struct WatcherSource {
    child: Child,
    inner: LineEventSource<BufReader<ChildStdout>>,
}

impl WatcherSource {
    /// Spawn `command` (program followed by arguments)
    pub fn spawn(command: &[String], names: NotificationNames) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Config("Watcher command is empty".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::EventSource(format!("Failed to spawn watcher '{}': {}", program, e))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::EventSource("Watcher stdout not captured".to_string()))?;

        info!("Started watcher '{}' (pid {:?})", program, child.id());

        Ok(Self {
            child,
            inner: LineEventSource::new(BufReader::new(stdout), names),
        })
    }
}

impl EventSource for WatcherSource {
    async fn next_event(&mut self) -> Result<Option<LockEvent>> {
        let event = self.inner.next_event().await?;
        if event.is_none() {
            match self.child.wait().await {
                Ok(status) => warn!("Watcher exited: {}", status),
                Err(e) => warn!("Failed to reap watcher: {}", e),
            }
        }
        Ok(event)
    }
}
