//! usb-lock-power
//!
//! Powers down the hub ports of selected USB peripherals when the screen
//! locks and powers them back up on unlock. The ports to restore are kept in
//! a save file keyed on hub topology, so a restore survives process restarts.

pub mod config;
pub mod events;
pub mod power;
pub mod service;
pub mod usb;

pub use config::PowerConfig;
pub use events::{EventSource, LineEventSource, LockEvent, LockHandler, WatcherSource, run_bridge};
pub use power::{PowerController, PowerDownReport, PowerUpReport};
pub use usb::{Attachment, FoundHub, Location, RusbBus, UsbBus};
