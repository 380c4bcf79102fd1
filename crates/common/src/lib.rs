//! Common utilities for usb-lock-power
//!
//! This crate provides functionality shared by the library and the binary:
//! the error type, logging setup, and the USB device selector type.

pub mod error;
pub mod logging;
pub mod usb_types;

pub use error::{Error, Result};
pub use logging::setup_logging;
pub use usb_types::VidPid;
