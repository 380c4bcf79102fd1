//! Power record library for usb-lock-power
//!
//! This crate defines the records that describe which hub ports were powered
//! down, and the save file that persists them between the "down" and "up"
//! halves of a cycle.
//!
//! # Example
//!
//! ```
//! use record::{PowerRecord, SaveFile};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let file = SaveFile::new(dir.path().join("saved.json"));
//!
//! let records = vec![PowerRecord::new(0x2109, 0x0813, vec![2, 1], 3)];
//! file.save(&records).unwrap();
//!
//! assert_eq!(file.load().unwrap(), records);
//! file.remove().unwrap();
//! assert!(!file.exists());
//! ```

pub mod error;
pub mod store;
pub mod types;

pub use error::{RecordError, Result};
pub use store::{DEFAULT_SAVE_FILE, SaveFile};
pub use types::{PowerRecord, merge_records};
