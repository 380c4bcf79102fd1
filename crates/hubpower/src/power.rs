//! Power cycle
//!
//! `power_down` records which hub ports the configured devices sit on and
//! then switches those ports off. `power_up` switches the recorded ports
//! back on and forgets them. The save file is always written before any port
//! is touched, so a crash mid-cycle never loses restore information.

use crate::events::LockHandler;
use crate::usb::{Location, UsbBus};
use common::{Result, VidPid};
use record::{SaveFile, merge_records};
use tracing::{debug, info, warn};

/// Outcome of a power-down cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PowerDownReport {
    /// Records in the save file after the cycle
    pub records_saved: usize,
    /// Records appended by this cycle
    pub records_added: usize,
    pub ports_powered_off: usize,
    /// Targets not attached or without a resolvable hub
    pub skipped: Vec<VidPid>,
}

/// Outcome of a power-up cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PowerUpReport {
    pub ports_powered_on: usize,
    /// Records whose hub is no longer attached
    pub records_skipped: usize,
    /// False when there was no save file
    pub restore_pending: bool,
}

/// Runs power cycles for a fixed set of target devices
pub struct PowerController<B: UsbBus> {
    bus: B,
    save_file: SaveFile,
    targets: Vec<VidPid>,
}

impl<B: UsbBus> PowerController<B> {
    pub fn new(bus: B, save_file: SaveFile, targets: Vec<VidPid>) -> Self {
        Self {
            bus,
            save_file,
            targets,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn save_file(&self) -> &SaveFile {
        &self.save_file
    }

    pub fn targets(&self) -> &[VidPid] {
        &self.targets
    }

    /// Power down the hub ports of all attached target devices
    ///
    /// Records from an earlier cycle that was never restored are kept.
    /// Records already present are not appended again.
    pub fn power_down(&self) -> Result<PowerDownReport> {
        let mut records = self.save_file.load_or_empty()?;
        let mut report = PowerDownReport::default();
        let mut ports = Vec::new();

        for &target in &self.targets {
            match self.bus.locate(target)? {
                Location::NotFound => {
                    warn!("Device {} not found, skipping", target);
                    report.skipped.push(target);
                }
                Location::NoParentHub => {
                    warn!(
                        "Device {} has no parent hub (is libusb up to date?), skipping",
                        target
                    );
                    report.skipped.push(target);
                }
                Location::Attached(attachment) => {
                    let record = attachment.record();
                    debug!("Device {} is on {}", target, record);

                    report.records_added += merge_records(&mut records, [record]);
                    ports.push((attachment.hub, attachment.port_number));
                }
            }
        }

        self.save_file.save(&records)?;
        report.records_saved = records.len();

        for (hub, port_number) in &ports {
            self.bus.set_port_powered(hub, *port_number, false)?;
            report.ports_powered_off += 1;
        }

        info!(
            "Powered down {} port(s), {} record(s) pending restore",
            report.ports_powered_off, report.records_saved
        );
        Ok(report)
    }

    /// Power up every port recorded in the save file, then delete it
    ///
    /// Records whose hub is no longer attached are skipped. The save file is
    /// deleted even when records were skipped.
    pub fn power_up(&self) -> Result<PowerUpReport> {
        if !self.save_file.exists() {
            debug!("No save file at {}, nothing to restore", self.save_file.path().display());
            return Ok(PowerUpReport::default());
        }

        let records = self.save_file.load()?;
        let mut report = PowerUpReport {
            restore_pending: true,
            ..Default::default()
        };

        for record in &records {
            let hub = self
                .bus
                .find_hubs(record.hub_vendor, record.hub_product)?
                .into_iter()
                .find(|found| found.port_numbers == record.hub_port_numbers);

            match hub {
                Some(found) => {
                    self.bus.set_port_powered(&found.hub, record.port_number, true)?;
                    report.ports_powered_on += 1;
                }
                None => {
                    debug!("{} is no longer attached, skipping", record);
                    report.records_skipped += 1;
                }
            }
        }

        self.save_file.remove()?;

        info!(
            "Powered up {} port(s), {} record(s) skipped",
            report.ports_powered_on, report.records_skipped
        );
        Ok(report)
    }
}

impl<B: UsbBus> LockHandler for PowerController<B> {
    fn on_locked(&mut self) -> Result<()> {
        self.power_down().map(|_| ())
    }

    fn on_unlocked(&mut self) -> Result<()> {
        self.power_up().map(|_| ())
    }
}
