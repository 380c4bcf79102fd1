//! Power record type

use serde::{Deserialize, Serialize};

/// One downstream port of one hub that was powered down.
///
/// The hub is identified by vendor/product plus its port path from the root
/// hub, so the record stays valid when the bus address changes across
/// reboots or re-enumeration.
///
/// Field order matches the on-disk key order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PowerRecord {
    /// Port numbers from the root hub down to the hub itself
    pub hub_port_numbers: Vec<u8>,
    pub hub_vendor: u16,
    pub hub_product: u16,
    /// Port on the hub the device hangs off
    pub port_number: u8,
}

impl PowerRecord {
    pub fn new(
        hub_vendor: u16,
        hub_product: u16,
        hub_port_numbers: Vec<u8>,
        port_number: u8,
    ) -> Self {
        Self {
            hub_port_numbers,
            hub_vendor,
            hub_product,
            port_number,
        }
    }

    /// Whether this record refers to the given hub
    pub fn matches_hub(&self, vendor: u16, product: u16, port_path: &[u8]) -> bool {
        self.hub_vendor == vendor
            && self.hub_product == product
            && self.hub_port_numbers == port_path
    }
}

impl std::fmt::Display for PowerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = self
            .hub_port_numbers
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(
            f,
            "hub {:04x}:{:04x} at [{}] port {}",
            self.hub_vendor, self.hub_product, path, self.port_number
        )
    }
}

/// Append `incoming` records to `existing`, skipping any already present.
///
/// Returns the number of records actually appended. Order of `existing` is
/// preserved and new records keep their relative order.
pub fn merge_records(
    existing: &mut Vec<PowerRecord>,
    incoming: impl IntoIterator<Item = PowerRecord>,
) -> usize {
    let mut added = 0;
    for record in incoming {
        if !existing.contains(&record) {
            existing.push(record);
            added += 1;
        }
    }
    added
}
