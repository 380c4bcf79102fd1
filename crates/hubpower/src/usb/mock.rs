//! In-memory USB bus for tests.
//!
//! Models a tree of devices by port path and records every port power
//! request, so a power cycle can be asserted without hardware. A root hub
//! (`1d6b:0002`, empty port path) is always present unless a device is added
//! at `[]` explicitly, so a device on a root port such as `[2]` resolves to it.
//!
//! # Example
//!
//! ```
//! use common::VidPid;
//! use hubpower::usb::mock::{MockBus, Toggle};
//! use hubpower::usb::{Location, UsbBus};
//!
//! let bus = MockBus::new()
//!     .with_device(0x2109, 0x0813, &[2, 1])
//!     .with_device(0x04d9, 0x0355, &[2, 1, 3]);
//!
//! let Location::Attached(found) = bus.locate(VidPid::new(0x04d9, 0x0355)).unwrap() else {
//!     panic!("keyboard not found");
//! };
//! bus.set_port_powered(&found.hub, found.port_number, false).unwrap();
//!
//! assert_eq!(bus.toggles(), vec![Toggle::new(0x2109, 0x0813, &[2, 1], 3, false)]);
//! ```

use super::{Attachment, FoundHub, Location, UsbBus};
use common::{Error, Result, VidPid};
use std::cell::RefCell;
use tracing::trace;

/// Vendor of the implicit root hub (Linux Foundation)
pub const ROOT_HUB_VENDOR: u16 = 0x1d6b;
/// Product of the implicit root hub (2.0 root hub)
pub const ROOT_HUB_PRODUCT: u16 = 0x0002;

/// A device in the mock topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Full port path; the last element is the port on the parent
    pub port_numbers: Vec<u8>,
}

/// Hub handle handed out by [`MockBus`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockHub {
    pub vendor_id: u16,
    pub product_id: u16,
    pub port_numbers: Vec<u8>,
}

/// Recorded port power request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    pub hub_vendor: u16,
    pub hub_product: u16,
    pub hub_port_numbers: Vec<u8>,
    pub port_number: u8,
    pub powered: bool,
}

impl Toggle {
    pub fn new(
        hub_vendor: u16,
        hub_product: u16,
        hub_port_numbers: &[u8],
        port_number: u8,
        powered: bool,
    ) -> Self {
        Self {
            hub_vendor,
            hub_product,
            hub_port_numbers: hub_port_numbers.to_vec(),
            port_number,
            powered,
        }
    }
}

/// In-memory [`UsbBus`]
#[derive(Debug, Default)]
pub struct MockBus {
    devices: Vec<MockDevice>,
    /// Devices whose parent cannot be resolved
    orphans: Vec<VidPid>,
    /// Port whose power request fails, as (hub port path, port)
    failing_port: Option<(Vec<u8>, u8)>,
    toggles: RefCell<Vec<Toggle>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device at `port_numbers`. Its parent is whatever device sits at
    /// the path minus the last element.
    pub fn with_device(mut self, vendor_id: u16, product_id: u16, port_numbers: &[u8]) -> Self {
        self.devices.push(MockDevice {
            vendor_id,
            product_id,
            port_numbers: port_numbers.to_vec(),
        });
        self
    }

    /// Add a device the stack reports without a parent hub
    pub fn with_orphan(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.orphans.push(VidPid::new(vendor_id, product_id));
        self
    }

    /// Make power requests to `port_number` on the hub at `hub_port_numbers` fail
    pub fn with_failing_port(mut self, hub_port_numbers: &[u8], port_number: u8) -> Self {
        self.failing_port = Some((hub_port_numbers.to_vec(), port_number));
        self
    }

    /// Remove every device at or below `port_numbers`
    pub fn unplug(&mut self, port_numbers: &[u8]) {
        self.devices.retain(|d| !d.port_numbers.starts_with(port_numbers));
    }

    /// All port power requests issued so far
    pub fn toggles(&self) -> Vec<Toggle> {
        self.toggles.borrow().clone()
    }

    pub fn clear_toggles(&self) {
        self.toggles.borrow_mut().clear();
    }

    /// Every device on the bus, the implicit root hub first
    fn all_devices(&self) -> Vec<MockDevice> {
        let mut all = Vec::with_capacity(self.devices.len() + 1);
        if !self.devices.iter().any(|d| d.port_numbers.is_empty()) {
            all.push(MockDevice {
                vendor_id: ROOT_HUB_VENDOR,
                product_id: ROOT_HUB_PRODUCT,
                port_numbers: Vec::new(),
            });
        }
        all.extend(self.devices.iter().cloned());
        all
    }

    fn device_at(&self, port_numbers: &[u8]) -> Option<MockDevice> {
        self.all_devices()
            .into_iter()
            .find(|d| d.port_numbers == port_numbers)
    }
}

impl UsbBus for MockBus {
    type Hub = MockHub;

    fn locate(&self, target: VidPid) -> Result<Location<Self::Hub>> {
        if self.orphans.contains(&target) {
            return Ok(Location::NoParentHub);
        }

        let Some(device) = self
            .all_devices()
            .into_iter()
            .find(|d| target.matches(d.vendor_id, d.product_id))
        else {
            return Ok(Location::NotFound);
        };

        let Some((&port_number, parent_path)) = device.port_numbers.split_last() else {
            return Ok(Location::NoParentHub);
        };
        let Some(parent) = self.device_at(parent_path) else {
            return Ok(Location::NoParentHub);
        };

        Ok(Location::Attached(Attachment {
            hub: MockHub {
                vendor_id: parent.vendor_id,
                product_id: parent.product_id,
                port_numbers: parent.port_numbers.clone(),
            },
            hub_vendor: parent.vendor_id,
            hub_product: parent.product_id,
            hub_port_numbers: parent.port_numbers,
            port_number,
        }))
    }

    fn find_hubs(&self, vendor_id: u16, product_id: u16) -> Result<Vec<FoundHub<Self::Hub>>> {
        Ok(self
            .all_devices()
            .into_iter()
            .filter(|d| d.vendor_id == vendor_id && d.product_id == product_id)
            .map(|d| FoundHub {
                hub: MockHub {
                    vendor_id: d.vendor_id,
                    product_id: d.product_id,
                    port_numbers: d.port_numbers.clone(),
                },
                port_numbers: d.port_numbers,
            })
            .collect())
    }

    fn set_port_powered(&self, hub: &Self::Hub, port_number: u8, powered: bool) -> Result<()> {
        if let Some((path, port)) = &self.failing_port
            && *path == hub.port_numbers
            && *port == port_number
        {
            return Err(Error::DeviceIo {
                hub: format!("{:04x}:{:04x}", hub.vendor_id, hub.product_id),
                port: port_number,
                source: rusb::Error::Pipe,
            });
        }

        trace!(?hub, port_number, powered, "mock port power");
        self.toggles.borrow_mut().push(Toggle {
            hub_vendor: hub.vendor_id,
            hub_product: hub.product_id,
            hub_port_numbers: hub.port_numbers.clone(),
            port_number,
            powered,
        });
        Ok(())
    }
}
