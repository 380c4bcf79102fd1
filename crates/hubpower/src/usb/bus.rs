//! libusb-backed USB bus
//!
//! Wraps a `rusb::Context`. Devices are looked up fresh on every call, so
//! bus addresses that changed since the last cycle do not matter.

use super::hub::port_power_request;
use super::{Attachment, FoundHub, Location, UsbBus};
use common::{Error, Result, VidPid};
use rusb::{Context, Device, UsbContext};
use std::time::Duration;
use tracing::{debug, warn};

/// Summary of an attached device, for listing
#[derive(Debug, Clone)]
pub struct AttachedDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus_number: u8,
    pub device_address: u8,
    pub port_numbers: Vec<u8>,
    pub is_hub: bool,
}

/// USB bus backed by libusb
pub struct RusbBus {
    context: Context,
    timeout: Duration,
}

impl RusbBus {
    /// Create a new bus with the given control transfer timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let context = Context::new()
            .map_err(|e| Error::Usb(format!("Failed to create USB context: {}", e)))?;
        Ok(Self { context, timeout })
    }

    /// List all attached devices
    pub fn list_devices(&self) -> Result<Vec<AttachedDevice>> {
        let mut attached = Vec::new();

        for device in self.devices()? {
            let desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(e) => {
                    warn!(
                        "Failed to read descriptor of bus={}, addr={}: {}",
                        device.bus_number(),
                        device.address(),
                        e
                    );
                    continue;
                }
            };

            attached.push(AttachedDevice {
                vendor_id: desc.vendor_id(),
                product_id: desc.product_id(),
                bus_number: device.bus_number(),
                device_address: device.address(),
                port_numbers: device.port_numbers().unwrap_or_default(),
                // USB device class 9 = Hub
                is_hub: desc.class_code() == 9,
            });
        }

        Ok(attached)
    }

    fn devices(&self) -> Result<Vec<Device<Context>>> {
        let list = self
            .context
            .devices()
            .map_err(|e| Error::Usb(format!("Failed to enumerate devices: {}", e)))?;
        Ok(list.iter().collect())
    }

    /// Attached devices whose descriptor matches vendor/product
    fn matching(&self, vendor_id: u16, product_id: u16) -> Result<Vec<Device<Context>>> {
        Ok(self
            .devices()?
            .into_iter()
            .filter(|device| {
                device
                    .device_descriptor()
                    .map(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
                    .unwrap_or(false)
            })
            .collect())
    }
}

impl UsbBus for RusbBus {
    type Hub = Device<Context>;

    fn locate(&self, target: VidPid) -> Result<Location<Self::Hub>> {
        let Some(device) = self
            .matching(target.vendor_id, target.product_id)?
            .into_iter()
            .next()
        else {
            return Ok(Location::NotFound);
        };

        let Some(hub) = device.get_parent() else {
            return Ok(Location::NoParentHub);
        };

        let hub_desc = hub
            .device_descriptor()
            .map_err(|e| Error::Usb(format!("Failed to read hub descriptor: {}", e)))?;
        let hub_port_numbers = hub
            .port_numbers()
            .map_err(|e| Error::Usb(format!("Failed to read hub port path: {}", e)))?;

        debug!(
            "Located {} on hub {:04x}:{:04x} (bus={}, addr={}) port {}",
            target,
            hub_desc.vendor_id(),
            hub_desc.product_id(),
            hub.bus_number(),
            hub.address(),
            device.port_number()
        );

        Ok(Location::Attached(Attachment {
            hub_vendor: hub_desc.vendor_id(),
            hub_product: hub_desc.product_id(),
            hub_port_numbers,
            port_number: device.port_number(),
            hub,
        }))
    }

    fn find_hubs(&self, vendor_id: u16, product_id: u16) -> Result<Vec<FoundHub<Self::Hub>>> {
        let mut found = Vec::new();

        for hub in self.matching(vendor_id, product_id)? {
            match hub.port_numbers() {
                Ok(port_numbers) => found.push(FoundHub { hub, port_numbers }),
                Err(e) => warn!(
                    "Failed to read port path of {:04x}:{:04x} (bus={}, addr={}): {}",
                    vendor_id,
                    product_id,
                    hub.bus_number(),
                    hub.address(),
                    e
                ),
            }
        }

        Ok(found)
    }

    fn set_port_powered(&self, hub: &Self::Hub, port_number: u8, powered: bool) -> Result<()> {
        let ids = match hub.device_descriptor() {
            Ok(d) => Some((d.vendor_id(), d.product_id())),
            Err(e) => {
                warn!(
                    "Failed to read descriptor of hub at bus={}, addr={}: {}",
                    hub.bus_number(),
                    hub.address(),
                    e
                );
                None
            }
        };
        let label = hub_label(ids, hub.bus_number(), hub.address());
        let io_error = |source| Error::DeviceIo {
            hub: label.clone(),
            port: port_number,
            source,
        };

        let handle = hub.open().map_err(io_error)?;
        let setup = port_power_request(port_number, powered);

        handle
            .write_control(
                setup.request_type,
                setup.request,
                setup.value,
                setup.index,
                &[],
                self.timeout,
            )
            .map_err(io_error)?;

        debug!(
            "Port {} on hub {} powered {}",
            port_number,
            label,
            if powered { "on" } else { "off" }
        );
        Ok(())
    }
}

/// Identify a hub for log and error messages
///
/// Vendor/product are omitted when the descriptor could not be read.
fn hub_label(ids: Option<(u16, u16)>, bus_number: u8, address: u8) -> String {
    match ids {
        Some((vendor, product)) => format!(
            "{:04x}:{:04x} (bus {:03}, addr {:03})",
            vendor, product, bus_number, address
        ),
        None => format!("bus {:03}, addr {:03}", bus_number, address),
    }
}
