//! USB subsystem
//!
//! The power cycle only needs three things from the USB stack:
//! - locating a device and its parent hub by vendor/product ID
//! - finding hubs by vendor/product ID together with their port paths
//! - issuing the hub class request that switches port power
//!
//! [`UsbBus`] captures exactly that. [`RusbBus`] implements it over libusb,
//! [`mock::MockBus`] implements it in memory for tests.

pub mod bus;
pub mod hub;
pub mod mock;

pub use bus::RusbBus;
pub use hub::{ControlSetup, port_power_request};

use common::{Result, VidPid};
use record::PowerRecord;

/// Access to the attached USB topology
pub trait UsbBus {
    /// Handle to a hub that port power requests can be issued against
    type Hub;

    /// Find the first attached device matching `target` and its parent hub
    fn locate(&self, target: VidPid) -> Result<Location<Self::Hub>>;

    /// All attached devices with the given vendor/product, with their port paths
    fn find_hubs(&self, vendor_id: u16, product_id: u16) -> Result<Vec<FoundHub<Self::Hub>>>;

    /// Switch power on one downstream port of `hub`
    fn set_port_powered(&self, hub: &Self::Hub, port_number: u8, powered: bool) -> Result<()>;
}

/// Result of looking up a configured device
#[derive(Debug)]
pub enum Location<H> {
    /// No attached device matches the vendor/product
    NotFound,
    /// Device is attached but the stack cannot resolve its parent hub
    NoParentHub,
    Attached(Attachment<H>),
}

/// A device resolved to the hub port it is plugged into
#[derive(Debug)]
pub struct Attachment<H> {
    pub hub: H,
    pub hub_vendor: u16,
    pub hub_product: u16,
    pub hub_port_numbers: Vec<u8>,
    /// Port on `hub` the device is plugged into
    pub port_number: u8,
}

impl<H> Attachment<H> {
    /// Record that lets this port be found again after the device is gone
    pub fn record(&self) -> PowerRecord {
        PowerRecord::new(
            self.hub_vendor,
            self.hub_product,
            self.hub_port_numbers.clone(),
            self.port_number,
        )
    }
}

/// A hub candidate returned by [`UsbBus::find_hubs`]
#[derive(Debug)]
pub struct FoundHub<H> {
    pub hub: H,
    pub port_numbers: Vec<u8>,
}
