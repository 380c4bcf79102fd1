//! Hub port power requests
//!
//! Port power is a hub class feature: SET_FEATURE / CLEAR_FEATURE with
//! selector PORT_POWER, addressed to the port ("other" recipient).

use rusb::{Direction, Recipient, RequestType};

/// bRequest: CLEAR_FEATURE
pub const CLEAR_FEATURE: u8 = 0x01;
/// bRequest: SET_FEATURE
pub const SET_FEATURE: u8 = 0x03;
/// wValue: PORT_POWER feature selector
pub const PORT_POWER: u16 = 0x08;

/// Setup packet of a control transfer without data stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSetup {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
}

/// Build the request that powers `port_number` on or off
pub fn port_power_request(port_number: u8, powered: bool) -> ControlSetup {
    ControlSetup {
        request_type: rusb::request_type(Direction::Out, RequestType::Class, Recipient::Other),
        request: if powered { SET_FEATURE } else { CLEAR_FEATURE },
        value: PORT_POWER,
        index: u16::from(port_number),
    }
}
