//! USB device selector type

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Vendor/product ID pair selecting a USB device
///
/// Textual form is `0xVVVV:0xPPPP`, e.g. `0x04d9:0x0355`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VidPid {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl VidPid {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

impl fmt::Display for VidPid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}:0x{:04x}", self.vendor_id, self.product_id)
    }
}

impl FromStr for VidPid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (vid, pid) = s.split_once(':').ok_or_else(|| {
            format!("Invalid device '{}', expected VID:PID (e.g., '0x04d9:0x0355')", s)
        })?;

        Ok(Self {
            vendor_id: parse_hex_id(vid.trim(), "VID")?,
            product_id: parse_hex_id(pid.trim(), "PID")?,
        })
    }
}

/// Parse a `0x`-prefixed hex ID of 1-4 digits
fn parse_hex_id(id: &str, name: &str) -> Result<u16, String> {
    let hex_part = id
        .strip_prefix("0x")
        .or_else(|| id.strip_prefix("0X"))
        .ok_or_else(|| {
            format!("Invalid {} '{}', must start with '0x' (e.g., '0x1234')", name, id)
        })?;

    if hex_part.is_empty() || hex_part.len() > 4 {
        return Err(format!("Invalid {} '{}', hex part must be 1-4 digits", name, id));
    }

    u16::from_str_radix(hex_part, 16)
        .map_err(|_| format!("Invalid {} '{}', not a valid hex number", name, id))
}

impl Serialize for VidPid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VidPid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(
            "0x04d9:0x0355".parse::<VidPid>().unwrap(),
            VidPid::new(0x04d9, 0x0355)
        );
        assert_eq!(
            "0X046D:0xC092".parse::<VidPid>().unwrap(),
            VidPid::new(0x046d, 0xc092)
        );
        assert_eq!("0x1:0x2".parse::<VidPid>().unwrap(), VidPid::new(1, 2));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("04d9:0355".parse::<VidPid>().is_err());
        assert!("0x04d9".parse::<VidPid>().is_err());
        assert!("0x04d9:0x0355:0x1".parse::<VidPid>().is_err());
        assert!("0xGHIJ:0x0355".parse::<VidPid>().is_err());
        assert!("0x12345:0x0355".parse::<VidPid>().is_err());
        assert!("0x:0x0355".parse::<VidPid>().is_err());
        assert!("0x04d9:*".parse::<VidPid>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let id = VidPid::new(0x046d, 0xc092);
        assert_eq!(id.to_string(), "0x046d:0xc092");
        assert_eq!(id.to_string().parse::<VidPid>().unwrap(), id);
    }

    #[test]
    fn test_toml_form() {
        #[derive(Deserialize)]
        struct Wrapper {
            devices: Vec<VidPid>,
        }

        let parsed: Wrapper = toml::from_str(r#"devices = ["0x04d9:0x0355"]"#).unwrap();
        assert_eq!(parsed.devices, vec![VidPid::new(0x04d9, 0x0355)]);

        assert!(toml::from_str::<Wrapper>(r#"devices = ["bogus"]"#).is_err());
    }
}
