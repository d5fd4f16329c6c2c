use rusb::{Context, Device, UsbContext};
use serde::Serialize;
use tracing::debug;

use crate::error::{KeyboardError, Result};

/// Vendor id of the Rock Band keyboard wireless dongle (0x1BAD).
pub const DONGLE_VENDOR_ID: u16 = 7085;
/// Product id of the Rock Band keyboard wireless dongle (0x3330).
pub const DONGLE_PRODUCT_ID: u16 = 13104;

/// A USB device as seen during enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    /// `"<bus>:<address>"`, e.g. `"001:004"`.
    pub path: String,
}

impl DeviceInfo {
    pub fn is_keyboard_dongle(&self) -> bool {
        self.vendor_id == DONGLE_VENDOR_ID && self.product_id == DONGLE_PRODUCT_ID
    }
}

/// Every device currently on the bus.
pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    let context = Context::new()?;
    let mut found = Vec::new();

    for device in context.devices()?.iter() {
        let desc = match device.device_descriptor() {
            Ok(desc) => desc,
            Err(err) => {
                debug!(path = %device_path(&device), %err, "skipping unreadable descriptor");
                continue;
            }
        };
        found.push(DeviceInfo {
            vendor_id: desc.vendor_id(),
            product_id: desc.product_id(),
            path: device_path(&device),
        });
    }

    Ok(found)
}

/// Connected keyboard dongles.
pub fn available_devices() -> Result<Vec<DeviceInfo>> {
    Ok(list_devices()?
        .into_iter()
        .filter(DeviceInfo::is_keyboard_dongle)
        .collect())
}

/// The dongle at `path`, or the first one found when `path` is `None`.
pub fn find_device(path: Option<&str>) -> Result<DeviceInfo> {
    select_device(available_devices()?, path)
}

fn select_device(devices: Vec<DeviceInfo>, path: Option<&str>) -> Result<DeviceInfo> {
    devices
        .into_iter()
        .filter(DeviceInfo::is_keyboard_dongle)
        .find(|device| path.map_or(true, |wanted| device.path == wanted))
        .ok_or(KeyboardError::NoMatchingDevice)
}

pub(crate) fn device_path<T: UsbContext>(device: &Device<T>) -> String {
    format!("{:03}:{:03}", device.bus_number(), device.address())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(vendor_id: u16, product_id: u16, path: &str) -> DeviceInfo {
        DeviceInfo {
            vendor_id,
            product_id,
            path: path.into(),
        }
    }

    #[test]
    fn matches_only_the_dongle_ids() {
        assert!(info(7085, 13104, "001:002").is_keyboard_dongle());
        assert!(info(0x1BAD, 0x3330, "001:002").is_keyboard_dongle());
        assert!(!info(7085, 13105, "001:002").is_keyboard_dongle());
        assert!(!info(0x17cc, 13104, "001:002").is_keyboard_dongle());
    }

    #[test]
    fn selects_first_dongle_or_by_path() {
        let devices = vec![
            info(0x046d, 0xc52b, "001:002"),
            info(7085, 13104, "001:005"),
            info(7085, 13104, "002:003"),
        ];

        assert_eq!(
            select_device(devices.clone(), None).unwrap().path,
            "001:005"
        );
        assert_eq!(
            select_device(devices.clone(), Some("002:003")).unwrap().path,
            "002:003"
        );
        assert!(matches!(
            select_device(devices.clone(), Some("001:002")),
            Err(KeyboardError::NoMatchingDevice)
        ));
        assert!(matches!(
            select_device(Vec::new(), None),
            Err(KeyboardError::NoMatchingDevice)
        ));
    }
}
