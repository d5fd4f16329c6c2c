use std::time::Duration;

use rusb::{Context, DeviceHandle, Error, UsbContext};
use tracing::{debug, info};

use super::device::device_path;
use crate::config::KeysConfig;
use crate::error::{KeyboardError, Result};

/// Something that hands out raw reports one at a time.
pub trait ReportSource: Send {
    /// Read the next report into `buf`.
    ///
    /// `Ok(None)` means nothing arrived within the poll interval and the
    /// caller should simply ask again. Any error is fatal.
    fn read_report(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Release the device. Calling it again is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// Interrupt-endpoint reader for the dongle over libusb.
pub struct UsbTransport {
    _context: Context,
    handle: Option<DeviceHandle<Context>>,
    path: String,
    interface: u8,
    endpoint: u8,
    timeout: Duration,
}

impl UsbTransport {
    /// Open the device at `path` (as produced by enumeration) and claim its
    /// HID interface.
    pub fn open(path: &str, config: &KeysConfig) -> Result<Self> {
        let open_error = |reason: String| KeyboardError::DeviceOpen {
            path: path.to_string(),
            reason,
        };

        let context = Context::new().map_err(|err| open_error(err.to_string()))?;
        let devices = context
            .devices()
            .map_err(|err| open_error(err.to_string()))?;
        let device = devices
            .iter()
            .find(|device| device_path(device) == path)
            .ok_or_else(|| open_error("device is not connected".into()))?;

        let handle = device.open().map_err(|err| open_error(err.to_string()))?;
        if let Err(err) = handle.set_auto_detach_kernel_driver(true) {
            debug!(%err, "kernel driver auto-detach unavailable");
        }
        handle
            .claim_interface(config.interface)
            .map_err(|err| open_error(err.to_string()))?;

        info!(
            path,
            interface = config.interface,
            endpoint = config.endpoint,
            "opened keyboard dongle"
        );

        Ok(Self {
            _context: context,
            handle: Some(handle),
            path: path.to_string(),
            interface: config.interface,
            endpoint: config.endpoint,
            timeout: config.read_timeout(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ReportSource for UsbTransport {
    fn read_report(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| KeyboardError::TransportRead("device is closed".into()))?;

        match handle.read_interrupt(self.endpoint, buf, self.timeout) {
            Ok(len) => Ok(Some(len)),
            Err(Error::Timeout) => Ok(None),
            Err(err) => Err(KeyboardError::TransportRead(err.to_string())),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle.release_interface(self.interface)?;
            info!(path = %self.path, "closed keyboard dongle");
        }
        Ok(())
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            debug!(path = %self.path, %err, "release on drop failed");
        }
    }
}
