mod device;
mod event;
#[allow(clippy::module_inception)]
mod keyboard;
mod keyboard_state;
mod listeners;
mod transport;

pub use device::{
    available_devices, find_device, list_devices, DeviceInfo, DONGLE_PRODUCT_ID, DONGLE_VENDOR_ID,
};
pub use event::{Button, DpadDirection, EventKind, KeyboardEvent};
pub use keyboard::{RockBandKeyboard, RunningKeyboard};
pub use keyboard_state::{decode, KeyboardState, NOTE_COUNT, REPORT_MIN_LEN};
pub use listeners::Listeners;
pub use transport::{ReportSource, UsbTransport};
