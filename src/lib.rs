//! Decoder for the Rock Band keyboard's wireless USB dongle.
//!
//! [`KeyboardState::decode`] turns one raw report into the edge-triggered
//! events it implies; [`RockBandKeyboard`] wraps it in a read loop over the
//! dongle and delivers those events to registered [`Listeners`].

pub mod config;
pub mod error;
pub mod keyboard;

pub use config::KeysConfig;
pub use error::{KeyboardError, Result};
pub use keyboard::{
    available_devices, decode, find_device, list_devices, Button, DeviceInfo, DpadDirection,
    EventKind, KeyboardEvent, KeyboardState, Listeners, ReportSource, RockBandKeyboard,
    RunningKeyboard, UsbTransport,
};
