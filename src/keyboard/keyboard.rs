use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Receiver,
        Arc,
    },
    thread::{self, JoinHandle},
};

use tracing::{debug, error, info, warn};

use super::device::{find_device, DeviceInfo};
use super::event::KeyboardEvent;
use super::keyboard_state::KeyboardState;
use super::listeners::Listeners;
use super::transport::{ReportSource, UsbTransport};
use crate::config::KeysConfig;
use crate::error::{KeyboardError, Result};

const THREAD_NAME: &str = "rockband-keys-reader";

/// High-level interface for the keyboard dongle.
///
/// Reads reports from the transport one at a time, decodes each against the
/// last known [`KeyboardState`] and hands the resulting events to the
/// registered listeners before the next read is issued.
pub struct RockBandKeyboard<T: ReportSource = UsbTransport> {
    transport: T,
    state: KeyboardState,
    listeners: Listeners,
    input_buf: Vec<u8>,
}

impl RockBandKeyboard<UsbTransport> {
    /// Open the configured dongle, or the first one discovered on the bus.
    pub fn connect(config: &KeysConfig) -> Result<Self> {
        let device = find_device(config.device.as_deref())?;
        Self::open(&device, config)
    }

    pub fn open(device: &DeviceInfo, config: &KeysConfig) -> Result<Self> {
        config.validate()?;
        let transport = UsbTransport::open(&device.path, config)?;
        Ok(Self::with_transport(transport, config.report_size))
    }
}

impl<T: ReportSource> RockBandKeyboard<T> {
    /// Wrap an already opened transport. `report_size` is the read buffer
    /// length.
    pub fn with_transport(transport: T, report_size: usize) -> Self {
        Self {
            transport,
            state: KeyboardState::new(),
            listeners: Listeners::new(),
            input_buf: vec![0; report_size],
        }
    }

    /// Register handlers; see [`Listeners`].
    pub fn listeners(&mut self) -> &mut Listeners {
        &mut self.listeners
    }

    /// Shorthand for `listeners().subscribe()`.
    pub fn subscribe(&mut self) -> Receiver<KeyboardEvent> {
        self.listeners.subscribe()
    }

    pub fn state(&self) -> &KeyboardState {
        &self.state
    }

    /// Read and decode a single report, dispatching its events.
    ///
    /// Returns the number of events dispatched. A report too short to decode
    /// is skipped with a warning; transport errors are returned as-is.
    pub fn poll_once(&mut self) -> Result<usize> {
        let len = match self.transport.read_report(&mut self.input_buf)? {
            Some(len) => len,
            None => return Ok(0),
        };

        let events = match self.state.apply(&self.input_buf[..len]) {
            Ok(events) => events,
            Err(err @ KeyboardError::ReportTooShort { .. }) => {
                warn!(%err, "skipping report");
                return Ok(0);
            }
            Err(err) => return Err(err),
        };

        if !events.is_empty() {
            debug!(count = events.len(), ?events, "decoded report");
        }
        for event in &events {
            self.listeners.dispatch(event);
        }
        Ok(events.len())
    }

    /// Enter the read loop. Blocks until the transport fails.
    pub fn run(&mut self) -> Result<()> {
        loop {
            if let Err(err) = self.poll_once() {
                error!(%err, "read loop stopped");
                return Err(err);
            }
        }
    }

    fn run_until(&mut self, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::Acquire) {
            if let Err(err) = self.poll_once() {
                error!(%err, "read loop stopped");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Release the transport without ever starting the read loop.
    pub fn close(mut self) -> Result<()> {
        self.transport.close()
    }
}

impl<T: ReportSource + 'static> RockBandKeyboard<T> {
    /// Move the read loop onto its own thread.
    ///
    /// Listeners run on that thread, in decode order.
    pub fn start(mut self) -> Result<RunningKeyboard<T>> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || {
                let result = self.run_until(&flag);
                (self, result)
            })
            .map_err(|err| KeyboardError::Thread(err.to_string()))?;

        info!("keyboard reader started");
        Ok(RunningKeyboard {
            stop,
            thread: Some(thread),
        })
    }
}

/// A keyboard whose read loop runs in the background.
///
/// Dropping it stops the loop and releases the device.
pub struct RunningKeyboard<T: ReportSource + 'static = UsbTransport> {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<(RockBandKeyboard<T>, Result<()>)>>,
}

impl<T: ReportSource + 'static> RunningKeyboard<T> {
    /// Whether the loop has ended on its own, i.e. after a fatal error.
    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .map_or(true, |thread| thread.is_finished())
    }

    /// Stop reading, wait for the loop to exit and release the device.
    ///
    /// Returns the error that ended the loop, if any. A read already in
    /// flight completes first.
    pub fn close(mut self) -> Result<()> {
        self.stop.store(true, Ordering::Release);
        self.finish()
    }

    /// Block until the loop ends on its own and release the device.
    pub fn wait(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        let (mut keyboard, result) = thread
            .join()
            .map_err(|_| KeyboardError::Thread("reader thread panicked".into()))?;
        let closed = keyboard.transport.close();
        info!("keyboard reader stopped");
        result.and(closed)
    }
}

impl<T: ReportSource + 'static> Drop for RunningKeyboard<T> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Err(err) = self.finish() {
            debug!(%err, "reader ended with error");
        }
    }
}
