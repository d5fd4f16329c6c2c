use std::collections::VecDeque;

use serde::Serialize;

use super::event::{Button, DpadDirection, KeyboardEvent};
use crate::error::{KeyboardError, Result};

/// Number of keys on the keyboard.
pub const NOTE_COUNT: usize = 25;
/// Shortest report that still contains every decoded field.
pub const REPORT_MIN_LEN: usize = 16;

const BUTTONS_OFFSET: usize = 0;
const DPAD_OFFSET: usize = 2;
// Big-endian key bitmask, key 0 in the top bit of the first byte.
const NOTE_MASK_OFFSET: usize = 5;
// The first velocity byte doubles as the last key-mask byte.
const VELOCITY_OFFSET: usize = 8;
const VELOCITY_LEN: usize = 5;
const VELOCITY_MASK: u8 = 0x7F;
const TOUCH_BUTTON_OFFSET: usize = 13;
const TOUCH_OFFSET: usize = 15;

/// Last known state of every signal the dongle reports.
///
/// A note slot holds 0 while the key is up and the key's velocity while it
/// is held, so a nonzero slot is a held key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KeyboardState {
    buttons: [bool; 4],
    dpad: [bool; 4],
    touch: u8,
    touch_button: bool,
    notes: [u8; NOTE_COUNT],
}

impl KeyboardState {
    /// State with every signal off.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn button(&self, button: Button) -> bool {
        self.buttons[button.index()]
    }

    pub fn dpad(&self, direction: DpadDirection) -> bool {
        self.dpad[direction.index()]
    }

    /// Last raw touch-strip value, 0 when untouched.
    pub fn touch(&self) -> u8 {
        self.touch
    }

    pub fn touch_button(&self) -> bool {
        self.touch_button
    }

    /// Stored velocity of `note`, 0 if the key is up. `None` for an index
    /// outside the keyboard.
    pub fn note(&self, note: usize) -> Option<u8> {
        self.notes.get(note).copied()
    }

    pub fn notes(&self) -> &[u8; NOTE_COUNT] {
        &self.notes
    }

    /// Indices of held keys, ascending.
    pub fn held_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.notes
            .iter()
            .enumerate()
            .filter(|&(_, &velocity)| velocity != 0)
            .map(|(note, _)| note as u8)
    }

    /// Decode `report` against this state without touching it.
    ///
    /// Returns the successor state and the events that lead to it, in the
    /// order dpad, buttons, touch strip, touch button, notes.
    pub fn decode(&self, report: &[u8]) -> Result<(KeyboardState, Vec<KeyboardEvent>)> {
        let mut next = *self;
        let events = next.apply(report)?;
        Ok((next, events))
    }

    /// In-place form of [`decode`](Self::decode). A short report is rejected
    /// before any field is touched.
    pub fn apply(&mut self, report: &[u8]) -> Result<Vec<KeyboardEvent>> {
        if report.len() < REPORT_MIN_LEN {
            return Err(KeyboardError::ReportTooShort {
                len: report.len(),
                min: REPORT_MIN_LEN,
            });
        }

        let mut events = Vec::new();
        self.diff_dpad(report[DPAD_OFFSET], &mut events);
        self.diff_buttons(report[BUTTONS_OFFSET], &mut events);
        self.diff_touch(report[TOUCH_OFFSET], &mut events);
        self.diff_touch_button(report[TOUCH_BUTTON_OFFSET], &mut events);
        self.diff_notes(report, &mut events);
        Ok(events)
    }

    fn diff_dpad(&mut self, raw: u8, events: &mut Vec<KeyboardEvent>) {
        for direction in DpadDirection::ALL {
            let pressed = raw == direction.encoding();
            let slot = &mut self.dpad[direction.index()];
            if *slot != pressed {
                *slot = pressed;
                events.push(KeyboardEvent::DpadChanged { direction, pressed });
            }
        }
    }

    fn diff_buttons(&mut self, bits: u8, events: &mut Vec<KeyboardEvent>) {
        for button in Button::ALL {
            let pressed = bits & button.bit() != 0;
            let slot = &mut self.buttons[button.index()];
            if *slot != pressed {
                *slot = pressed;
                events.push(KeyboardEvent::ButtonChanged { button, pressed });
            }
        }
    }

    // Fires only when the strip crosses zero; sliding between nonzero
    // values updates the stored value silently.
    fn diff_touch(&mut self, value: u8, events: &mut Vec<KeyboardEvent>) {
        if self.touch != value {
            if value != 0 {
                if self.touch == 0 {
                    events.push(KeyboardEvent::TouchOn { value });
                }
            } else {
                events.push(KeyboardEvent::TouchOff);
            }
        }
        self.touch = value;
    }

    fn diff_touch_button(&mut self, raw: u8, events: &mut Vec<KeyboardEvent>) {
        let pressed = raw != 0;
        if self.touch_button != pressed {
            self.touch_button = pressed;
            events.push(KeyboardEvent::TouchButtonChanged { pressed });
        }
    }

    fn diff_notes(&mut self, report: &[u8], events: &mut Vec<KeyboardEvent>) {
        // The top bit of the last mask byte belongs to the velocity payload.
        let keys = u32::from_be_bytes([
            report[NOTE_MASK_OFFSET],
            report[NOTE_MASK_OFFSET + 1],
            report[NOTE_MASK_OFFSET + 2],
            report[NOTE_MASK_OFFSET + 3] & VELOCITY_MASK,
        ]);

        let mut velocities: VecDeque<u8> = report[VELOCITY_OFFSET..VELOCITY_OFFSET + VELOCITY_LEN]
            .iter()
            .enumerate()
            .map(|(i, &byte)| if i == 0 { byte & VELOCITY_MASK } else { byte })
            .filter(|&velocity| velocity != 0)
            .collect();

        // Held keys pick up fresh velocities before any transition is looked at.
        for slot in self.notes.iter_mut().filter(|slot| **slot != 0) {
            match velocities.pop_front() {
                Some(velocity) => *slot = velocity,
                None => break,
            }
        }

        for note in 0..NOTE_COUNT {
            let down = keys & (0x8000_0000 >> note) != 0;
            if down == (self.notes[note] != 0) {
                continue;
            }

            if down {
                let velocity = match velocities.pop_front() {
                    Some(velocity) => velocity,
                    None => mean_velocity(&self.notes),
                };
                self.notes[note] = velocity;
                events.push(KeyboardEvent::NoteOn {
                    note: note as u8,
                    velocity,
                });
            } else {
                self.notes[note] = 0;
                events.push(KeyboardEvent::NoteOff { note: note as u8 });
            }
        }
    }
}

/// Decode `report` against `state`; see [`KeyboardState::decode`].
pub fn decode(
    state: &KeyboardState,
    report: &[u8],
) -> Result<(KeyboardState, Vec<KeyboardEvent>)> {
    state.decode(report)
}

/// Floor of the mean of the held velocities, 0 when nothing is held.
fn mean_velocity(notes: &[u8]) -> u8 {
    let (sum, count) = notes
        .iter()
        .filter(|&&velocity| velocity != 0)
        .fold((0u32, 0u32), |(sum, count), &velocity| {
            (sum + u32::from(velocity), count + 1)
        });
    if count == 0 {
        0
    } else {
        (sum / count) as u8
    }
}
