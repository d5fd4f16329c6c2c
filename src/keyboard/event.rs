use std::fmt;

use serde::Serialize;

/// The four directions reported by the dpad byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DpadDirection {
    Left,
    Right,
    Up,
    Down,
}

impl DpadDirection {
    /// Evaluation order used when diffing the dpad byte.
    pub const ALL: [DpadDirection; 4] = [
        DpadDirection::Left,
        DpadDirection::Right,
        DpadDirection::Up,
        DpadDirection::Down,
    ];

    /// Raw dpad value that selects this direction. Values outside the four
    /// encodings (centered, diagonals) select none.
    pub const fn encoding(self) -> u8 {
        match self {
            DpadDirection::Up => 0,
            DpadDirection::Right => 2,
            DpadDirection::Down => 4,
            DpadDirection::Left => 6,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DpadDirection::Left => "Left",
            DpadDirection::Right => "Right",
            DpadDirection::Up => "Up",
            DpadDirection::Down => "Down",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            DpadDirection::Left => 0,
            DpadDirection::Right => 1,
            DpadDirection::Up => 2,
            DpadDirection::Down => 3,
        }
    }
}

impl fmt::Display for DpadDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Face buttons on the keytar neck, labelled `1`, `A`, `B` and `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Button {
    One,
    A,
    B,
    Two,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::One, Button::A, Button::B, Button::Two];

    /// Bit within the button byte.
    pub const fn bit(self) -> u8 {
        match self {
            Button::One => 0x01,
            Button::A => 0x02,
            Button::B => 0x04,
            Button::Two => 0x08,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Button::One => "1",
            Button::A => "A",
            Button::B => "B",
            Button::Two => "2",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Button::One => 0,
            Button::A => 1,
            Button::B => 2,
            Button::Two => 3,
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An edge-triggered change decoded from one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum KeyboardEvent {
    DpadChanged { direction: DpadDirection, pressed: bool },
    ButtonChanged { button: Button, pressed: bool },
    TouchOn { value: u8 },
    TouchOff,
    TouchButtonChanged { pressed: bool },
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
}

/// Discriminant of [`KeyboardEvent`], used to route events to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Dpad,
    Button,
    TouchOn,
    TouchOff,
    TouchButton,
    NoteOn,
    NoteOff,
}

impl KeyboardEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            KeyboardEvent::DpadChanged { .. } => EventKind::Dpad,
            KeyboardEvent::ButtonChanged { .. } => EventKind::Button,
            KeyboardEvent::TouchOn { .. } => EventKind::TouchOn,
            KeyboardEvent::TouchOff => EventKind::TouchOff,
            KeyboardEvent::TouchButtonChanged { .. } => EventKind::TouchButton,
            KeyboardEvent::NoteOn { .. } => EventKind::NoteOn,
            KeyboardEvent::NoteOff { .. } => EventKind::NoteOff,
        }
    }
}

fn pressed_label(pressed: bool) -> &'static str {
    if pressed {
        "pressed"
    } else {
        "released"
    }
}

impl fmt::Display for KeyboardEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyboardEvent::DpadChanged { direction, pressed } => {
                write!(f, "dpad {direction} {}", pressed_label(*pressed))
            }
            KeyboardEvent::ButtonChanged { button, pressed } => {
                write!(f, "button {button} {}", pressed_label(*pressed))
            }
            KeyboardEvent::TouchOn { value } => write!(f, "touch on value={value}"),
            KeyboardEvent::TouchOff => f.write_str("touch off"),
            KeyboardEvent::TouchButtonChanged { pressed } => {
                write!(f, "touch button {}", pressed_label(*pressed))
            }
            KeyboardEvent::NoteOn { note, velocity } => {
                write!(f, "note on note={note} velocity={velocity}")
            }
            KeyboardEvent::NoteOff { note } => write!(f, "note off note={note}"),
        }
    }
}
