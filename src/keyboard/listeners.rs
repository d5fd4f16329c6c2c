use std::sync::mpsc::{self, Receiver, Sender};

use super::event::{Button, DpadDirection, KeyboardEvent};

/// Handlers registered per event kind.
///
/// Events are delivered in the order they were decoded: per-kind handlers
/// first, then catch-all handlers, then channel subscribers.
#[derive(Default)]
pub struct Listeners {
    dpad: Vec<Box<dyn FnMut(DpadDirection, bool) + Send>>,
    button: Vec<Box<dyn FnMut(Button, bool) + Send>>,
    touch_on: Vec<Box<dyn FnMut(u8) + Send>>,
    touch_off: Vec<Box<dyn FnMut() + Send>>,
    touch_button: Vec<Box<dyn FnMut(bool) + Send>>,
    note_on: Vec<Box<dyn FnMut(u8, u8) + Send>>,
    note_off: Vec<Box<dyn FnMut(u8) + Send>>,
    any: Vec<Box<dyn FnMut(&KeyboardEvent) + Send>>,
    subscribers: Vec<Sender<KeyboardEvent>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(direction, pressed)`
    pub fn on_dpad<F>(&mut self, handler: F)
    where
        F: FnMut(DpadDirection, bool) + Send + 'static,
    {
        self.dpad.push(Box::new(handler));
    }

    /// `(button, pressed)`
    pub fn on_button<F>(&mut self, handler: F)
    where
        F: FnMut(Button, bool) + Send + 'static,
    {
        self.button.push(Box::new(handler));
    }

    /// `(value)`
    pub fn on_touch_on<F>(&mut self, handler: F)
    where
        F: FnMut(u8) + Send + 'static,
    {
        self.touch_on.push(Box::new(handler));
    }

    pub fn on_touch_off<F>(&mut self, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.touch_off.push(Box::new(handler));
    }

    /// `(pressed)`
    pub fn on_touch_button<F>(&mut self, handler: F)
    where
        F: FnMut(bool) + Send + 'static,
    {
        self.touch_button.push(Box::new(handler));
    }

    /// `(note, velocity)`
    pub fn on_note_on<F>(&mut self, handler: F)
    where
        F: FnMut(u8, u8) + Send + 'static,
    {
        self.note_on.push(Box::new(handler));
    }

    /// `(note)`
    pub fn on_note_off<F>(&mut self, handler: F)
    where
        F: FnMut(u8) + Send + 'static,
    {
        self.note_off.push(Box::new(handler));
    }

    /// Handler for every event regardless of kind.
    pub fn on_event<F>(&mut self, handler: F)
    where
        F: FnMut(&KeyboardEvent) + Send + 'static,
    {
        self.any.push(Box::new(handler));
    }

    /// Receive every event over a channel. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<KeyboardEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.dpad.is_empty()
            && self.button.is_empty()
            && self.touch_on.is_empty()
            && self.touch_off.is_empty()
            && self.touch_button.is_empty()
            && self.note_on.is_empty()
            && self.note_off.is_empty()
            && self.any.is_empty()
            && self.subscribers.is_empty()
    }

    pub fn dispatch(&mut self, event: &KeyboardEvent) {
        match *event {
            KeyboardEvent::DpadChanged { direction, pressed } => {
                self.dpad.iter_mut().for_each(|cb| cb(direction, pressed))
            }
            KeyboardEvent::ButtonChanged { button, pressed } => {
                self.button.iter_mut().for_each(|cb| cb(button, pressed))
            }
            KeyboardEvent::TouchOn { value } => self.touch_on.iter_mut().for_each(|cb| cb(value)),
            KeyboardEvent::TouchOff => self.touch_off.iter_mut().for_each(|cb| cb()),
            KeyboardEvent::TouchButtonChanged { pressed } => {
                self.touch_button.iter_mut().for_each(|cb| cb(pressed))
            }
            KeyboardEvent::NoteOn { note, velocity } => {
                self.note_on.iter_mut().for_each(|cb| cb(note, velocity))
            }
            KeyboardEvent::NoteOff { note } => self.note_off.iter_mut().for_each(|cb| cb(note)),
        }

        self.any.iter_mut().for_each(|cb| cb(event));
        self.subscribers.retain(|tx| tx.send(*event).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn routes_events_to_their_kind() {
        let log = Arc::new(Mutex::new(Vec::<String>::new()));
        let mut listeners = Listeners::new();

        let sink = Arc::clone(&log);
        listeners.on_note_on(move |note, velocity| {
            sink.lock().unwrap().push(format!("on {note} {velocity}"))
        });
        let sink = Arc::clone(&log);
        listeners.on_note_off(move |note| sink.lock().unwrap().push(format!("off {note}")));
        let sink = Arc::clone(&log);
        listeners.on_touch_off(move || sink.lock().unwrap().push("touch off".into()));

        listeners.dispatch(&KeyboardEvent::NoteOn {
            note: 4,
            velocity: 99,
        });
        listeners.dispatch(&KeyboardEvent::ButtonChanged {
            button: Button::B,
            pressed: true,
        });
        listeners.dispatch(&KeyboardEvent::TouchOff);
        listeners.dispatch(&KeyboardEvent::NoteOff { note: 4 });

        assert_eq!(
            *log.lock().unwrap(),
            vec!["on 4 99", "touch off", "off 4"]
        );
    }

    #[test]
    fn several_handlers_for_one_kind_all_fire() {
        let count = Arc::new(Mutex::new(0));
        let mut listeners = Listeners::new();
        for _ in 0..3 {
            let count = Arc::clone(&count);
            listeners.on_dpad(move |direction, pressed| {
                assert_eq!(direction, DpadDirection::Down);
                assert!(pressed);
                *count.lock().unwrap() += 1;
            });
        }

        listeners.dispatch(&KeyboardEvent::DpadChanged {
            direction: DpadDirection::Down,
            pressed: true,
        });
        assert_eq!(*count.lock().unwrap(), 3);
    }

    #[test]
    fn subscribers_see_every_event_in_order() {
        let mut listeners = Listeners::new();
        let rx = listeners.subscribe();

        let events = [
            KeyboardEvent::TouchOn { value: 5 },
            KeyboardEvent::TouchButtonChanged { pressed: true },
            KeyboardEvent::TouchOff,
        ];
        for event in &events {
            listeners.dispatch(event);
        }

        let received: Vec<KeyboardEvent> = rx.try_iter().collect();
        assert_eq!(received, events);
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let mut listeners = Listeners::new();
        drop(listeners.subscribe());
        assert!(!listeners.is_empty());

        listeners.dispatch(&KeyboardEvent::TouchOff);
        assert!(listeners.is_empty());
    }

    #[test]
    fn clear_removes_everything() {
        let mut listeners = Listeners::new();
        listeners.on_event(|_| panic!("cleared handler called"));
        listeners.on_button(|_, _| panic!("cleared handler called"));
        listeners.clear();
        assert!(listeners.is_empty());
        listeners.dispatch(&KeyboardEvent::TouchOff);
    }
}
