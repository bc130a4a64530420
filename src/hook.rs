use std::sync::{Mutex, OnceLock};
use std::thread;

use crossbeam_channel::Sender;
use rdev::{Event, EventType, Key};

use crate::capture::{KeyEvent, Modifiers};

/// Where listener events go while a hook is installed
struct Sink {
    tx: Sender<KeyEvent>,
    wake: Box<dyn Fn() + Send>,
}

static SINK: Mutex<Option<Sink>> = Mutex::new(None);
static LISTENER: OnceLock<()> = OnceLock::new();

/// Routes global key presses to the UI loop while alive.
///
/// rdev cannot stop a listener once started, so one listener thread runs for
/// the life of the process and this guard only connects or disconnects it.
pub struct KeyboardHook {
    _private: (),
}

impl KeyboardHook {
    pub fn install<W>(tx: Sender<KeyEvent>, wake: W) -> Self
    where
        W: Fn() + Send + 'static,
    {
        LISTENER.get_or_init(spawn_listener);
        if let Ok(mut sink) = SINK.lock() {
            *sink = Some(Sink {
                tx,
                wake: Box::new(wake),
            });
        }
        tracing::debug!("[Capture] Keyboard hook installed");
        Self { _private: () }
    }
}

impl Drop for KeyboardHook {
    fn drop(&mut self) {
        if let Ok(mut sink) = SINK.lock() {
            *sink = None;
        }
        tracing::debug!("[Capture] Keyboard hook removed");
    }
}

fn spawn_listener() {
    thread::spawn(|| {
        tracing::info!("[Capture] Starting global keyboard listener");
        let mut held = Modifiers::default();

        let result = rdev::listen(move |event: Event| {
            if let Some(key_event) = track(&mut held, &event) {
                forward(key_event);
            }
        });

        if let Err(e) = result {
            tracing::error!("[Capture] Keyboard listener failed: {:?}", e);
        }
    });
}

fn forward(event: KeyEvent) {
    let Ok(sink) = SINK.lock() else {
        return;
    };
    if let Some(sink) = sink.as_ref() {
        if sink.tx.send(event).is_ok() {
            (sink.wake)();
        }
    }
}

/// Update modifier state and turn key-downs into `KeyEvent`s
fn track(held: &mut Modifiers, event: &Event) -> Option<KeyEvent> {
    match event.event_type {
        EventType::KeyPress(key) => {
            set_modifier(held, key, true);
            let name = key_name(key, event.name.as_deref())?;
            Some(KeyEvent::new(name, *held))
        }
        EventType::KeyRelease(key) => {
            set_modifier(held, key, false);
            None
        }
        _ => None,
    }
}

fn set_modifier(held: &mut Modifiers, key: Key, down: bool) {
    match key {
        Key::ControlLeft | Key::ControlRight => held.ctrl = down,
        Key::ShiftLeft | Key::ShiftRight => held.shift = down,
        Key::Alt | Key::AltGr => held.alt = down,
        _ => {}
    }
}

/// Lowercase name for a pressed key.
///
/// Printable keys use the character the layout produced, so shift+1 is "!".
pub fn key_name(key: Key, produced: Option<&str>) -> Option<String> {
    let named = match key {
        Key::ControlLeft | Key::ControlRight => "ctrl",
        Key::ShiftLeft | Key::ShiftRight => "shift",
        Key::Alt | Key::AltGr => "alt",
        Key::Escape => "esc",
        Key::Return | Key::KpReturn => "enter",
        Key::Space => "space",
        Key::Tab => "tab",
        Key::Backspace => "backspace",
        Key::Delete => "delete",
        Key::Insert => "insert",
        Key::Home => "home",
        Key::End => "end",
        Key::PageUp => "pageup",
        Key::PageDown => "pagedown",
        Key::UpArrow => "up",
        Key::DownArrow => "down",
        Key::LeftArrow => "left",
        Key::RightArrow => "right",
        Key::F1 => "f1",
        Key::F2 => "f2",
        Key::F3 => "f3",
        Key::F4 => "f4",
        Key::F5 => "f5",
        Key::F6 => "f6",
        Key::F7 => "f7",
        Key::F8 => "f8",
        Key::F9 => "f9",
        Key::F10 => "f10",
        Key::F11 => "f11",
        Key::F12 => "f12",
        _ => "",
    };
    if !named.is_empty() {
        return Some(named.to_string());
    }

    if let Some(text) = produced {
        let mut chars = text.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if !c.is_control() && !c.is_whitespace() {
                return Some(c.to_lowercase().collect());
            }
        }
    }

    // Control chords often produce no text; fall back to the key itself
    let debug = format!("{:?}", key);
    let bare = debug
        .strip_prefix("Key")
        .or_else(|| debug.strip_prefix("Num"))?;
    (bare.chars().count() == 1).then(|| bare.to_lowercase())
}
