use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{Key, KeyCode, ModifiersState, NamedKey, PhysicalKey};

use crate::ui::text_input::{EditKey, KeyInput, Modifiers};

#[inline(always)]
pub fn modifiers_from_winit(state: ModifiersState) -> Modifiers {
    Modifiers {
        // Cmd on macOS behaves like Ctrl for editing shortcuts.
        ctrl: state.control_key() || state.super_key(),
        shift: state.shift_key(),
    }
}

/// The parts of a winit `KeyEvent` the note field reads. `KeyEvent` cannot be
/// built outside winit, so tests construct this directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub physical_key: PhysicalKey,
    pub logical_key: Key,
    pub text: Option<String>,
    pub state: ElementState,
    pub repeat: bool,
}

impl KeyPress {
    #[inline(always)]
    pub fn is_fresh_press(&self) -> bool {
        self.state == ElementState::Pressed && !self.repeat
    }
}

impl From<&KeyEvent> for KeyPress {
    fn from(event: &KeyEvent) -> Self {
        Self {
            physical_key: event.physical_key,
            logical_key: event.logical_key.clone(),
            text: event.text.as_ref().map(|t| t.to_string()),
            state: event.state,
            repeat: event.repeat,
        }
    }
}

/// Translates a key press into a text-editing input. Releases and keys the
/// widget does not handle yield `None`.
pub fn key_input_from_winit(event: &KeyEvent, modifiers: ModifiersState) -> Option<KeyInput> {
    key_input(&KeyPress::from(event), modifiers)
}

pub fn key_input(press: &KeyPress, modifiers: ModifiersState) -> Option<KeyInput> {
    if press.state != ElementState::Pressed {
        return None;
    }
    let mods = modifiers_from_winit(modifiers);

    let key = match &press.logical_key {
        Key::Named(named) => match named {
            NamedKey::Backspace => EditKey::Backspace,
            NamedKey::Delete => EditKey::Delete,
            NamedKey::ArrowLeft => EditKey::Left,
            NamedKey::ArrowRight => EditKey::Right,
            NamedKey::Home => EditKey::Home,
            NamedKey::End => EditKey::End,
            NamedKey::Enter => EditKey::Enter,
            NamedKey::Escape => EditKey::Escape,
            NamedKey::Space => EditKey::Text(" ".to_string()),
            _ => return None,
        },
        Key::Character(ch) => {
            // Windows reports AltGr as Ctrl+Alt; the composed character wins there.
            let altgr = modifiers.control_key() && modifiers.alt_key() && !modifiers.super_key();
            match printable(press.text.as_deref()) {
                Some(text) if !mods.ctrl || altgr => {
                    let mods = Modifiers { ctrl: false, shift: mods.shift };
                    return Some(KeyInput { key: EditKey::Text(text.to_string()), mods });
                }
                _ if mods.ctrl => EditKey::Text(ch.to_string()),
                _ => return None,
            }
        }
        _ => return None,
    };
    Some(KeyInput { key, mods })
}

fn printable(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty() && !t.chars().any(char::is_control))
}

/// Maps a physical key to a lane for the given key count (4K: D F J K, 7K: S D F Space J K L).
#[inline(always)]
pub fn lane_from_keycode(code: KeyCode, key_count: usize) -> Option<usize> {
    match key_count {
        4 => match code {
            KeyCode::KeyD | KeyCode::ArrowLeft => Some(0),
            KeyCode::KeyF | KeyCode::ArrowDown => Some(1),
            KeyCode::KeyJ | KeyCode::ArrowUp => Some(2),
            KeyCode::KeyK | KeyCode::ArrowRight => Some(3),
            _ => None,
        },
        7 => match code {
            KeyCode::KeyS => Some(0),
            KeyCode::KeyD => Some(1),
            KeyCode::KeyF => Some(2),
            KeyCode::Space => Some(3),
            KeyCode::KeyJ => Some(4),
            KeyCode::KeyK => Some(5),
            KeyCode::KeyL => Some(6),
            _ => None,
        },
        _ => None,
    }
}

/// A lane press/release edge derived from a keyboard event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneEdge {
    pub lane: usize,
    pub pressed: bool,
}

pub fn lane_edge_from_winit(event: &KeyEvent, key_count: usize) -> Option<LaneEdge> {
    lane_edge(&KeyPress::from(event), key_count)
}

/// Auto-repeat is dropped so a held key stays one press.
pub fn lane_edge(press: &KeyPress, key_count: usize) -> Option<LaneEdge> {
    if press.repeat {
        return None;
    }
    let PhysicalKey::Code(code) = press.physical_key else {
        return None;
    };
    lane_from_keycode(code, key_count).map(|lane| LaneEdge {
        lane,
        pressed: press.state == ElementState::Pressed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NativeKey;

    #[test]
    fn four_key_layout() {
        assert_eq!(lane_from_keycode(KeyCode::KeyD, 4), Some(0));
        assert_eq!(lane_from_keycode(KeyCode::ArrowRight, 4), Some(3));
        assert_eq!(lane_from_keycode(KeyCode::Space, 4), None);
    }

    #[test]
    fn seven_key_layout() {
        let keys = [
            KeyCode::KeyS, KeyCode::KeyD, KeyCode::KeyF, KeyCode::Space,
            KeyCode::KeyJ, KeyCode::KeyK, KeyCode::KeyL,
        ];
        for (lane, key) in keys.into_iter().enumerate() {
            assert_eq!(lane_from_keycode(key, 7), Some(lane));
        }
        assert_eq!(lane_from_keycode(KeyCode::KeyD, 5), None);
    }

    #[test]
    fn super_key_counts_as_ctrl() {
        let mods = modifiers_from_winit(ModifiersState::SUPER | ModifiersState::SHIFT);
        assert!(mods.ctrl);
        assert!(mods.shift);
        assert_eq!(modifiers_from_winit(ModifiersState::empty()), Modifiers::default());
    }

    fn character(ch: &str, text: Option<&str>) -> KeyPress {
        KeyPress {
            physical_key: PhysicalKey::Code(KeyCode::KeyQ),
            logical_key: Key::Character(ch.into()),
            text: text.map(str::to_string),
            state: ElementState::Pressed,
            repeat: false,
        }
    }

    fn physical(code: KeyCode, state: ElementState, repeat: bool) -> KeyPress {
        KeyPress {
            physical_key: PhysicalKey::Code(code),
            logical_key: Key::Unidentified(NativeKey::Unidentified),
            text: None,
            state,
            repeat,
        }
    }

    #[test]
    fn typed_characters_use_event_text() {
        let input = key_input(&character("a", Some("a")), ModifiersState::empty()).unwrap();
        assert_eq!(input, KeyInput::text("a"));
        let shifted = key_input(&character("A", Some("A")), ModifiersState::SHIFT).unwrap();
        assert_eq!(shifted.key, EditKey::Text("A".to_string()));
        assert!(shifted.mods.shift);
        assert_eq!(key_input(&character("a", None), ModifiersState::empty()), None);

        let mut released = character("a", Some("a"));
        released.state = ElementState::Released;
        assert_eq!(key_input(&released, ModifiersState::empty()), None);
    }

    #[test]
    fn ctrl_letters_become_shortcuts() {
        // Ctrl+C usually carries a control character as its text.
        let input = key_input(&character("c", Some("\u{3}")), ModifiersState::CONTROL).unwrap();
        assert_eq!(input, KeyInput::ctrl(EditKey::Text("c".to_string())));
        let cmd = key_input(&character("v", Some("v")), ModifiersState::SUPER).unwrap();
        assert_eq!(cmd, KeyInput::ctrl(EditKey::Text("v".to_string())));
    }

    #[test]
    fn altgr_characters_are_typed_not_dropped() {
        let altgr = ModifiersState::CONTROL | ModifiersState::ALT;
        let input = key_input(&character("q", Some("@")), altgr).unwrap();
        assert_eq!(input, KeyInput::text("@"));
        let euro = key_input(&character("e", Some("€")), altgr).unwrap();
        assert_eq!(euro, KeyInput::text("€"));
    }

    #[test]
    fn named_keys_map_to_edit_keys() {
        let mut press = physical(KeyCode::Backspace, ElementState::Pressed, false);
        press.logical_key = Key::Named(NamedKey::Backspace);
        let input = key_input(&press, ModifiersState::CONTROL).unwrap();
        assert_eq!(input, KeyInput::ctrl(EditKey::Backspace));
        press.logical_key = Key::Named(NamedKey::Space);
        assert_eq!(key_input(&press, ModifiersState::empty()), Some(KeyInput::text(" ")));
        press.logical_key = Key::Named(NamedKey::F1);
        assert_eq!(key_input(&press, ModifiersState::empty()), None);
    }

    #[test]
    fn lane_edges_skip_repeats() {
        let down = physical(KeyCode::KeyF, ElementState::Pressed, false);
        assert_eq!(lane_edge(&down, 4), Some(LaneEdge { lane: 1, pressed: true }));
        assert!(down.is_fresh_press());
        let up = physical(KeyCode::KeyF, ElementState::Released, false);
        assert_eq!(lane_edge(&up, 4), Some(LaneEdge { lane: 1, pressed: false }));
        let repeat = physical(KeyCode::KeyF, ElementState::Pressed, true);
        assert_eq!(lane_edge(&repeat, 4), None);
        assert!(!repeat.is_fresh_press());
        assert_eq!(lane_edge(&physical(KeyCode::KeyQ, ElementState::Pressed, false), 4), None);
    }
}
