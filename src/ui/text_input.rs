//! Single-line text input used by menus (search boxes, name entry, chat).
//!
//! The widget only tracks state: value, caret, selection, focus and timers.
//! The host draws it from `display_text()`, `caret()` and `selection()`, and
//! feeds it keys through `handle_key()` once per key press.
//!
//! Caret and selection positions are char indices, never byte offsets, so
//! multi-byte input cannot split a code point.

use log::debug;

use crate::config::{CARET_BLINK_INTERVAL, STOPPED_TYPING_DELAY, TEXT_INPUT_MAX_CHARS};
use crate::core::clipboard::Clipboard;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKey {
    /// Printable text, or the pressed letter when Ctrl is held.
    Text(String),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: EditKey,
    pub mods: Modifiers,
}

impl KeyInput {
    pub fn plain(key: EditKey) -> Self {
        Self { key, mods: Modifiers::default() }
    }

    pub fn ctrl(key: EditKey) -> Self {
        Self { key, mods: Modifiers { ctrl: true, shift: false } }
    }

    pub fn shift(key: EditKey) -> Self {
        Self { key, mods: Modifiers { ctrl: false, shift: true } }
    }

    pub fn text(s: &str) -> Self {
        Self::plain(EditKey::Text(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInputEvent {
    Changed,
    Submitted(String),
    /// Fired once after the user pauses typing.
    StoppedTyping(String),
    Unfocused,
}

#[derive(Debug, Clone)]
pub struct TextInput {
    value: String,
    caret: usize,
    anchor: Option<usize>,
    focused: bool,
    caret_visible: bool,
    blink_timer: f32,
    since_edit: Option<f32>,
    pub placeholder: String,
    pub max_chars: usize,
    pub allow_submission: bool,
    pub clear_on_submit: bool,
    pub always_focused: bool,
    pub stopped_typing_delay: f32,
}

impl Default for TextInput {
    fn default() -> Self {
        Self {
            value: String::new(),
            caret: 0,
            anchor: None,
            focused: false,
            caret_visible: true,
            blink_timer: 0.0,
            since_edit: None,
            placeholder: String::new(),
            max_chars: TEXT_INPUT_MAX_CHARS,
            allow_submission: true,
            clear_on_submit: false,
            always_focused: false,
            stopped_typing_delay: STOPPED_TYPING_DELAY,
        }
    }
}

impl TextInput {
    pub fn new(placeholder: &str) -> Self {
        Self { placeholder: placeholder.to_string(), ..Self::default() }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn is_focused(&self) -> bool {
        self.focused || self.always_focused
    }

    pub fn caret_visible(&self) -> bool {
        self.is_focused() && self.caret_visible
    }

    pub fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    /// Normalised `(start, end)` char range of the selection, if non-empty.
    pub fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        match anchor.cmp(&self.caret) {
            std::cmp::Ordering::Less => Some((anchor, self.caret)),
            std::cmp::Ordering::Greater => Some((self.caret, anchor)),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn selected_text(&self) -> Option<&str> {
        let (start, end) = self.selection()?;
        Some(&self.value[self.byte_index(start)..self.byte_index(end)])
    }

    /// Text to draw and whether it is the placeholder.
    pub fn display_text(&self) -> (&str, bool) {
        if self.value.is_empty() && !self.is_focused() {
            (self.placeholder.as_str(), true)
        } else {
            (self.value.as_str(), false)
        }
    }

    pub fn focus(&mut self) {
        self.focused = true;
        self.reset_blink();
    }

    pub fn unfocus(&mut self) {
        self.focused = false;
        self.anchor = None;
    }

    /// Replaces the value, truncating to `max_chars`. The caret moves to the end.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.chars().filter(|c| !c.is_control()).take(self.max_chars).collect();
        self.caret = self.char_count();
        self.anchor = None;
    }

    pub fn clear(&mut self) {
        self.set_value("");
    }

    pub fn select_all(&mut self) {
        self.anchor = Some(0);
        self.caret = self.char_count();
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(b, _)| b)
    }

    fn reset_blink(&mut self) {
        self.caret_visible = true;
        self.blink_timer = 0.0;
    }

    fn mark_edited(&mut self) -> Option<TextInputEvent> {
        self.since_edit = Some(0.0);
        self.reset_blink();
        Some(TextInputEvent::Changed)
    }

    fn delete_range(&mut self, start: usize, end: usize) {
        let (bs, be) = (self.byte_index(start), self.byte_index(end));
        self.value.replace_range(bs..be, "");
        self.caret = start;
        self.anchor = None;
    }

    fn delete_selection(&mut self) -> bool {
        match self.selection() {
            Some((start, end)) => {
                self.delete_range(start, end);
                true
            }
            None => {
                self.anchor = None;
                false
            }
        }
    }

    /// Inserts `text` at the caret, replacing the selection. Control characters
    /// are dropped and the result is cut to `max_chars`.
    fn insert(&mut self, text: &str) -> bool {
        let removed = self.delete_selection();
        let room = self.max_chars.saturating_sub(self.char_count());
        let accepted: String = text.chars().filter(|c| !c.is_control()).take(room).collect();
        if accepted.is_empty() {
            return removed;
        }
        let at = self.byte_index(self.caret);
        self.value.insert_str(at, &accepted);
        self.caret += accepted.chars().count();
        true
    }

    /// Char index of the start of the word before the caret.
    fn word_start_before(&self, from: usize) -> usize {
        let chars: Vec<char> = self.value.chars().collect();
        let mut i = from.min(chars.len());
        while i > 0 && chars[i - 1].is_whitespace() {
            i -= 1;
        }
        while i > 0 && !chars[i - 1].is_whitespace() {
            i -= 1;
        }
        i
    }

    /// Char index just past the word after the caret.
    fn word_end_after(&self, from: usize) -> usize {
        let chars: Vec<char> = self.value.chars().collect();
        let mut i = from.min(chars.len());
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        i
    }

    fn move_caret(&mut self, to: usize, extend: bool) {
        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(self.caret);
            }
        } else {
            self.anchor = None;
        }
        self.caret = to.min(self.char_count());
        self.reset_blink();
    }

    /// Collapses the selection to one of its edges when moving without Shift.
    fn collapse_or(&mut self, to_start: bool, otherwise: usize, extend: bool) {
        match (extend, self.selection()) {
            (false, Some((start, end))) => self.move_caret(if to_start { start } else { end }, false),
            _ => self.move_caret(otherwise, extend),
        }
    }

    fn handle_shortcut(&mut self, letter: &str, clipboard: &mut dyn Clipboard) -> Option<TextInputEvent> {
        match letter.to_ascii_lowercase().as_str() {
            "a" => {
                self.select_all();
                None
            }
            "c" => {
                if let Some(text) = self.selected_text() {
                    clipboard.set_text(text);
                }
                None
            }
            "x" => {
                let text = self.selected_text()?.to_string();
                clipboard.set_text(&text);
                self.delete_selection();
                self.mark_edited()
            }
            "v" => {
                let pasted = clipboard.get_text()?;
                // Only the first line of multi-line clipboard contents.
                let line = pasted.lines().next().unwrap_or("");
                if self.insert(line) { self.mark_edited() } else { None }
            }
            _ => None,
        }
    }

    fn submit(&mut self) -> Option<TextInputEvent> {
        if !self.allow_submission || self.value.is_empty() {
            return None;
        }
        let submitted = self.value.clone();
        debug!("Text input submitted: {:?}", submitted);
        if self.clear_on_submit {
            self.clear();
        }
        self.since_edit = None;
        Some(TextInputEvent::Submitted(submitted))
    }

    /// Applies one key press. Unfocused inputs ignore everything.
    pub fn handle_key(&mut self, input: &KeyInput, clipboard: &mut dyn Clipboard) -> Option<TextInputEvent> {
        if !self.is_focused() {
            return None;
        }
        let Modifiers { ctrl, shift } = input.mods;

        match &input.key {
            EditKey::Text(text) if ctrl => self.handle_shortcut(text, clipboard),
            EditKey::Text(text) => {
                if self.insert(text) { self.mark_edited() } else { None }
            }
            EditKey::Backspace => {
                if self.delete_selection() {
                    return self.mark_edited();
                }
                if self.caret == 0 {
                    return None;
                }
                let start = if ctrl { self.word_start_before(self.caret) } else { self.caret - 1 };
                self.delete_range(start, self.caret);
                self.mark_edited()
            }
            EditKey::Delete => {
                if self.delete_selection() {
                    return self.mark_edited();
                }
                let len = self.char_count();
                if self.caret >= len {
                    return None;
                }
                let end = if ctrl { self.word_end_after(self.caret) } else { self.caret + 1 };
                let caret = self.caret;
                self.delete_range(caret, end);
                self.mark_edited()
            }
            EditKey::Left => {
                let to = if ctrl { self.word_start_before(self.caret) } else { self.caret.saturating_sub(1) };
                self.collapse_or(true, to, shift);
                None
            }
            EditKey::Right => {
                let to = if ctrl { self.word_end_after(self.caret) } else { self.caret + 1 };
                self.collapse_or(false, to, shift);
                None
            }
            EditKey::Home => {
                self.move_caret(0, shift);
                None
            }
            EditKey::End => {
                let len = self.char_count();
                self.move_caret(len, shift);
                None
            }
            EditKey::Enter => self.submit(),
            EditKey::Escape => {
                if self.always_focused {
                    return None;
                }
                self.unfocus();
                Some(TextInputEvent::Unfocused)
            }
        }
    }

    /// Advances timers by `dt` seconds: caret blink and the stopped-typing event.
    /// Non-finite or negative `dt` is ignored.
    pub fn update(&mut self, dt: f32) -> Option<TextInputEvent> {
        if !dt.is_finite() || dt < 0.0 {
            debug!("Text input ignored frame delta {}", dt);
            return None;
        }
        self.blink_timer += dt;
        if self.blink_timer >= CARET_BLINK_INTERVAL {
            let flips = (self.blink_timer / CARET_BLINK_INTERVAL) as u64;
            if flips % 2 == 1 {
                self.caret_visible = !self.caret_visible;
            }
            self.blink_timer %= CARET_BLINK_INTERVAL;
        }

        let elapsed = self.since_edit.as_mut()?;
        *elapsed += dt;
        if *elapsed >= self.stopped_typing_delay {
            self.since_edit = None;
            return Some(TextInputEvent::StoppedTyping(self.value.clone()));
        }
        None
    }
}
