//! Keyboard state latched once per frame.
//!
//! Window events arrive between frames and are queued. `update()` (called by
//! the director at the start of every frame) moves the queued edges into the
//! frame-visible set, so every scene stepped in that frame sees the same
//! state and nothing is older than one frame.
//!
//! - **Held:** `is_held(key)` is true every frame the key is physically down.
//! - **Pressed / released:** true only for the frame after the edge happened.
//! - **Repeated:** true for the frame after an OS auto-repeat event for a key
//!   that is already held.

use std::collections::HashSet;

use crate::host::InputPoller;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Enter,
    Escape,
    Space,
    Tab,
    Ctrl,
    E,
    P,
    S,
}

#[derive(Default)]
pub struct InputState {
    held: HashSet<Key>,

    queued_pressed: HashSet<Key>,
    queued_released: HashSet<Key>,
    queued_repeated: HashSet<Key>,

    pressed: HashSet<Key>,
    released: HashSet<Key>,
    repeated: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key-down event. `repeat` marks OS auto-repeat.
    pub fn key_down(&mut self, key: Key, repeat: bool) {
        if repeat {
            if self.held.contains(&key) {
                self.queued_repeated.insert(key);
            }
            return;
        }
        if self.held.insert(key) {
            self.queued_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.queued_released.insert(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_released(&self, key: Key) -> bool {
        self.released.contains(&key)
    }

    /// Drop the held state, e.g. when the window loses focus.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl InputPoller for InputState {
    fn update(&mut self) {
        self.pressed = std::mem::take(&mut self.queued_pressed);
        self.released = std::mem::take(&mut self.queued_released);
        self.repeated = std::mem::take(&mut self.queued_repeated);
    }

    fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    fn is_repeated(&self, key: Key) -> bool {
        self.repeated.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_is_visible_only_after_update() {
        let mut input = InputState::new();
        input.key_down(Key::P, false);
        assert!(input.is_held(Key::P));
        assert!(!input.is_pressed(Key::P));

        input.update();
        assert!(input.is_pressed(Key::P));
    }

    #[test]
    fn test_press_lasts_exactly_one_frame() {
        let mut input = InputState::new();
        input.key_down(Key::E, false);
        input.update();
        assert!(input.is_pressed(Key::E));
        input.update();
        assert!(!input.is_pressed(Key::E));
        // Held state persists across frames.
        assert!(input.is_held(Key::E));
    }

    #[test]
    fn test_key_down_repeat_does_not_double_press() {
        let mut input = InputState::new();
        input.key_down(Key::Left, false);
        input.update();
        // A second non-repeat down for a held key is ignored.
        input.key_down(Key::Left, false);
        input.update();
        assert!(!input.is_pressed(Key::Left));
        assert!(input.is_held(Key::Left));
    }

    #[test]
    fn test_auto_repeat_sets_repeated() {
        let mut input = InputState::new();
        input.key_down(Key::Down, false);
        input.update();
        input.key_down(Key::Down, true);
        input.update();
        assert!(input.is_repeated(Key::Down));
        assert!(!input.is_pressed(Key::Down));
        input.update();
        assert!(!input.is_repeated(Key::Down));
    }

    #[test]
    fn test_repeat_without_held_key_is_ignored() {
        let mut input = InputState::new();
        input.key_down(Key::Up, true);
        input.update();
        assert!(!input.is_repeated(Key::Up));
        assert!(!input.is_held(Key::Up));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::S);
        input.update();
        assert!(!input.is_released(Key::S));
        assert!(!input.is_held(Key::S));
    }

    #[test]
    fn test_key_up_sets_released_for_one_frame() {
        let mut input = InputState::new();
        input.key_down(Key::Space, false);
        input.key_up(Key::Space);
        input.update();
        assert!(!input.is_held(Key::Space));
        assert!(input.is_released(Key::Space));
        // The press that happened in the same frame is still reported.
        assert!(input.is_pressed(Key::Space));
        input.update();
        assert!(!input.is_released(Key::Space));
    }

    #[test]
    fn test_multiple_keys_independent() {
        let mut input = InputState::new();
        input.key_down(Key::P, false);
        input.key_down(Key::Ctrl, false);
        input.key_up(Key::P);
        input.update();
        assert!(!input.is_held(Key::P));
        assert!(input.is_held(Key::Ctrl));
        assert!(input.is_released(Key::P));
        assert!(!input.is_released(Key::Ctrl));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut input = InputState::new();
        input.key_down(Key::Enter, false);
        input.update();
        input.key_down(Key::Space, false);
        input.reset();
        assert!(!input.is_held(Key::Enter));
        assert!(!input.is_pressed(Key::Enter));

        // The queued press is gone too.
        input.update();
        assert!(!input.is_pressed(Key::Space));
    }
}
