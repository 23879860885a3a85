//! Key bindings: arrows, vim-style and z/x.

use crate::scene::DirectionListener;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
    Release,
    Pause,
    Restart,
    Quit,
    None,
}

impl Action {
    /// Forwards a directional action; returns false for anything else.
    pub fn direct(self, listener: &mut impl DirectionListener) -> bool {
        match self {
            Self::MoveLeft => listener.move_left(),
            Self::MoveRight => listener.move_right(),
            Self::RotateCw => listener.rotate_clockwise(),
            Self::RotateCcw => listener.rotate_counter_clockwise(),
            Self::Release => listener.release_control(),
            _ => return false,
        }
        true
    }
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k' | 'x') => Action::RotateCw,
        KeyCode::Char('u' | 'z') => Action::RotateCcw,
        KeyCode::Down | KeyCode::Char('j' | ' ') | KeyCode::Enter => Action::Release,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Action {
        key_to_action(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_bindings() {
        assert_eq!(press(KeyCode::Left), Action::MoveLeft);
        assert_eq!(press(KeyCode::Char('l')), Action::MoveRight);
        assert_eq!(press(KeyCode::Char('x')), Action::RotateCw);
        assert_eq!(press(KeyCode::Char('z')), Action::RotateCcw);
        assert_eq!(press(KeyCode::Char(' ')), Action::Release);
        assert_eq!(press(KeyCode::Char('r')), Action::Restart);
        assert_eq!(press(KeyCode::Char('a')), Action::None);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('h'), KeyModifiers::ALT)),
            Action::None
        );
    }

    #[derive(Default)]
    struct Calls(Vec<&'static str>);

    impl DirectionListener for Calls {
        fn move_left(&mut self) {
            self.0.push("left");
        }
        fn move_right(&mut self) {
            self.0.push("right");
        }
        fn rotate_clockwise(&mut self) {
            self.0.push("cw");
        }
        fn rotate_counter_clockwise(&mut self) {
            self.0.push("ccw");
        }
        fn release_control(&mut self) {
            self.0.push("release");
        }
    }

    #[test]
    fn test_direct() {
        let mut calls = Calls::default();
        assert!(Action::RotateCcw.direct(&mut calls));
        assert!(Action::Release.direct(&mut calls));
        assert!(!Action::Pause.direct(&mut calls));
        assert_eq!(calls.0, vec!["ccw", "release"]);
    }
}
