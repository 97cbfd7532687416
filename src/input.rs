//! Key bindings: arrows and vim-style hjkl.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    /// Pick the cell under the cursor.
    Pick,
    Hint,
    Pause,
    NextLevel,
    Restart,
    Quit,
    None,
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Pick,
        KeyCode::Tab | KeyCode::Char('?') => Action::Hint,
        KeyCode::Char('n') => Action::NextLevel,
        KeyCode::Char('r') => Action::Restart,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_movement_keys() {
        assert_eq!(key_to_action(key(KeyCode::Left, KeyModifiers::NONE)), Action::Left);
        assert_eq!(key_to_action(key(KeyCode::Char('l'), KeyModifiers::NONE)), Action::Right);
        assert_eq!(key_to_action(key(KeyCode::Char('k'), KeyModifiers::NONE)), Action::Up);
        assert_eq!(key_to_action(key(KeyCode::Down, KeyModifiers::NONE)), Action::Down);
    }

    #[test]
    fn test_game_keys() {
        assert_eq!(key_to_action(key(KeyCode::Char(' '), KeyModifiers::NONE)), Action::Pick);
        assert_eq!(key_to_action(key(KeyCode::Char('?'), KeyModifiers::SHIFT)), Action::Hint);
        assert_eq!(key_to_action(key(KeyCode::Char('n'), KeyModifiers::NONE)), Action::NextLevel);
        assert_eq!(key_to_action(key(KeyCode::Esc, KeyModifiers::NONE)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Char('r'), KeyModifiers::ALT)), Action::None);
    }
}
