//! Key mapping.
//!
//! Translates crossterm key events into app actions. While the name-entry
//! overlay is open, printable keys go to the name instead of the game.

use crate::snake::SnakeInput;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Game(SnakeInput),
    ToggleTheme,
    Quit,
    NameChar(char),
    NameBackspace,
    NameSubmit,
    NameCancel,
    None,
}

/// Map a key event. `naming` is true while the name-entry overlay is open.
pub fn map_key(key: KeyEvent, naming: bool) -> AppAction {
    if key.kind == KeyEventKind::Release {
        return AppAction::None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return AppAction::Quit;
    }

    if naming {
        return match key.code {
            KeyCode::Enter => AppAction::NameSubmit,
            KeyCode::Esc => AppAction::NameCancel,
            KeyCode::Backspace => AppAction::NameBackspace,
            KeyCode::Char(c) => AppAction::NameChar(c),
            _ => AppAction::None,
        };
    }

    let input = match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => SnakeInput::Up,
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => SnakeInput::Down,
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => SnakeInput::Left,
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => SnakeInput::Right,
        KeyCode::Enter | KeyCode::Char(' ') => SnakeInput::Select,
        KeyCode::Esc | KeyCode::Char('p') | KeyCode::Char('P') => SnakeInput::Pause,
        KeyCode::Char('t') | KeyCode::Char('T') => return AppAction::ToggleTheme,
        KeyCode::Char('q') | KeyCode::Char('Q') => return AppAction::Quit,
        _ => SnakeInput::Other,
    };
    AppAction::Game(input)
}
