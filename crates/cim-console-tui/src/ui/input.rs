//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_field_char, can_add_password_char, can_add_path_char, can_add_username_char, App,
    AppState, LoginFocus, Tab, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if app.is_login_view() {
        return handle_login_input(app, key).await;
    }

    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::EnteringPath => {
            handle_path_input(app, key);
            return Ok(false);
        }
        AppState::Editing => {
            handle_edit_input(app, key);
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char(':') => app.start_path_entry(),
        KeyCode::Char('L') => app.logout(),
        KeyCode::Char('1') => app.switch_tab(Tab::Dashboard),
        KeyCode::Char('2') => app.switch_tab(Tab::Users),
        KeyCode::Char('3') => app.switch_tab(Tab::Groups),
        KeyCode::Char('4') => app.switch_tab(Tab::Policies),
        KeyCode::Left => {
            if let Some(tab) = app.current_tab() {
                app.switch_tab(tab.prev());
            }
        }
        KeyCode::Right => {
            if let Some(tab) = app.current_tab() {
                app.switch_tab(tab.next());
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(1),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(1),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),
        _ => handle_view_input(app, key),
    }

    Ok(false)
}

/// Keys that only mean something on a particular kind of view
fn handle_view_input(app: &mut App, key: KeyEvent) {
    if app.view().list_kind().is_some() {
        match key.code {
            KeyCode::Enter => app.open_selected(),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
            _ => {}
        }
    } else if app.view().detail_target().is_some() {
        match key.code {
            KeyCode::Enter | KeyCode::Char('e') => app.start_edit(),
            KeyCode::Char('s') => app.save(),
            _ => {}
        }
    }
}

fn handle_edit_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Enter => app.commit_edit(),
        KeyCode::Backspace => {
            app.edit_buffer.pop();
        }
        KeyCode::Char(c) => {
            if can_add_field_char(app.edit_buffer.chars().count(), c) {
                app.edit_buffer.push(c);
            }
        }
        _ => {}
    }
}

fn handle_path_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.path_input.clear();
            app.state = AppState::Normal;
        }
        KeyCode::Enter => app.submit_path(),
        KeyCode::Backspace => {
            app.path_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_path_char(app.path_input.chars().count(), c) {
                app.path_input.push(c);
            }
        }
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                // Failures land in login_error
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cim_console_core::storage::{TOKEN_KEY, USER_KEY};
    use cim_console_core::{Config, MemoryStorage, Storage};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn signed_in_app() -> App {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "abc123").unwrap();
        storage.set(USER_KEY, r#"{"name":"Alice"}"#).unwrap();
        let mut app = App::new(Config::default(), storage).unwrap();
        app.navigate("/dashboard");
        app
    }

    #[tokio::test]
    async fn test_login_typing_fills_focused_field() {
        let mut app = App::new(Config::default(), Arc::new(MemoryStorage::new())).unwrap();
        app.navigate("/dashboard");

        for c in "bob".chars() {
            handle_input(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
        handle_input(&mut app, key(KeyCode::Char('x'))).await.unwrap();

        assert_eq!(app.login_username, "bob");
        assert_eq!(app.login_password, "x");
        assert_eq!(app.login_focus, LoginFocus::Password);
    }

    #[tokio::test]
    async fn test_username_limit_counts_characters() {
        let mut app = App::new(Config::default(), Arc::new(MemoryStorage::new())).unwrap();
        app.navigate("/dashboard");

        // 60 two-byte characters; only the first 50 fit
        for _ in 0..60 {
            handle_input(&mut app, key(KeyCode::Char('é'))).await.unwrap();
        }
        assert_eq!(app.login_username.chars().count(), 50);
    }

    #[tokio::test]
    async fn test_escape_on_login_quits() {
        let mut app = App::new(Config::default(), Arc::new(MemoryStorage::new())).unwrap();
        app.navigate("/dashboard");
        assert!(handle_input(&mut app, key(KeyCode::Esc)).await.unwrap());
    }

    #[tokio::test]
    async fn test_number_keys_switch_tabs() {
        let mut app = signed_in_app();
        handle_input(&mut app, key(KeyCode::Char('3'))).await.unwrap();
        assert_eq!(app.current_tab(), Some(Tab::Groups));
        handle_input(&mut app, key(KeyCode::Right)).await.unwrap();
        assert_eq!(app.current_tab(), Some(Tab::Policies));
        handle_input(&mut app, key(KeyCode::Char('1'))).await.unwrap();
        assert_eq!(app.current_tab(), Some(Tab::Dashboard));
    }

    #[tokio::test]
    async fn test_quit_requires_confirmation() {
        let mut app = signed_in_app();
        assert!(!handle_input(&mut app, key(KeyCode::Char('q'))).await.unwrap());
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(!handle_input(&mut app, key(KeyCode::Char('n'))).await.unwrap());
        assert_eq!(app.state, AppState::Normal);
        handle_input(&mut app, key(KeyCode::Char('q'))).await.unwrap();
        assert!(handle_input(&mut app, key(KeyCode::Char('y'))).await.unwrap());
    }

    #[tokio::test]
    async fn test_path_prompt() {
        let mut app = signed_in_app();
        handle_input(&mut app, key(KeyCode::Char(':'))).await.unwrap();
        app.path_input.clear();
        for c in "/users".chars() {
            handle_input(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.current_tab(), Some(Tab::Users));
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_shift_l_logs_out() {
        let mut app = signed_in_app();
        handle_input(&mut app, key(KeyCode::Char('L'))).await.unwrap();
        assert!(app.is_login_view());
    }
}
