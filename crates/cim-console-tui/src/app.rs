//! Application state for the terminal console.
//!
//! `App` wraps the core `Console` and adds what only the terminal needs:
//! the login form, list selection, the field editor, and overlays.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use cim_console_core::models::ResourceKind;
use cim_console_core::views::{Field, View};
use cim_console_core::{ApiError, Config, Console, Route, Storage};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for an edited record field.
const MAX_FIELD_LENGTH: usize = 256;

/// Maximum length for a typed route path.
const MAX_PATH_LENGTH: usize = 128;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Users,
    Groups,
    Policies,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Dashboard, Tab::Users, Tab::Groups, Tab::Policies];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Users => "Users",
            Tab::Groups => "Groups",
            Tab::Policies => "Policies",
        }
    }

    pub fn route(&self) -> Route {
        match self {
            Tab::Dashboard => Route::Dashboard,
            Tab::Users => Route::List(ResourceKind::Users),
            Tab::Groups => Route::List(ResourceKind::Groups),
            Tab::Policies => Route::List(ResourceKind::Policies),
        }
    }

    /// The tab a route belongs to. Detail routes belong to their list's tab.
    pub fn for_route(route: &Route) -> Option<Self> {
        if !route.is_protected() {
            return None;
        }
        Some(match route.kind() {
            None => Tab::Dashboard,
            Some(ResourceKind::Users) => Tab::Users,
            Some(ResourceKind::Groups) => Tab::Groups,
            Some(ResourceKind::Policies) => Tab::Policies,
        })
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Users,
            Tab::Users => Tab::Groups,
            Tab::Groups => Tab::Policies,
            Tab::Policies => Tab::Dashboard,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Policies,
            Tab::Users => Tab::Dashboard,
            Tab::Groups => Tab::Users,
            Tab::Policies => Tab::Groups,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    EnteringPath,
    Editing,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub console: Console,
    pub config: Config,
    pub state: AppState,

    // Login form
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Row in a list view, or field in a detail view
    pub selection: usize,
    pub edit_buffer: String,
    pub path_input: String,

    pub status_message: Option<String>,
    seen_redirects: u64,
}

impl App {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Result<Self> {
        let console = Console::new(&Config::api_base_url(), storage)?;
        let login_username = config.last_username.clone().unwrap_or_default();

        Ok(Self {
            console,
            config,
            state: AppState::Normal,
            login_username,
            login_password: String::new(),
            login_focus: LoginFocus::Username,
            login_error: None,
            selection: 0,
            edit_buffer: String::new(),
            path_input: String::new(),
            status_message: None,
            seen_redirects: 0,
        })
    }

    pub fn view(&self) -> &View {
        self.console.view()
    }

    pub fn is_login_view(&self) -> bool {
        matches!(self.console.view(), View::Login { .. })
    }

    pub fn current_tab(&self) -> Option<Tab> {
        Tab::for_route(self.console.route())
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn navigate(&mut self, path: &str) {
        self.console.navigate(path);
        self.after_navigation();
    }

    pub fn navigate_to(&mut self, route: Route) {
        self.console.navigate_to(route);
        self.after_navigation();
    }

    fn after_navigation(&mut self) {
        self.selection = 0;
        self.state = AppState::Normal;
        if self.is_login_view() {
            self.start_login();
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.navigate_to(tab.route());
    }

    /// Open the row under the cursor in its detail view
    pub fn open_selected(&mut self) {
        let Some(kind) = self.view().list_kind() else {
            return;
        };
        if let Some(id) = self.view().row_id(self.selection).map(str::to_string) {
            self.navigate_to(Route::Detail(kind, id));
        }
    }

    /// Detail views go back to their list, lists go back to the dashboard.
    pub fn go_back(&mut self) {
        let target = match self.console.route() {
            Route::Detail(kind, _) => Route::List(*kind),
            Route::List(_) => Route::Dashboard,
            _ => return,
        };
        self.navigate_to(target);
    }

    pub fn start_path_entry(&mut self) {
        self.path_input = self.console.route().path();
        self.state = AppState::EnteringPath;
    }

    pub fn submit_path(&mut self) {
        let path = std::mem::take(&mut self.path_input);
        self.navigate(path.trim());
    }

    pub fn select_next(&mut self, step: usize) {
        let count = self.selectable_count();
        if count > 0 {
            self.selection = (self.selection + step).min(count - 1);
        }
    }

    pub fn select_prev(&mut self, step: usize) {
        self.selection = self.selection.saturating_sub(step);
    }

    fn selectable_count(&self) -> usize {
        match self.view() {
            View::User(_) | View::Group(_) | View::Policy(_) => self.view().fields().len(),
            view => view.row_count(),
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn start_login(&mut self) {
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
    }

    pub async fn attempt_login(&mut self) -> Result<()> {
        let username = self.login_username.clone();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return Err(anyhow::anyhow!("Username and password required"));
        }

        self.login_error = None;

        match self.console.login(&username, &password).await {
            Ok(user) => {
                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.login_password.clear();
                self.selection = 0;
                self.state = AppState::Normal;
                self.status_message = Some(format!("Signed in as {}", user.display_name()));
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(login_error_message(&e));
                Err(e)
            }
        }
    }

    pub fn logout(&mut self) {
        self.console.logout();
        self.login_password.clear();
        self.login_error = None;
        self.status_message = Some("Signed out".to_string());
        self.after_navigation();
    }

    // =========================================================================
    // Record actions
    // =========================================================================

    pub fn delete_selected(&mut self) {
        let Some(id) = self.view().row_id(self.selection).map(str::to_string) else {
            return;
        };
        if self.console.delete_item(&id) {
            self.status_message = Some(format!("Deleting {}...", id));
        }
    }

    pub fn selected_field(&self) -> Option<Field> {
        self.view().fields().get(self.selection).copied()
    }

    pub fn start_edit(&mut self) {
        let Some(field) = self.selected_field() else {
            return;
        };
        if let Some(value) = self.view().field_value(field) {
            self.edit_buffer = value;
            self.state = AppState::Editing;
        }
    }

    pub fn commit_edit(&mut self) {
        if let Some(field) = self.selected_field() {
            let value = std::mem::take(&mut self.edit_buffer);
            self.console.set_field(field, value);
        }
        self.state = AppState::Normal;
    }

    pub fn cancel_edit(&mut self) {
        self.edit_buffer.clear();
        self.state = AppState::Normal;
    }

    pub fn save(&mut self) {
        if self.console.save_detail() {
            self.status_message = Some("Saving...".to_string());
        }
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Apply finished requests. Called once per frame.
    pub fn tick(&mut self) {
        if self.console.poll() == 0 {
            return;
        }

        if self.console.login_redirects() != self.seen_redirects {
            self.seen_redirects = self.console.login_redirects();
            info!("Session rejected by server");
            self.login_password.clear();
            self.login_error = Some("Your session has expired. Please sign in again.".to_string());
            self.status_message = None;
            self.after_navigation();
            return;
        }

        let count = self.selectable_count();
        if self.selection >= count {
            self.selection = count.saturating_sub(1);
        }
        if let Some(notice) = self.view().notice() {
            self.status_message = Some(notice.to_string());
        } else if matches!(self.status_message.as_deref(), Some(m) if m.starts_with("Deleting")) {
            self.status_message = None;
        }
    }
}

/// Turn a login failure into something a person can act on.
pub fn login_error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Unauthorized) | Some(ApiError::AccessDenied(_)) => {
            "Invalid username or password".to_string()
        }
        Some(ApiError::NetworkError(e)) if e.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        Some(ApiError::NetworkError(_)) => {
            "Unable to connect to server. Check CIM_API_URL.".to_string()
        }
        Some(ApiError::RateLimited) => "Too many attempts. Please wait and try again.".to_string(),
        _ => format!("Login failed: {}", err),
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_path_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PATH_LENGTH && !c.is_whitespace() && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cim_console_core::storage::{TOKEN_KEY, USER_KEY};
    use cim_console_core::MemoryStorage;

    fn app_with(storage: Arc<MemoryStorage>) -> App {
        App::new(Config::default(), storage).unwrap()
    }

    fn signed_in_storage() -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "abc123").unwrap();
        storage.set(USER_KEY, r#"{"name":"Alice"}"#).unwrap();
        storage
    }

    // -------------------------------------------------------------------------
    // Tab Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tab_cycle_wraps() {
        let mut tab = Tab::Dashboard;
        for _ in 0..Tab::ALL.len() {
            tab = tab.next();
        }
        assert_eq!(tab, Tab::Dashboard);
        assert_eq!(Tab::Dashboard.prev(), Tab::Policies);
    }

    #[test]
    fn test_tab_for_route() {
        assert_eq!(Tab::for_route(&Route::Login), None);
        assert_eq!(
            Tab::for_route(&Route::Detail(ResourceKind::Groups, "g1".to_string())),
            Some(Tab::Groups)
        );
        for tab in Tab::ALL {
            assert_eq!(Tab::for_route(&tab.route()), Some(tab));
        }
    }

    // -------------------------------------------------------------------------
    // Navigation Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_signed_out_app_shows_login_form() {
        let mut app = app_with(Arc::new(MemoryStorage::new()));
        app.navigate("/dashboard");

        assert!(app.is_login_view());
        assert_eq!(app.current_tab(), None);
        assert_eq!(app.login_focus, LoginFocus::Username);
    }

    #[tokio::test]
    async fn test_login_form_focuses_password_for_known_user() {
        let config = Config {
            last_username: Some("alice".to_string()),
            ..Default::default()
        };
        let mut app = App::new(config, Arc::new(MemoryStorage::new())).unwrap();
        app.navigate("/users");

        assert_eq!(app.login_username, "alice");
        assert_eq!(app.login_focus, LoginFocus::Password);
    }

    #[tokio::test]
    async fn test_path_entry_navigates() {
        let mut app = app_with(signed_in_storage());
        app.navigate("/dashboard");

        app.start_path_entry();
        assert_eq!(app.state, AppState::EnteringPath);
        assert_eq!(app.path_input, "/dashboard");

        app.path_input = "/groups/g1".to_string();
        app.submit_path();

        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.current_tab(), Some(Tab::Groups));
        assert!(matches!(app.view(), View::Group(_)));
    }

    #[tokio::test]
    async fn test_go_back_walks_up() {
        let mut app = app_with(signed_in_storage());
        app.navigate("/policies/p1");

        app.go_back();
        assert_eq!(app.console.route(), &Route::List(ResourceKind::Policies));
        app.go_back();
        assert_eq!(app.console.route(), &Route::Dashboard);
        app.go_back();
        assert_eq!(app.console.route(), &Route::Dashboard);
    }

    #[tokio::test]
    async fn test_logout_returns_to_login() {
        let mut app = app_with(signed_in_storage());
        app.navigate("/dashboard");
        assert!(!app.is_login_view());

        app.logout();

        assert!(app.is_login_view());
        assert_eq!(app.status_message.as_deref(), Some("Signed out"));
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected_locally() {
        let mut app = app_with(Arc::new(MemoryStorage::new()));
        app.navigate("/dashboard");

        assert!(app.attempt_login().await.is_err());
        assert_eq!(app.login_error.as_deref(), Some("Username and password required"));
    }

    #[test]
    fn test_selection_stays_zero_without_rows() {
        let mut app = app_with(Arc::new(MemoryStorage::new()));
        app.select_next(PAGE_SCROLL_SIZE);
        assert_eq!(app.selection, 0);
        app.select_prev(1);
        assert_eq!(app.selection, 0);
    }

    // -------------------------------------------------------------------------
    // Error Message Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_login_error_messages() {
        let unauthorized = anyhow::Error::new(ApiError::Unauthorized);
        assert_eq!(login_error_message(&unauthorized), "Invalid username or password");

        let limited = anyhow::Error::new(ApiError::RateLimited);
        assert!(login_error_message(&limited).contains("Too many attempts"));

        let other = anyhow::anyhow!("disk full");
        assert_eq!(login_error_message(&other), "Login failed: disk full");
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_username_length_limit() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(MAX_USERNAME_LENGTH - 1, 'a'));
        assert!(!can_add_username_char(MAX_USERNAME_LENGTH, 'a'));
    }

    #[test]
    fn test_password_accepts_symbols() {
        assert!(can_add_password_char(0, '!'));
        assert!(can_add_password_char(0, ' '));
        assert!(!can_add_password_char(MAX_PASSWORD_LENGTH, 'x'));
    }

    #[test]
    fn test_control_chars_rejected() {
        assert!(!can_add_username_char(0, '\n'));
        assert!(!can_add_field_char(0, '\t'));
        assert!(!can_add_path_char(0, '\u{7}'));
    }

    #[test]
    fn test_path_rejects_whitespace() {
        assert!(can_add_path_char(0, '/'));
        assert!(!can_add_path_char(0, ' '));
        assert!(!can_add_path_char(MAX_PATH_LENGTH, 'a'));
    }
}
