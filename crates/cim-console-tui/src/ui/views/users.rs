use ratatui::{layout::Rect, Frame};

use cim_console_core::models::{ResourceKind, User};
use cim_console_core::views::{DetailView, Editable, ListView};

use super::{info_line, render_detail_panel, render_list_panel, truncate};
use crate::app::App;

pub fn render_list(frame: &mut Frame, app: &App, list: &ListView<User>, area: Rect) {
    let rows = list.items().map(|users| {
        users
            .iter()
            .map(|u| {
                format!(
                    "{:<24} {:<20} {}",
                    truncate(&u.id, 24),
                    truncate(u.display_name(), 20),
                    u.email.as_deref().unwrap_or("")
                )
            })
            .collect()
    });
    let header = format!("{:<24} {:<20} {}", "ID", "Name", "Email");
    render_list_panel(frame, app, area, ResourceKind::Users.plural(), header, rows);
}

pub fn render_detail(frame: &mut Frame, app: &App, detail: &DetailView<User>, area: Rect) {
    let values = detail.record().map(|user| {
        User::FIELDS
            .iter()
            .map(|f| (*f, user.field(*f)))
            .collect()
    });

    let mut extra = vec![info_line("ID", detail.id())];
    if let Some(user) = detail.record() {
        if !user.account_id.is_empty() {
            extra.push(info_line("Account", user.account_id.clone()));
        }
        if let Some(created) = user.created_at {
            extra.push(info_line("Created", created.format("%Y-%m-%d %H:%M").to_string()));
        }
    }

    render_detail_panel(frame, app, area, format!("User {}", detail.id()), values, extra);
}
