use ratatui::{layout::Rect, Frame};

use cim_console_core::models::{Group, ResourceKind};
use cim_console_core::views::{DetailView, Editable, ListView};

use super::{info_line, render_detail_panel, render_list_panel, truncate};
use crate::app::App;

pub fn render_list(frame: &mut Frame, app: &App, list: &ListView<Group>, area: Rect) {
    let rows = list.items().map(|groups| {
        groups
            .iter()
            .map(|g| format!("{:<24} {}", truncate(&g.id, 24), g.name))
            .collect()
    });
    let header = format!("{:<24} {}", "ID", "Name");
    render_list_panel(frame, app, area, ResourceKind::Groups.plural(), header, rows);
}

pub fn render_detail(frame: &mut Frame, app: &App, detail: &DetailView<Group>, area: Rect) {
    let values = detail.record().map(|group| {
        Group::FIELDS
            .iter()
            .map(|f| (*f, group.field(*f)))
            .collect()
    });

    let mut extra = vec![info_line("ID", detail.id())];
    if let Some(group) = detail.record().filter(|g| !g.desc.is_empty()) {
        extra.push(info_line("Description", group.desc.clone()));
    }

    render_detail_panel(frame, app, area, format!("Group {}", detail.id()), values, extra);
}
