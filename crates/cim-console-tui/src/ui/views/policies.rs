use ratatui::{
    layout::Rect,
    text::{Line, Span},
    Frame,
};

use cim_console_core::models::{Effect, Policy, ResourceKind, Statement};
use cim_console_core::views::{DetailView, Editable, ListView};

use super::{info_line, render_detail_panel, render_list_panel, truncate};
use crate::app::App;
use crate::ui::styles;

pub fn render_list(frame: &mut Frame, app: &App, list: &ListView<Policy>, area: Rect) {
    let rows = list.items().map(|policies| {
        policies
            .iter()
            .map(|p| format!("{:<24} {}", truncate(&p.id, 24), p.desc))
            .collect()
    });
    let header = format!("{:<24} {}", "ID", "Description");
    render_list_panel(frame, app, area, ResourceKind::Policies.plural(), header, rows);
}

pub fn render_detail(frame: &mut Frame, app: &App, detail: &DetailView<Policy>, area: Rect) {
    let values = detail.record().map(|policy| {
        Policy::FIELDS
            .iter()
            .map(|f| (*f, policy.field(*f)))
            .collect()
    });

    let mut extra = vec![info_line("ID", detail.id())];
    if let Some(policy) = detail.record() {
        if !policy.version.is_empty() {
            extra.push(info_line("Version", policy.version.clone()));
        }
        extra.push(info_line("Statements", policy.statement_summary()));
        for statement in &policy.statement {
            extra.extend(statement_lines(statement));
        }
    }

    render_detail_panel(frame, app, area, format!("Policy {}", detail.id()), values, extra);
}

fn statement_lines(statement: &Statement) -> Vec<Line<'static>> {
    let (label, style) = match statement.effect {
        Effect::Allow => ("allow", styles::allow_style()),
        Effect::Deny => ("deny", styles::deny_style()),
    };
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![Span::raw("  "), Span::styled(label, style)]),
        info_line("Subjects", statement.subjects.join(", ")),
        info_line("Actions", statement.actions.join(", ")),
        info_line("Resources", statement.resources.join(", ")),
    ];
    if let Some(conditions) = statement.conditions.as_ref().filter(|c| !c.is_empty()) {
        let mut keys: Vec<&str> = conditions.keys().map(String::as_str).collect();
        keys.sort_unstable();
        lines.push(info_line("Conditions", keys.join(", ")));
    }
    lines
}
