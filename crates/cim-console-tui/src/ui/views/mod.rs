//! Screen content for each view.
//!
//! List screens show "Loading..." until their rows arrive. Detail screens
//! show the editable fields of one record, followed by read-only extras.

pub mod dashboard;
pub mod groups;
pub mod policies;
pub mod users;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use cim_console_core::views::Field;

use crate::app::{App, AppState};
use crate::ui::styles;

/// Render a list panel. `rows` is `None` while the list is loading.
pub(crate) fn render_list_panel(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    header: String,
    rows: Option<Vec<String>>,
) {
    let Some(rows) = rows else {
        render_loading(frame, area, title);
        return;
    };

    let block = Block::default()
        .title(format!(" {} ({}) ", title, rows.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if rows.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            format!("  No {} found", title.to_lowercase()),
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let mut items = vec![ListItem::new(Line::from(Span::styled(header, styles::highlight_style())))];
    items.extend(rows.into_iter().enumerate().map(|(i, row)| {
        let style = if i == app.selection {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        ListItem::new(Line::from(row)).style(style)
    }));

    let list = List::new(items).block(block);

    // Offset by one for the header row
    let mut state = ListState::default();
    state.select(Some(app.selection + 1));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Render a detail panel: one line per editable field, then `extra` lines.
pub(crate) fn render_detail_panel(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: String,
    values: Option<Vec<(Field, String)>>,
    extra: Vec<Line<'static>>,
) {
    let Some(values) = values else {
        render_loading(frame, area, &title);
        return;
    };

    let mut lines = vec![];
    for (i, (field, value)) in values.into_iter().enumerate() {
        let selected = i == app.selection;
        let editing = selected && app.state == AppState::Editing;
        let shown = if editing {
            format!("{}▌", app.edit_buffer)
        } else {
            value
        };
        let value_style = if editing {
            styles::input_style()
        } else if selected {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>13}: ", field.label()), styles::highlight_style()),
            Span::styled(shown, value_style),
        ]));
    }

    if !extra.is_empty() {
        lines.push(Line::from(""));
        lines.extend(extra);
    }

    if let Some(notice) = app.view().notice() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", notice),
            styles::success_style(),
        )));
    }

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// A muted label/value line for read-only record details
pub(crate) fn info_line(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:>13}: ", label), styles::muted_style()),
        Span::styled(value.into(), styles::list_item_style()),
    ])
}

fn render_loading(frame: &mut Frame, area: Rect, title: &str) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let paragraph = Paragraph::new(Line::from(Span::styled("  Loading...", styles::muted_style())))
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Truncate to `max` characters, marking the cut with an ellipsis
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate("ops", 10), "ops");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("operators", 5), "oper…");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }
}
