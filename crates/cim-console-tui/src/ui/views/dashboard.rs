use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, Tab};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let name = app
        .console
        .session()
        .user()
        .map(|u| u.display_name().to_string())
        .unwrap_or_default();

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Signed in as "),
            Span::styled(name, styles::highlight_style()),
        ]),
        Line::from(Span::styled(
            format!("  {}", app.console.api().base_url()),
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    for (i, tab) in Tab::ALL.iter().enumerate().skip(1) {
        lines.push(Line::from(vec![
            Span::styled(format!("  [{}] ", i + 1), styles::help_key_style()),
            Span::styled(format!("Manage {}", tab.title().to_lowercase()), styles::help_desc_style()),
        ]));
    }

    let block = Block::default()
        .title(" Dashboard ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
