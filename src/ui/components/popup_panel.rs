use crate::app::App;
use crate::popup::NOT_SET;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

/// The extension popup: loop switch, points, live status.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let view = app.popup.view();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(Line::from(Span::styled(
            " 🔁 A-B Loop ",
            Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD),
        )))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(theme.highlight))
        .style(Style::default().bg(Color::Reset));

    let label = |text: &'static str| Span::styled(text, Style::default().fg(theme.muted));
    let point_style = |value: &str| {
        if value == NOT_SET {
            Style::default().fg(theme.muted)
        } else {
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
        }
    };

    let keys = &app.keys;
    let lines = vec![
        Line::from(vec![
            label("Loop      "),
            if view.loop_enabled {
                Span::styled("[x] on", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
            } else {
                Span::styled("[ ] off", Style::default().fg(theme.muted))
            },
        ]),
        Line::from(vec![
            label("Point A   "),
            Span::styled(view.point_a.clone(), point_style(&view.point_a)),
        ]),
        Line::from(vec![
            label("Point B   "),
            Span::styled(view.point_b.clone(), point_style(&view.point_b)),
        ]),
        Line::from(vec![
            label("Length    "),
            Span::styled(view.loop_length.clone(), Style::default().fg(theme.text)),
        ]),
        Line::from(vec![
            label("Now       "),
            Span::styled(view.current_time.clone(), Style::default().fg(theme.text)),
        ]),
        Line::from(vec![
            label("Track     "),
            Span::styled(view.track_name.clone(), Style::default().fg(theme.warning)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!(
                    "{} set A  {} set B  {} loop  {} clear",
                    keys.display(&keys.popup_set_a),
                    keys.display(&keys.popup_set_b),
                    keys.display(&keys.popup_toggle_loop),
                    keys.display(&keys.popup_clear),
                ),
                Style::default().fg(theme.muted),
            ),
        ]),
        Line::from(Span::styled(
            format!("{} jump to A", keys.display(&keys.popup_jump)),
            if view.jump_enabled {
                Style::default().fg(theme.info)
            } else {
                Style::default().fg(theme.surface)
            },
        )),
    ];

    let panel = Paragraph::new(lines).block(block);
    f.render_widget(panel, area);
}
