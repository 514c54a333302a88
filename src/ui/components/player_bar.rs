use crate::app::App;
use crate::player::dom::{ButtonId, Markup};
use crate::player::format_time;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(Line::from(Span::styled(
            format!(" {} ", app.url),
            Style::default().fg(theme.info).add_modifier(Modifier::BOLD),
        )))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(theme.info))
        .style(Style::default().bg(Color::Reset));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Page body
            Constraint::Length(1), // Track
            Constraint::Length(1), // Gauge
            Constraint::Length(1), // Time
            Constraint::Length(1), // Controls
        ])
        .split(inner);

    let page = &app.page;
    if page.markup() == Markup::Loading {
        let loading = Paragraph::new("Loading player…")
            .style(Style::default().fg(theme.muted))
            .alignment(Alignment::Center);
        f.render_widget(loading, chunks[0]);
        return;
    }

    // 1. Track
    let width = chunks[1].width as usize;
    let track = Paragraph::new(Line::from(vec![
        Span::styled("♫ ", Style::default().fg(theme.highlight)),
        Span::styled(
            fit(&page.track_name(), width.saturating_sub(2)),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(track, chunks[1]);

    // 2. Gauge
    let position = page.position();
    let duration = page.duration();
    let ratio = if duration > 0.0 {
        (position / duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(theme.accent).bg(theme.surface))
        .ratio(ratio)
        .label("");
    f.render_widget(gauge, chunks[2]);

    // 3. Time
    let time = Paragraph::new(format!(
        "{} / {}",
        format_time(Some(position)),
        format_time(Some(duration))
    ))
    .style(Style::default().fg(theme.muted))
    .alignment(Alignment::Center);
    f.render_widget(time, chunks[3]);

    // 4. Controls row with the injected buttons around shuffle/repeat
    let mut spans = Vec::new();
    let injected = |id: ButtonId| {
        page.button(id).map(|view| {
            Span::styled(
                format!(" [{}] ", view.label),
                Style::default()
                    .fg(theme.css(&view.color))
                    .add_modifier(Modifier::BOLD),
            )
        })
    };
    spans.extend(injected(ButtonId::PointA));
    spans.push(Span::styled(" ⤮ ", Style::default().fg(theme.muted)));
    spans.push(Span::styled(
        if page.is_playing() { " ⏸ " } else { " ▶ " },
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(" ⟲ ", Style::default().fg(theme.muted)));
    spans.extend(injected(ButtonId::PointB));
    spans.push(Span::raw("   "));
    spans.extend(injected(ButtonId::LoopToggle));

    let controls = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    f.render_widget(controls, chunks[4]);
}

/// Cut `text` to `max` chars, ending in "…" when shortened.
fn fit(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
