use crate::app::App;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};
use std::time::Instant;

const SLIDE_MS: u128 = 300;

/// Horizontal offset of a toast `width` cells wide: eases in from the right
/// edge, holds, then eases back out before its deadline.
fn slide_offset(shown_ms: u128, left_ms: u128, width: u16) -> u16 {
    let hidden = if shown_ms < SLIDE_MS {
        let t = shown_ms as f32 / SLIDE_MS as f32;
        (1.0 - t).powi(3)
    } else if left_ms < SLIDE_MS {
        let t = 1.0 - left_ms as f32 / SLIDE_MS as f32;
        t.powi(3)
    } else {
        0.0
    };
    (width as f32 * hidden) as u16
}

/// Top-right notification. Expiry is `App::on_tick`'s job.
pub fn render(f: &mut Frame, app: &App) {
    let Some(toast) = &app.toast else {
        return;
    };
    let screen = f.area();
    let now = Instant::now();

    let width = (toast.message.chars().count() as u16 + 6).min(screen.width.saturating_sub(4));
    let shown_ms = now.duration_since(toast.start_time).as_millis();
    let left_ms = toast.deadline.saturating_duration_since(now).as_millis();
    let x = screen.width.saturating_sub(width + 1) + slide_offset(shown_ms, left_ms, width);
    if x >= screen.width {
        return;
    }

    let area = Rect::new(x, 1, width, 3).intersection(screen);
    if area.is_empty() {
        return;
    }

    let accent = Style::default().fg(app.theme.info);
    let body = Paragraph::new(Span::styled(
        toast.message.as_str(),
        accent.add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(accent),
    );

    f.render_widget(Clear, area);
    f.render_widget(body, area);
}
