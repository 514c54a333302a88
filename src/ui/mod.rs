pub mod components;
pub mod layout;
pub mod theme;

pub use theme::Theme;

use crate::app::App;
use ratatui::layout::Alignment;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub fn ui(f: &mut Frame, app: &App) {
    let area = f.area();

    // 1. Layout
    let main_layout = layout::get_main_layout(area);
    let content_layout = layout::get_content_layout(main_layout.body_area);

    // 2. Page with its player bar, then the popup
    components::player_bar::render(f, content_layout.page, app);
    components::popup_panel::render(f, content_layout.popup, app);

    // 3. Footer hint
    let theme = &app.theme;
    let keys = &app.keys;
    let key = |k: &str| {
        Span::styled(
            format!(" {} ", keys.display(k)),
            Style::default().fg(theme.muted).add_modifier(Modifier::BOLD),
        )
    };
    let text = |t: &'static str| Span::styled(t, Style::default().fg(theme.muted));
    let hint = Line::from(vec![
        key(&keys.click_a),
        key(&keys.click_b),
        key(&keys.click_loop),
        text("page buttons "),
        key(&keys.play_pause),
        text("play "),
        key(&keys.reload),
        text("reload "),
        key(&keys.quit),
        text("quit"),
    ]);
    let footer = Paragraph::new(hint).alignment(Alignment::Right);
    f.render_widget(footer, main_layout.footer_area);

    // 4. Overlays
    components::toast::render(f, app);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::UserConfig;
    use crate::clock::SystemClock;
    use crate::player::dom::SimulatedPage;
    use crate::storage::MemoryStorage;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_render_smoke() {
        let clock = SystemClock::shared();
        let page = SimulatedPage::new(clock.clone(), "Smoke Test", 180.0);
        let mut app = App::new(
            &UserConfig::default(),
            Theme::default(),
            page,
            Arc::new(MemoryStorage::new()),
            clock,
        )
        .await;
        app.show_toast("hello");

        for (width, height) in [(120, 30), (60, 30), (20, 6)] {
            let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
            terminal.draw(|f| ui(f, &app)).unwrap();
        }

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| ui(f, &app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("A-B Loop"));
        assert!(text.contains("Not set"));
        assert!(text.contains("Smoke Test"));
    }
}
