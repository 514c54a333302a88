use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub struct MainLayout {
    pub body_area: Rect,
    pub footer_area: Rect,
}

pub fn get_main_layout(area: Rect) -> MainLayout {
    // Footer needs 1 line at the bottom always
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Footer
        ])
        .split(area);

    MainLayout {
        body_area: chunks[0],
        footer_area: chunks[1],
    }
}

pub struct ContentLayout {
    /// The simulated web page with its player bar.
    pub page: Rect,
    /// The extension popup.
    pub popup: Rect,
    pub is_horizontal: bool,
}

/// Page and popup side by side when there is room, stacked otherwise.
pub fn get_content_layout(area: Rect) -> ContentLayout {
    if area.width >= 90 {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Min(30)])
            .split(area);
        ContentLayout {
            page: chunks[0],
            popup: chunks[1],
            is_horizontal: true,
        }
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(11)])
            .split(area);
        ContentLayout {
            page: chunks[0],
            popup: chunks[1],
            is_horizontal: false,
        }
    }
}
