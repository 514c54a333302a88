pub mod player_bar;
pub mod popup_panel;
pub mod toast;
