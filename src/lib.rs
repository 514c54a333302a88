pub mod app;
pub mod background;
pub mod clock;
pub mod content;
pub mod error;
pub mod looper;
pub mod messaging;
pub mod player;
pub mod popup;
pub mod storage;
pub mod ui;
