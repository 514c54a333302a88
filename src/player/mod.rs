pub mod dom;
pub mod dom_player;
pub mod scripted;
pub mod time;
pub mod traits;

pub use dom_player::DomPlayer;
pub use scripted::ScriptedPlayer;
pub use time::{format_time, parse_time_string};
pub use traits::{Player, PlayerStatus};
