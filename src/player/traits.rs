use serde::{Deserialize, Serialize};

/// Snapshot answered to `GET_STATUS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub current_time: f64,
    pub track_name: String,
    pub is_playing: bool,
}

/// The capability set the loop monitor needs from any player 🎵
///
/// Every read is total: a player that cannot answer reports 0, an empty
/// string or `false`. `seek_to` only says whether a value was written,
/// not whether playback actually moved.
pub trait Player: Send + Sync {
    fn position(&self) -> f64;
    fn duration(&self) -> f64;
    fn track_name(&self) -> String;
    fn is_playing(&self) -> bool;
    fn seek_to(&self, target_secs: f64) -> bool;

    /// Whether the player UI has rendered far enough to be driven.
    fn is_ready(&self) -> bool {
        true
    }

    fn status(&self) -> PlayerStatus {
        PlayerStatus {
            current_time: self.position(),
            track_name: self.track_name(),
            is_playing: self.is_playing(),
        }
    }
}
