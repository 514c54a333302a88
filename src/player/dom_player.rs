use super::dom::{HostPage, PlayerReader, SeekActuator};
use super::traits::Player;
use std::sync::Arc;

/// A web player driven purely through its DOM: reads via the reader, seeks
/// via the range-input actuator.
#[derive(Clone)]
pub struct DomPlayer {
    reader: PlayerReader,
    actuator: SeekActuator,
}

impl DomPlayer {
    pub fn new(page: Arc<dyn HostPage>) -> Self {
        Self {
            reader: PlayerReader::new(page.clone()),
            actuator: SeekActuator::new(page),
        }
    }

    pub fn reader(&self) -> &PlayerReader {
        &self.reader
    }
}

impl Player for DomPlayer {
    fn position(&self) -> f64 {
        self.reader.read_position()
    }

    fn duration(&self) -> f64 {
        self.reader.read_duration()
    }

    fn track_name(&self) -> String {
        self.reader.read_track_name()
    }

    fn is_playing(&self) -> bool {
        self.reader.is_playing()
    }

    fn seek_to(&self, target_secs: f64) -> bool {
        self.actuator.seek_to(target_secs)
    }

    fn is_ready(&self) -> bool {
        self.reader.progress_bar().is_some()
    }
}
