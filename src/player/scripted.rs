use super::traits::Player;
use std::sync::{Mutex, MutexGuard};

struct Script {
    position: f64,
    duration: f64,
    track_name: String,
    playing: bool,
    accept_seeks: bool,
    // Whether an accepted seek moves the reported position
    follow_seeks: bool,
    seeks: Vec<f64>,
}

/// Player whose readings are set by hand and whose seeks are recorded 🧪
///
/// Stands in for the host page wherever the loop logic is exercised on its
/// own (tests, replays).
pub struct ScriptedPlayer {
    script: Mutex<Script>,
}

impl ScriptedPlayer {
    pub fn new(duration: f64) -> Self {
        Self {
            script: Mutex::new(Script {
                position: 0.0,
                duration,
                track_name: String::new(),
                playing: true,
                accept_seeks: true,
                follow_seeks: false,
                seeks: Vec::new(),
            }),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn set_position(&self, secs: f64) {
        self.script().position = secs;
    }

    pub fn set_playing(&self, playing: bool) {
        self.script().playing = playing;
    }

    pub fn set_track_name(&self, name: &str) {
        self.script().track_name = name.to_string();
    }

    pub fn set_accept_seeks(&self, accept: bool) {
        self.script().accept_seeks = accept;
    }

    /// Make accepted seeks move the reported position immediately.
    pub fn set_follow_seeks(&self, follow: bool) {
        self.script().follow_seeks = follow;
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.script().seeks.clone()
    }
}

impl Player for ScriptedPlayer {
    fn position(&self) -> f64 {
        self.script().position
    }

    fn duration(&self) -> f64 {
        self.script().duration
    }

    fn track_name(&self) -> String {
        self.script().track_name.clone()
    }

    fn is_playing(&self) -> bool {
        self.script().playing
    }

    fn seek_to(&self, target_secs: f64) -> bool {
        let mut s = self.script();
        s.seeks.push(target_secs);
        if s.accept_seeks && s.follow_seeks {
            s.position = target_secs;
        }
        s.accept_seeks
    }
}
