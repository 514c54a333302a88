use crate::error::StorageError;
use crate::storage::{Storage, StorageMap};
use serde::{Deserialize, Serialize};

pub const LOOP_STATE_KEY: &str = "loopState";
pub const PREFERENCES_KEY: &str = "preferences";

/// One of the two loop markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Point {
    A,
    B,
}

impl Point {
    pub fn label(self) -> &'static str {
        match self {
            Point::A => "A",
            Point::B => "B",
        }
    }
}

/// Persisted loop record, stored under `loopState`.
///
/// Points are unordered seconds; the loop window is `[min, max]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopState {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub point_a: Option<f64>,
    #[serde(default)]
    pub point_b: Option<f64>,
    /// Last observed position, display only.
    #[serde(default)]
    pub current_time: f64,
    /// Last observed track, display only.
    #[serde(default)]
    pub track_name: String,
}

/// What a point-button press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointToggle {
    /// The point was set and is now cleared; `disabled` if that stopped the loop.
    Cleared { disabled: bool },
    /// The point was unset and is now set; `auto_enabled` if that completed the pair.
    Set { auto_enabled: bool },
}

impl LoopState {
    pub fn point(&self, point: Point) -> Option<f64> {
        match point {
            Point::A => self.point_a,
            Point::B => self.point_b,
        }
    }

    fn point_mut(&mut self, point: Point) -> &mut Option<f64> {
        match point {
            Point::A => &mut self.point_a,
            Point::B => &mut self.point_b,
        }
    }

    pub fn has_both(&self) -> bool {
        self.point_a.is_some() && self.point_b.is_some()
    }

    /// `(start, end)` of the loop window when both points are set.
    pub fn window(&self) -> Option<(f64, f64)> {
        match (self.point_a, self.point_b) {
            (Some(a), Some(b)) => Some((a.min(b), a.max(b))),
            _ => None,
        }
    }

    pub fn loop_length(&self) -> Option<f64> {
        self.window().map(|(start, end)| end - start)
    }

    /// Enable when a previously incomplete pair just became complete.
    fn complete_pair(&mut self, was_complete: bool) -> bool {
        if !was_complete && self.has_both() && !self.enabled {
            self.enabled = true;
            return true;
        }
        false
    }

    /// Button semantics: clear a set point (stopping the loop, keeping the
    /// sibling), or set an unset one to `at` (starting the loop once both exist).
    pub fn toggle_point(&mut self, point: Point, at: f64) -> PointToggle {
        if self.point(point).is_some() {
            *self.point_mut(point) = None;
            let disabled = self.enabled;
            self.enabled = false;
            PointToggle::Cleared { disabled }
        } else {
            let was_complete = self.has_both();
            *self.point_mut(point) = Some(at);
            PointToggle::Set {
                auto_enabled: self.complete_pair(was_complete),
            }
        }
    }

    /// Overwrite one point. Returns whether this auto-enabled the loop.
    pub fn set_point(&mut self, point: Point, at: f64) -> bool {
        let was_complete = self.has_both();
        *self.point_mut(point) = Some(at);
        self.complete_pair(was_complete)
    }

    /// Overwrite both points. Returns whether this auto-enabled the loop.
    pub fn set_points(&mut self, point_a: Option<f64>, point_b: Option<f64>) -> bool {
        let was_complete = self.has_both();
        self.point_a = point_a;
        self.point_b = point_b;
        self.complete_pair(was_complete)
    }

    /// Explicit loop switch. Switching off always drops both points.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.point_a = None;
            self.point_b = None;
        }
    }

    /// Drop both points; a running loop stops. Returns whether it was running.
    pub fn clear_points(&mut self) -> bool {
        self.point_a = None;
        self.point_b = None;
        std::mem::replace(&mut self.enabled, false)
    }

    pub fn sync_state(&self) -> SyncState {
        SyncState {
            enabled: self.enabled,
            point_a: self.point_a,
            point_b: self.point_b,
        }
    }

    pub fn load(storage: &dyn Storage) -> Result<Option<LoopState>, StorageError> {
        let mut found = storage.get(&[LOOP_STATE_KEY])?;
        match found.remove(LOOP_STATE_KEY) {
            Some(value) if !value.is_null() => Ok(Some(serde_json::from_value(value)?)),
            _ => Ok(None),
        }
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<(), StorageError> {
        let mut items = StorageMap::new();
        items.insert(LOOP_STATE_KEY.to_string(), serde_json::to_value(self)?);
        storage.set(items)
    }
}

/// The subset of `LoopState` pushed to a page by `INIT_STATE`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub enabled: bool,
    pub point_a: Option<f64>,
    pub point_b: Option<f64>,
}

/// Install-time preferences. Written once, never read by the loop itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub auto_loop: bool,
    pub seek_precision: f64,
    pub cooldown_time: u64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_loop: false,
            seek_precision: 0.5,
            cooldown_time: 2000,
        }
    }
}
