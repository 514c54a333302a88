pub mod controller;
pub mod monitor;
pub mod overlay;
pub mod state;

pub use controller::LoopController;
pub use monitor::{evaluate, Decision, MonitorHandle, MonitorSettings, SeekAttempt, TickOutcome};
pub use overlay::{DomOverlay, NoOverlay, Overlay};
pub use state::{LoopState, Point, PointToggle, Preferences, SyncState, LOOP_STATE_KEY, PREFERENCES_KEY};
