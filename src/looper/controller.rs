use super::monitor::{evaluate, Decision, MonitorHandle, MonitorSettings, SeekAttempt, TickOutcome};
use super::overlay::Overlay;
use super::state::{LoopState, Point, PointToggle, SyncState};
use crate::clock::Clock;
use crate::player::{Player, PlayerStatus};
use crate::storage::SharedStorage;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
enum DeferredTask {
    VerifySeek { target: f64 },
    RestoreLoopButton,
}

#[derive(Debug, Clone, Copy)]
struct Deferred {
    due_ms: u64,
    task: DeferredTask,
}

/// The loop engine of one page context 🔁
///
/// Owns the loop state, the monitor timer and the last seek attempt. All
/// methods are synchronous; the content-script runtime decides when ticks
/// and deferred work run.
pub struct LoopController {
    state: LoopState,
    monitor: MonitorHandle,
    last_seek: Option<SeekAttempt>,
    deferred: Vec<Deferred>,
    settings: MonitorSettings,
    player: Arc<dyn Player>,
    storage: SharedStorage,
    overlay: Arc<dyn Overlay>,
    clock: Arc<dyn Clock>,
}

impl LoopController {
    pub fn new(
        player: Arc<dyn Player>,
        storage: SharedStorage,
        overlay: Arc<dyn Overlay>,
        clock: Arc<dyn Clock>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            state: LoopState::default(),
            monitor: MonitorHandle::new(settings.period),
            last_seek: None,
            deferred: Vec::new(),
            settings,
            player,
            storage,
            overlay,
            clock,
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn player(&self) -> &Arc<dyn Player> {
        &self.player
    }

    pub fn last_seek(&self) -> Option<SeekAttempt> {
        self.last_seek
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_active()
    }

    pub fn active_monitors(&self) -> usize {
        self.monitor.active_count()
    }

    pub fn monitor_mut(&mut self) -> &mut MonitorHandle {
        &mut self.monitor
    }

    // --- Monitor lifecycle ---

    pub fn start_monitoring(&mut self) {
        if self.monitor.start() {
            tracing::info!("loop monitor started ({:?} period)", self.settings.period);
        } else {
            tracing::debug!("loop monitor already running");
        }
    }

    pub fn stop_monitoring(&mut self) {
        if self.monitor.stop() {
            tracing::info!("loop monitor stopped");
        }
    }

    /// Pick an enabled loop back up, e.g. once the player has rendered.
    /// Returns whether the monitor is running afterwards.
    pub fn resume_monitoring(&mut self) -> bool {
        if self.state.enabled && self.state.has_both() {
            self.start_monitoring();
        }
        self.monitor.is_active()
    }

    /// One monitor period: run the guard chain and correct the position
    /// when it left the loop window.
    pub fn check_loop_condition(&mut self) -> TickOutcome {
        let now = self.clock.now_ms();
        let decision = evaluate(
            &self.state,
            self.player.as_ref(),
            self.last_seek.as_ref(),
            now,
            &self.settings,
        );
        match decision {
            Decision::Hold(outcome) => {
                tracing::trace!("loop check: {:?}", outcome);
                outcome
            }
            Decision::SeekTo { position, target } => {
                tracing::info!("position {}s outside loop window, back to {}s", position, target);
                let written = self.jump_to_time(target);
                TickOutcome::Corrected {
                    position,
                    target,
                    written,
                }
            }
        }
    }

    /// Seek and remember the attempt; a verification read follows later.
    /// The attempt is recorded even when no control took the value, so the
    /// cooldown also paces retries against a page that ignores writes.
    pub fn jump_to_time(&mut self, target: f64) -> bool {
        tracing::debug!("jumping to {}s", target);
        let written = self.player.seek_to(target);
        if !written {
            tracing::warn!("seek to {}s not accepted, monitor keeps going", target);
        }

        let now = self.clock.now_ms();
        self.last_seek = Some(SeekAttempt {
            target,
            issued_at_ms: now,
        });
        self.defer(self.settings.verify_delay_ms, DeferredTask::VerifySeek { target });
        written
    }

    /// Log-only check that a seek landed near its target.
    pub fn verify_seek(&self, target: f64) -> bool {
        let current = self.player.position();
        let landed = (current - target).abs() <= self.settings.verify_tolerance;
        if landed {
            tracing::info!("seek landed: target {}s, now {}s", target, current);
        } else {
            tracing::warn!("seek drifted: target {}s, now {}s", target, current);
        }
        landed
    }

    // --- Deferred work ---

    fn defer(&mut self, delay_ms: u64, task: DeferredTask) {
        let due_ms = self.clock.now_ms() + delay_ms;
        self.deferred.push(Deferred { due_ms, task });
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.deferred.iter().map(|d| d.due_ms).min()
    }

    pub fn pending_tasks(&self) -> usize {
        self.deferred.len()
    }

    /// Run every deferred task whose time has come. Returns how many ran.
    pub fn run_due(&mut self) -> usize {
        let now = self.clock.now_ms();
        let (due, later): (Vec<Deferred>, Vec<Deferred>) =
            self.deferred.drain(..).partition(|d| d.due_ms <= now);
        self.deferred = later;

        for item in &due {
            match item.task {
                DeferredTask::VerifySeek { target } => {
                    self.verify_seek(target);
                }
                DeferredTask::RestoreLoopButton => self.overlay.reflect(&self.state),
            }
        }
        due.len()
    }

    // --- User actions ---

    /// Point button press: clear a set point (stopping the loop) or capture
    /// the current position (starting the loop once both are set).
    pub fn toggle_point(&mut self, point: Point) {
        let at = self.player.position();
        match self.state.toggle_point(point, at) {
            PointToggle::Cleared { disabled } => {
                tracing::info!("point {} cleared", point.label());
                if disabled {
                    self.stop_monitoring();
                    tracing::info!("loop disabled: window incomplete");
                }
            }
            PointToggle::Set { auto_enabled } => {
                tracing::info!("point {} set at {}s", point.label(), at);
                if auto_enabled {
                    tracing::info!("both points set, loop enabled");
                }
                if self.state.enabled && self.state.has_both() {
                    self.start_monitoring();
                }
            }
        }
        self.reflect();
        self.persist();
    }

    /// `TOGGLE_LOOP` from the popup. Switching off drops both points.
    pub fn toggle_loop(&mut self, enabled: bool) {
        tracing::info!("loop {}", if enabled { "enabled" } else { "disabled" });
        self.state.set_enabled(enabled);
        if enabled {
            self.start_monitoring();
        } else {
            self.stop_monitoring();
        }
        self.reflect();
        self.persist();
    }

    /// Loop button press inside the page.
    pub fn toggle_loop_from_button(&mut self) {
        let enabled = !self.state.enabled;
        self.state.set_enabled(enabled);
        tracing::info!("loop button: {}", if enabled { "enabled" } else { "disabled" });

        if enabled && self.state.has_both() {
            self.start_monitoring();
        } else {
            self.stop_monitoring();
        }
        self.reflect();
        self.persist();

        self.overlay.flash_loop(enabled);
        self.defer(self.settings.button_flash_ms, DeferredTask::RestoreLoopButton);
    }

    /// `SET_LOOP_POINTS`: overwrite both points.
    pub fn set_loop_points(&mut self, point_a: Option<f64>, point_b: Option<f64>) {
        tracing::info!("loop points set: A={:?} B={:?}", point_a, point_b);
        if self.state.set_points(point_a, point_b) {
            tracing::info!("both points set, loop enabled");
        }
        if self.state.enabled && self.state.has_both() {
            self.start_monitoring();
        }
        self.reflect();
        self.persist();
    }

    /// `CLEAR_LOOP_POINTS`: drop both points, stopping a running loop.
    pub fn clear_loop_points(&mut self) {
        if self.state.clear_points() {
            self.stop_monitoring();
            tracing::info!("loop points cleared, loop disabled");
        } else {
            tracing::info!("loop points cleared");
        }
        self.reflect();
        self.persist();
    }

    /// `INIT_STATE`: replay stored state into a fresh page. Points are only
    /// taken as a complete pair.
    pub fn initialize(&mut self, sync: SyncState) {
        tracing::info!("restoring state: {:?}", sync);
        if let (Some(a), Some(b)) = (sync.point_a, sync.point_b) {
            self.state.point_a = Some(a);
            self.state.point_b = Some(b);
        }
        self.state.enabled = sync.enabled;
        if sync.enabled {
            self.start_monitoring();
        } else {
            self.stop_monitoring();
        }
        self.reflect();
    }

    pub fn status(&self) -> PlayerStatus {
        self.player.status()
    }

    pub fn current_time(&self) -> f64 {
        self.player.position()
    }

    /// Page teardown: no timer or deferred work survives the context.
    pub fn shutdown(&mut self) {
        self.stop_monitoring();
        self.deferred.clear();
    }

    fn reflect(&self) {
        self.overlay.reflect(&self.state);
    }

    /// Fire-and-forget save; the in-memory state stays authoritative.
    fn persist(&mut self) {
        self.state.current_time = self.player.position();
        self.state.track_name = self.player.track_name();
        match self.state.save(self.storage.as_ref()) {
            Ok(()) => tracing::debug!("loop state saved"),
            Err(e) => tracing::warn!("loop state not saved: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::StorageError;
    use crate::looper::overlay::NoOverlay;
    use crate::player::ScriptedPlayer;
    use crate::storage::{MemoryStorage, Storage, StorageMap};

    struct Rig {
        clock: Arc<ManualClock>,
        player: Arc<ScriptedPlayer>,
        storage: Arc<MemoryStorage>,
        controller: LoopController,
    }

    fn rig() -> Rig {
        let clock = Arc::new(ManualClock::new(100_000));
        let player = Arc::new(ScriptedPlayer::new(240.0));
        let storage = Arc::new(MemoryStorage::new());
        let controller = LoopController::new(
            player.clone(),
            storage.clone(),
            Arc::new(NoOverlay),
            clock.clone(),
            MonitorSettings::default(),
        );
        Rig {
            clock,
            player,
            storage,
            controller,
        }
    }

    /// Drive ticks at the monitor period for `ms`.
    fn run_for(rig: &mut Rig, ms: u64) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..(ms / 100) {
            outcomes.push(rig.controller.check_loop_condition());
            rig.controller.run_due();
            rig.clock.advance(100);
        }
        outcomes
    }

    #[test]
    fn test_disabled_loop_never_seeks() {
        let mut rig = rig();
        rig.controller.set_loop_points(Some(10.0), Some(40.0));
        rig.controller.toggle_loop(false);

        for position in [0.0, 5.0, 41.0, 200.0] {
            rig.player.set_position(position);
            run_for(&mut rig, 1_000);
        }
        assert!(rig.player.seeks().is_empty());
    }

    #[test]
    fn test_one_seek_per_cooldown_window() {
        let mut rig = rig();
        rig.controller.set_loop_points(Some(10.0), Some(40.0));
        rig.player.set_position(45.0);

        let outcomes = run_for(&mut rig, 3_000);
        assert_eq!(outcomes.iter().filter(|o| o.is_correction()).count(), 1);
        assert_eq!(rig.player.seeks(), vec![10.0]);

        // Page ignores the seek; next window allows exactly one more
        let outcomes = run_for(&mut rig, 3_000);
        assert_eq!(outcomes.iter().filter(|o| o.is_correction()).count(), 1);
        assert_eq!(rig.player.seeks(), vec![10.0, 10.0]);
    }

    #[test]
    fn test_toggle_point_lifecycle() {
        let mut rig = rig();
        rig.player.set_position(10.0);
        rig.controller.toggle_point(Point::A);
        assert!(!rig.controller.is_monitoring());

        rig.player.set_position(40.0);
        rig.controller.toggle_point(Point::B);
        assert!(rig.controller.state().enabled);
        assert_eq!(rig.controller.active_monitors(), 1);

        rig.controller.toggle_loop(true);
        assert_eq!(rig.controller.active_monitors(), 1);

        rig.controller.toggle_point(Point::A);
        assert!(!rig.controller.state().enabled);
        assert!(!rig.controller.is_monitoring());
        assert_eq!(rig.controller.state().point_b, Some(40.0));
    }

    #[test]
    fn test_point_changes_are_persisted() {
        let mut rig = rig();
        rig.player.set_position(12.0);
        rig.player.set_track_name("Song");
        rig.controller.toggle_point(Point::A);

        let saved = LoopState::load(rig.storage.as_ref()).unwrap().unwrap();
        assert_eq!(saved.point_a, Some(12.0));
        assert_eq!(saved.current_time, 12.0);
        assert_eq!(saved.track_name, "Song");
    }

    #[test]
    fn test_stop_twice_equals_once() {
        let mut rig = rig();
        rig.controller.start_monitoring();
        rig.controller.stop_monitoring();
        rig.controller.stop_monitoring();
        assert_eq!(rig.controller.active_monitors(), 0);
    }

    #[test]
    fn test_loop_button_flash_is_restored_later() {
        let mut rig = rig();
        rig.controller.set_loop_points(Some(1.0), Some(5.0));
        rig.controller.toggle_loop_from_button();

        assert!(!rig.controller.state().enabled);
        assert_eq!(rig.controller.state().point_a, None);
        assert_eq!(rig.controller.pending_tasks(), 1);

        rig.clock.advance(199);
        assert_eq!(rig.controller.run_due(), 0);
        rig.clock.advance(1);
        assert_eq!(rig.controller.run_due(), 1);
    }

    #[test]
    fn test_button_enable_without_points_does_not_monitor() {
        let mut rig = rig();
        rig.controller.toggle_loop_from_button();
        assert!(rig.controller.state().enabled);
        assert!(!rig.controller.is_monitoring());

        rig.player.set_position(3.0);
        rig.controller.toggle_point(Point::A);
        rig.player.set_position(9.0);
        rig.controller.toggle_point(Point::B);
        assert!(rig.controller.is_monitoring());
    }

    #[test]
    fn test_resume_needs_an_enabled_complete_loop() {
        let mut rig = rig();
        assert!(!rig.controller.resume_monitoring());

        rig.controller.toggle_loop_from_button();
        assert!(!rig.controller.resume_monitoring());

        rig.controller.set_loop_points(Some(1.0), Some(5.0));
        rig.controller.stop_monitoring();
        assert!(rig.controller.resume_monitoring());
        assert_eq!(rig.controller.active_monitors(), 1);
    }

    #[test]
    fn test_clear_points_disables() {
        let mut rig = rig();
        rig.controller.set_loop_points(Some(1.0), Some(5.0));
        assert!(rig.controller.is_monitoring());

        rig.controller.clear_loop_points();
        assert!(!rig.controller.state().enabled);
        assert!(!rig.controller.is_monitoring());
    }

    #[test]
    fn test_initialize_requires_complete_pair() {
        let mut rig = rig();
        rig.controller.initialize(SyncState {
            enabled: true,
            point_a: Some(3.0),
            point_b: None,
        });
        assert_eq!(rig.controller.state().point_a, None);
        assert!(rig.controller.is_monitoring());

        rig.controller.initialize(SyncState {
            enabled: false,
            point_a: Some(3.0),
            point_b: Some(8.0),
        });
        assert_eq!(rig.controller.state().window(), Some((3.0, 8.0)));
        assert!(!rig.controller.is_monitoring());
    }

    #[test]
    fn test_verification_runs_after_delay() {
        let mut rig = rig();
        rig.player.set_follow_seeks(true);
        assert!(rig.controller.jump_to_time(30.0));
        assert_eq!(rig.controller.next_due_ms(), Some(101_500));

        rig.clock.advance(1_499);
        assert_eq!(rig.controller.run_due(), 0);
        rig.clock.advance(1);
        assert_eq!(rig.controller.run_due(), 1);
        assert!(rig.controller.verify_seek(30.0));
        assert!(!rig.controller.verify_seek(35.0));
    }

    #[test]
    fn test_rejected_seek_still_starts_cooldown() {
        let mut rig = rig();
        rig.player.set_accept_seeks(false);
        rig.controller.set_loop_points(Some(10.0), Some(40.0));
        rig.player.set_position(50.0);

        let first = rig.controller.check_loop_condition();
        assert_eq!(
            first,
            TickOutcome::Corrected { position: 50.0, target: 10.0, written: false }
        );
        rig.clock.advance(100);
        assert!(matches!(
            rig.controller.check_loop_condition(),
            TickOutcome::CoolingDown { .. }
        ));
    }

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, _keys: &[&str]) -> Result<StorageMap, StorageError> {
            Err(StorageError::Corrupt)
        }
        fn get_all(&self) -> Result<StorageMap, StorageError> {
            Err(StorageError::Corrupt)
        }
        fn set(&self, _items: StorageMap) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }
        fn remove(&self, _key: Option<&str>) -> Result<(), StorageError> {
            Err(StorageError::Corrupt)
        }
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let clock = Arc::new(ManualClock::new(0));
        let player = Arc::new(ScriptedPlayer::new(100.0));
        let mut controller = LoopController::new(
            player.clone(),
            Arc::new(BrokenStorage),
            Arc::new(NoOverlay),
            clock,
            MonitorSettings::default(),
        );
        player.set_position(7.0);
        controller.toggle_point(Point::B);
        assert_eq!(controller.state().point_b, Some(7.0));
    }
}
