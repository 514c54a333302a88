use super::state::LoopState;
use crate::player::Player;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

/// Timing knobs of the loop monitor ⏱️
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSettings {
    pub period: Duration,
    /// No correction within this long after any seek attempt.
    pub cooldown_ms: u64,
    /// After seeking to the start, positions this close to it count as "still converging".
    pub convergence_window: f64,
    pub verify_delay_ms: u64,
    pub verify_tolerance: f64,
    pub button_flash_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(100),
            cooldown_ms: 3000,
            convergence_window: 3.0,
            verify_delay_ms: 1500,
            verify_tolerance: 2.0,
            button_flash_ms: 200,
        }
    }
}

/// The single repeating timer of a page context.
///
/// `start`/`stop` are plain state flips so they work outside a runtime; the
/// underlying `Interval` is created lazily on the first awaited tick.
pub struct MonitorHandle {
    period: Duration,
    active: bool,
    interval: Option<Interval>,
}

impl MonitorHandle {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            active: false,
            interval: None,
        }
    }

    /// `false` when already running (no second timer is created).
    pub fn start(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.interval = None;
        true
    }

    /// `false` when nothing was running.
    pub fn stop(&mut self) -> bool {
        self.interval = None;
        std::mem::replace(&mut self.active, false)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of live timers: 0 or 1.
    pub fn active_count(&self) -> usize {
        usize::from(self.active)
    }

    /// Resolves on the next period while active, never while idle.
    pub async fn tick(&mut self) {
        if !self.active {
            return std::future::pending().await;
        }
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut iv = tokio::time::interval(period);
            iv.set_missed_tick_behavior(MissedTickBehavior::Skip);
            iv
        });
        interval.tick().await;
    }
}

/// The most recent seek issued by this context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekAttempt {
    pub target: f64,
    pub issued_at_ms: u64,
}

/// Result of one monitor tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Disabled,
    NotPlaying,
    PointsMissing,
    CoolingDown { elapsed_ms: u64 },
    /// Recently sent to the start and the page clock has not caught up yet.
    Converging { position: f64 },
    InWindow { position: f64 },
    Corrected { position: f64, target: f64, written: bool },
}

impl TickOutcome {
    pub fn is_correction(&self) -> bool {
        matches!(self, TickOutcome::Corrected { .. })
    }
}

/// What the guard chain decided before any seek happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Hold(TickOutcome),
    SeekTo { position: f64, target: f64 },
}

/// Guard chain of a tick, short-circuiting on the first unmet condition:
/// enabled, playing, both points, cooldown elapsed, not converging.
pub fn evaluate(
    state: &LoopState,
    player: &dyn Player,
    last_seek: Option<&SeekAttempt>,
    now_ms: u64,
    settings: &MonitorSettings,
) -> Decision {
    if !state.enabled {
        return Decision::Hold(TickOutcome::Disabled);
    }
    if !player.is_playing() {
        return Decision::Hold(TickOutcome::NotPlaying);
    }
    let Some((start, end)) = state.window() else {
        return Decision::Hold(TickOutcome::PointsMissing);
    };

    if let Some(seek) = last_seek {
        let elapsed_ms = now_ms.saturating_sub(seek.issued_at_ms);
        if elapsed_ms < settings.cooldown_ms {
            return Decision::Hold(TickOutcome::CoolingDown { elapsed_ms });
        }
    }

    let position = player.position();

    if let Some(seek) = last_seek {
        if seek.target == start && (position - start).abs() <= settings.convergence_window {
            return Decision::Hold(TickOutcome::Converging { position });
        }
    }

    if position >= end || position < start {
        Decision::SeekTo {
            position,
            target: start,
        }
    } else {
        Decision::Hold(TickOutcome::InWindow { position })
    }
}
