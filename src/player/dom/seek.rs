use super::{HostPage, PlayerReader, RangeInput};
use crate::error::DomError;
use std::sync::Arc;

/// Range maxima above this are millisecond scales.
const MILLISECOND_SCALE_THRESHOLD: f64 = 1000.0;

/// Moves playback by writing into the range inputs beside the progress bar.
#[derive(Clone)]
pub struct SeekActuator {
    page: Arc<dyn HostPage>,
    reader: PlayerReader,
}

impl SeekActuator {
    pub fn new(page: Arc<dyn HostPage>) -> Self {
        let reader = PlayerReader::new(page.clone());
        Self { page, reader }
    }

    /// `true` when at least one input took a value. Says nothing about
    /// whether the page actually moved.
    pub fn seek_to(&self, target_secs: f64) -> bool {
        let Some(anchor) = self.reader.progress_bar() else {
            tracing::warn!("seek to {}s: progress bar not found", target_secs);
            return false;
        };

        let duration = self.reader.read_duration();
        if duration <= 0.0 {
            tracing::warn!("seek to {}s: duration unavailable ({})", target_secs, duration);
            return false;
        }

        let mut written = false;
        for input in self.page.sibling_ranges(anchor) {
            let value = scaled_value(&input, target_secs, duration);
            match self.write(anchor, &input, value) {
                Ok(()) => {
                    tracing::debug!(
                        "input[{}] value set: {} (max: {})",
                        input.index,
                        value,
                        input.max_value()
                    );
                    written = true;
                }
                Err(e) => tracing::debug!("input[{}] write failed: {}", input.index, e),
            }
        }
        written
    }

    fn write(&self, anchor: &str, input: &RangeInput, value: f64) -> Result<(), DomError> {
        self.page.set_range_value(anchor, input.index, value)?;
        for event in ["input", "change"] {
            self.page.dispatch(anchor, input.index, event)?;
        }
        Ok(())
    }
}

/// Value to write for `target_secs`: milliseconds on large scales,
/// proportional to the track length otherwise.
pub fn scaled_value(input: &RangeInput, target_secs: f64, duration_secs: f64) -> f64 {
    let max = input.max_value();
    if max > MILLISECOND_SCALE_THRESHOLD {
        target_secs * 1000.0
    } else {
        target_secs / duration_secs * max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::player::dom::{Markup, SimulatedPage};

    #[test]
    fn test_scaled_value_switches_on_threshold() {
        let ms = RangeInput { index: 0, max: Some("215000".into()) };
        let pct = RangeInput { index: 0, max: Some("100".into()) };
        let unit = RangeInput { index: 0, max: Some("1".into()) };

        assert_eq!(scaled_value(&ms, 10.0, 215.0), 10_000.0);
        assert_eq!(scaled_value(&pct, 50.0, 200.0), 25.0);
        assert_eq!(scaled_value(&unit, 50.0, 200.0), 0.25);
    }

    #[test]
    fn test_seek_moves_simulated_page_ms_scale() {
        let clock = Arc::new(ManualClock::new(0));
        let page = SimulatedPage::new(clock, "Song", 215.0);
        page.seek_display(100.0);
        let actuator = SeekActuator::new(Arc::new(page.clone()));

        assert!(actuator.seek_to(30.0));
        assert_eq!(page.position(), 30.0);
    }

    #[test]
    fn test_seek_moves_simulated_page_percent_scale() {
        let clock = Arc::new(ManualClock::new(0));
        let page = SimulatedPage::new(clock, "Song", 200.0);
        page.set_range_max(Some(100.0));
        let actuator = SeekActuator::new(Arc::new(page.clone()));

        assert!(actuator.seek_to(50.0));
        assert_eq!(page.position(), 50.0);
    }

    #[test]
    fn test_seek_fails_without_duration() {
        let clock = Arc::new(ManualClock::new(0));
        let page = SimulatedPage::new(clock, "Song", 0.0);
        let actuator = SeekActuator::new(Arc::new(page.clone()));

        assert!(!actuator.seek_to(10.0));
    }

    #[test]
    fn test_seek_fails_without_progress_bar() {
        let clock = Arc::new(ManualClock::new(0));
        let page = SimulatedPage::new(clock, "Song", 100.0);
        page.set_markup(Markup::Loading);
        let actuator = SeekActuator::new(Arc::new(page.clone()));

        assert!(!actuator.seek_to(10.0));
    }

    #[test]
    fn test_seek_reports_rejected_writes() {
        let clock = Arc::new(ManualClock::new(0));
        let page = SimulatedPage::new(clock, "Song", 100.0);
        page.set_range_writable(false);
        page.seek_display(80.0);
        let actuator = SeekActuator::new(Arc::new(page.clone()));

        assert!(!actuator.seek_to(10.0));
        assert_eq!(page.position(), 80.0);
    }
}
