use crate::clock::Clock;
use crate::looper::{DomOverlay, LoopController, MonitorSettings, Overlay, Point};
use crate::messaging::{decode, ContentRequest, ContextHandle, Envelope, Outcome, TimeReply};
use crate::player::dom::{ButtonId, HostPage, PageEvent};
use crate::player::DomPlayer;
use crate::storage::SharedStorage;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Timing of one page context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentSettings {
    pub monitor: MonitorSettings,
    /// How often to look for the progress indicator until it shows up.
    pub player_poll: Duration,
    /// How often to look for the controls bar until the buttons are in.
    pub controls_poll: Duration,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            monitor: MonitorSettings::default(),
            player_poll: Duration::from_millis(1000),
            controls_poll: Duration::from_millis(1000),
        }
    }
}

fn reply<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// The script living inside a player tab 🎧
///
/// Owns the loop controller and serializes everything that touches it:
/// inbound messages, clicks on the injected buttons, monitor ticks and
/// deferred work all run on this one task.
pub struct ContentScript {
    controller: LoopController,
    overlay: Arc<DomOverlay>,
    clock: Arc<dyn Clock>,
    inbox: mpsc::UnboundedReceiver<Envelope>,
    page_events: mpsc::UnboundedReceiver<PageEvent>,
    settings: ContentSettings,
    player_ready: bool,
    buttons_injected: bool,
}

impl ContentScript {
    /// Attach to a page. The returned handle is how other contexts reach it.
    pub fn attach(
        page: Arc<dyn HostPage>,
        page_events: mpsc::UnboundedReceiver<PageEvent>,
        storage: SharedStorage,
        clock: Arc<dyn Clock>,
        settings: ContentSettings,
    ) -> (Self, ContextHandle) {
        let player = Arc::new(DomPlayer::new(page.clone()));
        let overlay = Arc::new(DomOverlay::new(page));
        let controller = LoopController::new(
            player,
            storage,
            overlay.clone() as Arc<dyn Overlay>,
            clock.clone(),
            settings.monitor,
        );
        let (handle, inbox) = ContextHandle::channel();

        let script = Self {
            controller,
            overlay,
            clock,
            inbox,
            page_events,
            settings,
            player_ready: false,
            buttons_injected: false,
        };
        (script, handle)
    }

    pub fn controller(&self) -> &LoopController {
        &self.controller
    }

    /// Drive the context until the page goes away or nobody can reach it.
    ///
    /// Monitor ticks only run once the player has rendered.
    pub async fn run(mut self) {
        tracing::info!("content script attached");

        let mut player_poll = tokio::time::interval(self.settings.player_poll);
        player_poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut controls_poll = tokio::time::interval(self.settings.controls_poll);
        controls_poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let deferred = self.deferred_wait();

            tokio::select! {
                envelope = self.inbox.recv() => match envelope {
                    Some(envelope) => self.handle_envelope(envelope),
                    None => break,
                },
                event = self.page_events.recv() => match event {
                    Some(event) => self.handle_page_event(event),
                    None => break,
                },
                _ = self.controller.monitor_mut().tick(), if self.player_ready => {
                    self.controller.check_loop_condition();
                }
                _ = deferred => {
                    self.controller.run_due();
                }
                _ = player_poll.tick(), if !self.player_ready => self.poll_player(),
                _ = controls_poll.tick(), if !self.buttons_injected => self.poll_controls(),
            }
        }

        self.controller.shutdown();
        tracing::info!("content script detached");
    }

    fn deferred_wait(&self) -> impl std::future::Future<Output = ()> {
        let wait = self
            .controller
            .next_due_ms()
            .map(|due| Duration::from_millis(due.saturating_sub(self.clock.now_ms())));
        async move {
            match wait {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        }
    }

    fn poll_player(&mut self) {
        if self.controller.player().is_ready() {
            tracing::info!("player found");
            self.player_ready = true;
            self.controller.resume_monitoring();
        } else {
            tracing::trace!("waiting for the player");
        }
    }

    fn poll_controls(&mut self) {
        if self.overlay.inject(self.controller.state()) {
            self.buttons_injected = true;
        }
    }

    fn handle_envelope(&mut self, envelope: Envelope) {
        tracing::debug!("content <- {}", envelope.payload);
        let response = match decode::<ContentRequest>(envelope.payload.clone()) {
            Ok(request) => self.handle_request(request),
            Err(outcome) => outcome.into_value(),
        };
        envelope.respond(response);
    }

    /// Answer one request. Never fails; unknown input was already filtered.
    pub fn handle_request(&mut self, request: ContentRequest) -> Value {
        match request {
            ContentRequest::GetCurrentTime => reply(&TimeReply {
                time: self.controller.current_time(),
            }),
            ContentRequest::GetStatus => reply(&self.controller.status()),
            ContentRequest::ToggleLoop { enabled } => {
                self.controller.toggle_loop(enabled);
                Outcome::ok().into_value()
            }
            ContentRequest::SetLoopPoints { point_a, point_b } => {
                self.controller.set_loop_points(point_a, point_b);
                Outcome::ok().into_value()
            }
            ContentRequest::ClearLoopPoints => {
                self.controller.clear_loop_points();
                Outcome::ok().into_value()
            }
            ContentRequest::JumpToTime { time } => {
                Outcome::done(self.controller.jump_to_time(time)).into_value()
            }
            ContentRequest::InitState { state } => {
                self.controller.initialize(state);
                Outcome::ok().into_value()
            }
        }
    }

    fn handle_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::ButtonClicked(ButtonId::PointA) => self.controller.toggle_point(Point::A),
            PageEvent::ButtonClicked(ButtonId::PointB) => self.controller.toggle_point(Point::B),
            PageEvent::ButtonClicked(ButtonId::LoopToggle) => {
                self.controller.toggle_loop_from_button()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::error::DeliveryError;
    use crate::looper::LoopState;
    use crate::messaging::UNKNOWN_MESSAGE_TYPE;
    use crate::player::dom::{Markup, SimulatedPage};
    use crate::storage::{MemoryStorage, Storage};
    use serde_json::json;

    fn fast_settings() -> ContentSettings {
        ContentSettings {
            player_poll: Duration::from_millis(10),
            controls_poll: Duration::from_millis(10),
            ..ContentSettings::default()
        }
    }

    fn spawn_on(page: &SimulatedPage, storage: Arc<MemoryStorage>) -> ContextHandle {
        let events = page.subscribe();
        let (script, handle) = ContentScript::attach(
            Arc::new(page.clone()),
            events,
            storage,
            SystemClock::shared(),
            fast_settings(),
        );
        tokio::spawn(script.run());
        handle
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    #[tokio::test]
    async fn test_status_and_time_replies() {
        let page = SimulatedPage::new(SystemClock::shared(), "Intro", 200.0);
        page.seek_display(65.0);
        let handle = spawn_on(&page, Arc::new(MemoryStorage::new()));

        let time = handle.send(&ContentRequest::GetCurrentTime).await.unwrap();
        assert_eq!(time, json!({"time": 65.0}));

        let status = handle.send(&ContentRequest::GetStatus).await.unwrap();
        assert_eq!(
            status,
            json!({"currentTime": 65.0, "trackName": "Intro", "isPlaying": false})
        );
    }

    #[tokio::test]
    async fn test_unknown_type_is_answered() {
        let page = SimulatedPage::new(SystemClock::shared(), "Intro", 200.0);
        let handle = spawn_on(&page, Arc::new(MemoryStorage::new()));

        let reply = handle.request(json!({"type": "SHUFFLE_ALL"})).await.unwrap();
        assert_eq!(reply, json!({"success": false, "error": UNKNOWN_MESSAGE_TYPE}));
    }

    #[tokio::test]
    async fn test_buttons_are_injected_and_drive_the_loop() {
        let page = SimulatedPage::new(SystemClock::shared(), "Intro", 200.0);
        let storage = Arc::new(MemoryStorage::new());
        let _handle = spawn_on(&page, storage.clone());
        settle().await;
        assert_eq!(page.button_count(), 3);

        page.seek_display(20.0);
        assert!(page.click(ButtonId::PointA));
        settle().await;
        page.seek_display(50.0);
        assert!(page.click(ButtonId::PointB));
        settle().await;

        let saved = LoopState::load(storage.as_ref()).unwrap().unwrap();
        assert!(saved.enabled);
        assert_eq!(saved.window(), Some((20.0, 50.0)));
        assert_eq!(page.button(ButtonId::PointA).unwrap().label, "A:0:20");
    }

    #[tokio::test]
    async fn test_loop_brings_playback_back_to_start() {
        let page = SimulatedPage::new(SystemClock::shared(), "Intro", 200.0);
        let handle = spawn_on(&page, Arc::new(MemoryStorage::new()));
        settle().await;

        handle
            .send(&ContentRequest::SetLoopPoints { point_a: Some(10.0), point_b: Some(40.0) })
            .await
            .unwrap();
        page.seek_display(120.0);
        page.set_playing(true);
        tokio::time::sleep(Duration::from_millis(300)).await;

        let position = page.position();
        assert!((10.0..12.0).contains(&position), "position {}", position);
    }

    #[tokio::test]
    async fn test_loop_waits_for_the_player() {
        let page = SimulatedPage::new(SystemClock::shared(), "Intro", 200.0);
        page.set_markup(Markup::Loading);
        let handle = spawn_on(&page, Arc::new(MemoryStorage::new()));

        handle
            .send(&ContentRequest::SetLoopPoints { point_a: Some(10.0), point_b: Some(40.0) })
            .await
            .unwrap();
        page.seek_display(120.0);
        page.set_playing(true);
        settle().await;
        assert!(page.position() >= 120.0);

        page.set_markup(Markup::Modern);
        tokio::time::sleep(Duration::from_millis(300)).await;
        let position = page.position();
        assert!((10.0..12.0).contains(&position), "position {}", position);
    }

    #[tokio::test]
    async fn test_reload_ends_the_context() {
        let page = SimulatedPage::new(SystemClock::shared(), "Intro", 200.0);
        let storage = Arc::new(MemoryStorage::new());
        let handle = spawn_on(&page, storage.clone());
        settle().await;

        page.reload();
        settle().await;
        assert!(handle.is_closed());
        assert_eq!(
            handle.send(&ContentRequest::GetStatus).await,
            Err(DeliveryError::ContextClosed)
        );
        assert!(storage.get_all().unwrap().is_empty());
    }
}
