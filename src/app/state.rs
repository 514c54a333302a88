use crate::app::config::UserConfig;
use crate::app::keys::KeyConfig;
use crate::background::{BackgroundWorker, InstallReason, TabUpdate};
use crate::clock::Clock;
use crate::content::{ContentScript, ContentSettings};
use crate::messaging::TabRegistry;
use crate::player::dom::SimulatedPage;
use crate::popup::PopupController;
use crate::storage::SharedStorage;
use crate::ui::theme::Theme;
use std::sync::Arc;
use std::time::Instant;

/// Tab id of the simulated player tab.
pub const PLAYER_TAB: u32 = 1;

pub struct Toast {
    pub message: String,
    pub start_time: Instant,
    pub deadline: Instant,
}

/// Everything the simulator window shows and drives 🖥️
pub struct App {
    pub theme: Theme,
    pub keys: KeyConfig,
    pub is_running: bool,

    /// The fake player page; the content script lives inside it.
    pub page: SimulatedPage,
    pub url: String,
    pub tabs: TabRegistry,
    pub background: BackgroundWorker,
    pub popup: PopupController,

    storage: SharedStorage,
    clock: Arc<dyn Clock>,
    content_settings: ContentSettings,

    pub page_loads: u32,
    pub toast: Option<Toast>,
}

impl App {
    /// Boot the extension the way a browser would: background first, then
    /// the page, then the popup.
    pub async fn new(
        config: &UserConfig,
        theme: Theme,
        page: SimulatedPage,
        storage: SharedStorage,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tabs = TabRegistry::new();
        let background = BackgroundWorker::new(storage.clone(), tabs.clone(), config.sync.settings());
        background.on_installed(InstallReason::Install);
        background.on_startup();

        let url = format!("https://{}/", config.sync.host);
        let content_settings = config.content_settings();
        attach_content(&page, &tabs, storage.clone(), clock.clone(), content_settings);
        background.on_tab_updated(&TabUpdate::complete(PLAYER_TAB, &url));

        let popup = PopupController::open(Some(PLAYER_TAB), tabs.clone(), storage.clone()).await;

        Self {
            theme,
            keys: config.keys.clone(),
            is_running: true,
            page,
            url,
            tabs,
            background,
            popup,
            storage,
            clock,
            content_settings,
            page_loads: 1,
            toast: None,
        }
    }

    /// Navigate the tab again: the old content script dies with its page,
    /// a new one attaches and the background re-syncs it after its delay.
    pub fn reload_page(&mut self) {
        self.page.reload();
        attach_content(
            &self.page,
            &self.tabs,
            self.storage.clone(),
            self.clock.clone(),
            self.content_settings,
        );
        self.background
            .on_tab_updated(&TabUpdate::complete(PLAYER_TAB, &self.url));
        self.page_loads += 1;
        self.show_toast("🔄 Page reloaded");
    }

    /// One popup refresh: pick up changes made from the page buttons, then poll status.
    pub async fn poll_status(&mut self) {
        self.popup.reload_stored_state();
        self.popup.refresh_status().await;
    }

    pub fn show_toast(&mut self, message: &str) {
        let now = Instant::now();
        let duration = std::time::Duration::from_millis(2000); // 2s display time
        let deadline = now + duration;

        if let Some(ref mut current) = self.toast {
            // Keep start_time so rapid updates do not restart the entrance
            current.message = message.to_string();
            current.deadline = deadline;
        } else {
            self.toast = Some(Toast {
                message: message.to_string(),
                start_time: now,
                deadline,
            });
        }
    }

    /// Called every tick to update state
    pub fn on_tick(&mut self) {
        if let Some(ref toast) = self.toast {
            if Instant::now() > toast.deadline {
                self.toast = None;
            }
        }
    }
}

fn attach_content(
    page: &SimulatedPage,
    tabs: &TabRegistry,
    storage: SharedStorage,
    clock: Arc<dyn Clock>,
    settings: ContentSettings,
) {
    let events = page.subscribe();
    let (script, handle) =
        ContentScript::attach(Arc::new(page.clone()), events, storage, clock, settings);
    tabs.register(PLAYER_TAB, handle);
    tokio::spawn(script.run());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::storage::MemoryStorage;

    async fn app() -> App {
        let clock = SystemClock::shared();
        let page = SimulatedPage::new(clock.clone(), "Song", 120.0);
        App::new(
            &UserConfig::default(),
            Theme::default(),
            page,
            Arc::new(MemoryStorage::new()),
            clock,
        )
        .await
    }

    #[tokio::test]
    async fn test_boot_registers_the_tab() {
        let app = app().await;
        assert!(app.tabs.handle(PLAYER_TAB).is_some());
        assert_eq!(app.popup.state().point_a, None);
        assert_eq!(app.page_loads, 1);
    }

    #[tokio::test]
    async fn test_reload_replaces_the_context() {
        let mut app = app().await;
        let first = app.tabs.handle(PLAYER_TAB).unwrap();
        app.reload_page();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert!(first.is_closed());
        assert!(!app.tabs.handle(PLAYER_TAB).unwrap().is_closed());
        assert_eq!(app.page_loads, 2);
        assert!(app.toast.is_some());
    }
}
