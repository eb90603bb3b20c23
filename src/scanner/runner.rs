use super::extract::extract_channel_name;
use super::page::{NodeId, PageSurface};
use crate::config::ScannerConfig;
use crate::notify::Notification;
use crate::service::BlockerService;
use crate::store::Settings;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Element-type selectors covering video cards, shorts and comment threads.
pub const VIDEO_SELECTORS: &[&str] = &[
    "ytd-video-renderer",
    "ytd-grid-video-renderer",
    "ytd-compact-video-renderer",
    "ytd-rich-item-renderer",
    "ytd-shorts-video-renderer",
    "ytd-reel-item-renderer",
    "ytd-comment-thread-renderer",
    "ytd-comment-renderer",
];

const SHORTS_SELECTORS: &[&str] = &["ytd-shorts-video-renderer", "ytd-reel-item-renderer"];

/// Card containers that get the blocked state alongside the matched element.
const CARD_SELECTORS: &[&str] = &[
    "ytd-rich-item-renderer",
    "ytd-video-renderer",
    "ytd-grid-video-renderer",
];

/// Extraction and control attachment happen once per element; the cached
/// channel name lets every later rescan re-run just the verdict.
pub const PROCESSED_ATTR: &str = "data-cn-processed";
pub const CHANNEL_ATTR: &str = "data-cn-channel";

/// Signals from the embedder's DOM observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// Nodes were added somewhere under the document root.
    Mutation,
    /// The page navigated in place (single-page-app route change).
    Navigated,
}

const EVENT_BUFFER: usize = 256;

/// Keeps one page's visual state consistent with the current filter set.
/// Mutation bursts coalesce behind the debounce interval, navigation waits
/// out the settle delay, and every change notification forces a settings
/// reload plus rescan. Rescans are idempotent; overlapping triggers only
/// cost redundant work.
pub struct PageScanner {
    page: Arc<dyn PageSurface>,
    service: Arc<BlockerService>,
    config: ScannerConfig,
    settings: Settings,
    events: mpsc::Receiver<PageEvent>,
    notifications: mpsc::Receiver<Notification>,
}

impl PageScanner {
    /// Builds the scanner and the sender half the embedder wires to its
    /// mutation/navigation observers.
    pub async fn new(
        page: Arc<dyn PageSurface>,
        service: Arc<BlockerService>,
        config: ScannerConfig,
    ) -> (Self, mpsc::Sender<PageEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let notifications = service.subscribe();
        let settings = match service.get_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {:#}", e);
                Settings::default()
            }
        };
        (
            Self {
                page,
                service,
                config,
                settings,
                events: rx,
                notifications,
            },
            tx,
        )
    }

    pub async fn run(mut self) {
        // Initial scan before any event arrives.
        self.rescan();

        let mut deadline: Option<Instant> = None;
        loop {
            // A dummy far-future instant keeps the select arm well-formed
            // while no rescan is scheduled; the guard disarms it.
            let wake = deadline
                .unwrap_or_else(|| Instant::now() + std::time::Duration::from_secs(86_400));

            tokio::select! {
                _ = tokio::time::sleep_until(wake), if deadline.is_some() => {
                    deadline = None;
                    self.rescan();
                }
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    let delay = match event {
                        PageEvent::Mutation => self.config.debounce(),
                        PageEvent::Navigated => self.config.settle_delay(),
                    };
                    let next = Instant::now() + delay;
                    deadline = Some(deadline.map_or(next, |d| d.min(next)));
                }
                notification = self.notifications.recv() => {
                    let Some(notification) = notification else { break };
                    debug!("Reloading after {:?}", notification);
                    self.reload_settings().await;
                    self.rescan();
                }
            }
        }
    }

    async fn reload_settings(&mut self) {
        match self.service.get_settings().await {
            Ok(settings) => self.settings = settings,
            Err(e) => warn!("Settings reload failed, keeping previous: {:#}", e),
        }
    }

    /// Full re-walk of the scanned element types.
    fn rescan(&self) {
        for selector in VIDEO_SELECTORS {
            let is_shorts = SHORTS_SELECTORS.contains(selector);
            for element in self.page.query_all(selector) {
                self.process_element(element, is_shorts);
            }
        }
    }

    fn process_element(&self, element: NodeId, is_shorts: bool) {
        let channel = if self.page.attr(element, PROCESSED_ATTR).is_some() {
            self.page.attr(element, CHANNEL_ATTR)
        } else {
            self.page.set_attr(element, PROCESSED_ATTR, "true");
            let extracted = extract_channel_name(self.page.as_ref(), element);
            if let Some(ref name) = extracted {
                self.page.set_attr(element, CHANNEL_ATTR, name);
                if self.settings.show_buttons && !self.page.has_block_control(element) {
                    self.page.attach_block_control(element, name);
                }
            }
            extracted
        };

        let mut blocked = is_shorts && self.settings.hide_shorts;
        match channel {
            Some(name) => {
                blocked = blocked || self.service.is_channel_blocked(&name);
            }
            // No recognizable channel name: skip. Shorts still get the
            // hide-shorts verdict applied (and cleared) on every rescan.
            None if !is_shorts => return,
            None => {}
        }

        self.apply_verdict(element, blocked);
    }

    /// Marks the element and, when distinct, its nearest recognized card
    /// container. Clearing follows the same path so an unblock un-hides.
    fn apply_verdict(&self, element: NodeId, blocked: bool) {
        self.page.set_blocked(element, blocked);
        if let Some(card) = self.page.closest(element, CARD_SELECTORS) {
            if card != element {
                self.page.set_blocked(card, blocked);
            }
        }
    }
}
