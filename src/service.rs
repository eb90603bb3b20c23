use crate::engine::{CompiledMatcher, ContentDescriptor, ContentMatcher, Verdict};
use crate::notify::{Broadcaster, Notification};
use crate::store::{
    BlockLists, FilterStore, KeywordFilter, MatchType, PatternFilter, PatternKind, Settings,
    SettingsPatch, SmartFilters, StoredState,
};
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Which smart-filter list an operation targets. Keyword and pattern ids are
/// independent namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Keyword,
    Pattern,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordDraft {
    pub text: String,
    #[serde(default)]
    pub match_type: Option<MatchType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternDraft {
    #[serde(rename = "type")]
    pub kind: PatternKind,
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum FilterDraft {
    Keyword(KeywordDraft),
    Pattern(PatternDraft),
}

/// The background half of the system: owns the store port, keeps a compiled
/// matcher hot-swapped for the check paths, and broadcasts a change signal
/// after every mutation. All mutations are read-modify-write round trips
/// through the store; the matcher is rebuilt from what was actually saved.
pub struct BlockerService {
    store: Arc<dyn FilterStore>,
    matcher: ArcSwap<CompiledMatcher>,
    broadcaster: Broadcaster,
}

impl BlockerService {
    /// Loads (or first-run initializes) the stored document, applies startup
    /// sanitation and compiles the initial matcher.
    pub async fn init(store: Arc<dyn FilterStore>) -> Result<Arc<Self>> {
        let mut state = match store.load().await.context("failed to load stored state")? {
            Some(state) => state,
            None => {
                info!("No stored state found, writing first-run defaults");
                let state = StoredState::default();
                store
                    .save(&state)
                    .await
                    .context("failed to write first-run defaults")?;
                state
            }
        };

        if state.sanitize_filters() {
            info!("Dropped blank smart filters during startup sanitation");
            store.save(&state).await?;
        }

        Ok(Arc::new(Self {
            store,
            matcher: ArcSwap::from_pointee(CompiledMatcher::compile(&state)),
            broadcaster: Broadcaster::new(),
        }))
    }

    /// Subscribes a page to mutation signals.
    pub fn subscribe(&self) -> mpsc::Receiver<Notification> {
        self.broadcaster.subscribe()
    }

    async fn load_state(&self) -> Result<StoredState> {
        Ok(self.store.load().await?.unwrap_or_default())
    }

    /// Read-modify-write helper. `apply` returns whether anything changed;
    /// only then is the document saved, the matcher rebuilt and the signal
    /// published.
    async fn mutate<F>(&self, apply: F, signal: Notification) -> Result<bool>
    where
        F: FnOnce(&mut StoredState) -> bool,
    {
        let mut state = self.load_state().await?;
        if !apply(&mut state) {
            return Ok(false);
        }
        self.store.save(&state).await?;
        self.matcher
            .store(Arc::new(CompiledMatcher::compile(&state)));
        self.broadcaster.publish(signal);
        Ok(true)
    }

    pub async fn add_blocked_channel(&self, channel_name: &str) -> Result<()> {
        let added = self
            .mutate(
                |state| state.add_blocked_channel(channel_name),
                Notification::ChannelsUpdated,
            )
            .await?;
        if added {
            info!("Blocked channel '{}'", channel_name);
        } else {
            debug!("Channel '{}' already blocked", channel_name);
        }
        Ok(())
    }

    pub async fn remove_blocked_channel(&self, channel_name: &str) -> Result<()> {
        let removed = self
            .mutate(
                |state| state.remove_blocked_channel(channel_name),
                Notification::ChannelsUpdated,
            )
            .await?;
        if removed {
            info!("Unblocked channel '{}'", channel_name);
        }
        Ok(())
    }

    /// Channel-only membership check against the current matcher.
    pub fn is_channel_blocked(&self, channel_name: &str) -> bool {
        match self.matcher.load().check_channel(channel_name) {
            Some(entry) => {
                debug!("Channel '{}' blocked by entry '{}'", channel_name, entry);
                true
            }
            None => false,
        }
    }

    pub async fn get_blocked_channels(&self) -> Result<BlockLists> {
        Ok(BlockLists::from(&self.load_state().await?))
    }

    /// Shallow per-key merge; the patch's keys win.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<()> {
        self.mutate(
            |state| {
                patch.apply(&mut state.settings);
                true
            },
            Notification::SettingsUpdated,
        )
        .await?;
        Ok(())
    }

    pub async fn get_settings(&self) -> Result<Settings> {
        Ok(self.load_state().await?.settings)
    }

    pub async fn add_smart_filter(&self, draft: FilterDraft) -> Result<()> {
        let now_ms = Utc::now().timestamp_millis();
        self.mutate(
            |state| {
                match draft {
                    FilterDraft::Keyword(d) => {
                        let ids: Vec<i64> =
                            state.smart_filters.keywords.iter().map(|f| f.id).collect();
                        state.smart_filters.keywords.push(KeywordFilter {
                            id: SmartFilters::next_id(&ids, now_ms),
                            text: d.text,
                            match_type: d.match_type.unwrap_or(MatchType::Partial),
                            enabled: true,
                        });
                    }
                    FilterDraft::Pattern(d) => {
                        let ids: Vec<i64> =
                            state.smart_filters.patterns.iter().map(|f| f.id).collect();
                        state.smart_filters.patterns.push(PatternFilter {
                            id: SmartFilters::next_id(&ids, now_ms),
                            kind: d.kind,
                            value: d.value,
                            enabled: true,
                        });
                    }
                }
                true
            },
            Notification::FiltersUpdated,
        )
        .await?;
        Ok(())
    }

    pub async fn remove_smart_filter(&self, kind: FilterKind, filter_id: i64) -> Result<()> {
        self.mutate(
            |state| {
                match kind {
                    FilterKind::Keyword => state
                        .smart_filters
                        .keywords
                        .retain(|f| f.id != filter_id),
                    FilterKind::Pattern => state
                        .smart_filters
                        .patterns
                        .retain(|f| f.id != filter_id),
                }
                true
            },
            Notification::FiltersUpdated,
        )
        .await?;
        Ok(())
    }

    pub async fn get_smart_filters(&self) -> Result<SmartFilters> {
        Ok(self.load_state().await?.smart_filters)
    }

    /// Full verdict for one content descriptor.
    pub fn check_content_blocked(&self, content: &ContentDescriptor) -> Verdict {
        self.matcher.load().evaluate(content)
    }

    /// Signals subscribed pages that a page finished loading and should
    /// rescan. Best-effort, like every broadcast.
    pub fn page_loaded(&self) {
        self.broadcaster.publish(Notification::PageUpdated);
    }
}
