pub mod memory;
pub mod sqlite;
pub mod state;

pub use self::memory::MemoryStore;
pub use self::sqlite::SqliteStore;
pub use self::state::{
    BlockLists, ButtonSize, KeywordFilter, MatchType, PatternFilter, PatternKind, Settings,
    SettingsPatch, SmartFilters, StoredState,
};

use anyhow::Result;
use async_trait::async_trait;

/// Storage port for the persisted state document. Implementations are
/// injected into the service; nothing else touches persistence.
#[async_trait]
pub trait FilterStore: Send + Sync {
    /// Reads the current document. `None` means the store has never been
    /// written (first run).
    async fn load(&self) -> Result<Option<StoredState>>;

    /// Replaces the document. There is no partial write; callers perform
    /// read-modify-write round trips.
    async fn save(&self, state: &StoredState) -> Result<()>;
}
