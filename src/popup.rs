use crate::service::BlockerService;
use crate::store::{BlockLists, Settings, SettingsPatch};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const EXPORT_VERSION: &str = "1.0";

/// Backup file shape. `data` is the full list snapshot; the document is
/// self-contained and can be re-imported into an empty store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub data: BlockLists,
    pub settings: Settings,
}

/// What an import actually reads. Unknown top-level keys are ignored;
/// a missing `data` field makes the whole document invalid.
#[derive(Debug, Clone, Deserialize)]
struct ImportDocument {
    #[serde(default)]
    data: Option<BlockLists>,
    #[serde(default)]
    settings: Option<SettingsPatch>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
}

/// Thin list-management surface. No blocking logic lives here; every
/// operation delegates to the service, and the bulk operations keep the
/// one-round-trip-per-item semantics (a mid-sequence failure leaves the
/// earlier items applied).
#[derive(Clone)]
pub struct PopupController {
    service: Arc<BlockerService>,
}

impl PopupController {
    pub fn new(service: Arc<BlockerService>) -> Self {
        Self { service }
    }

    pub async fn block_channel(&self, channel_name: &str) -> Result<()> {
        let channel_name = channel_name.trim();
        if channel_name.is_empty() {
            return Ok(());
        }
        self.service.add_blocked_channel(channel_name).await
    }

    pub async fn unblock_channel(&self, channel_name: &str) -> Result<()> {
        self.service.remove_blocked_channel(channel_name).await
    }

    pub async fn blocked_channels(&self) -> Result<Vec<String>> {
        Ok(self.service.get_blocked_channels().await?.blocked_channels)
    }

    pub async fn export(&self) -> Result<ExportDocument> {
        Ok(ExportDocument {
            version: EXPORT_VERSION.to_string(),
            timestamp: Utc::now(),
            data: self.service.get_blocked_channels().await?,
            settings: self.service.get_settings().await?,
        })
    }

    /// Imports a backup document: channel entries one by one, then the
    /// settings object. Validation happens before anything is applied.
    pub async fn import(&self, document: serde_json::Value) -> Result<ImportSummary> {
        let document: ImportDocument =
            serde_json::from_value(document).context("unreadable import document")?;
        let data = document
            .data
            .ok_or_else(|| anyhow!("import document is missing the 'data' field"))?;

        let mut imported = 0;
        for channel in &data.blocked_channels {
            self.service
                .add_blocked_channel(channel)
                .await
                .with_context(|| format!("import stopped after {} channels", imported))?;
            imported += 1;
        }

        if let Some(settings) = document.settings {
            self.service
                .update_settings(settings)
                .await
                .context("imported channels but failed to apply settings")?;
        }

        info!("Imported {} channel entries", imported);
        Ok(ImportSummary { imported })
    }

    /// Removes every blocked channel, one round trip per entry.
    pub async fn clear_all(&self) -> Result<usize> {
        let channels = self.blocked_channels().await?;
        let mut removed = 0;
        for channel in &channels {
            self.service
                .remove_blocked_channel(channel)
                .await
                .with_context(|| format!("clear stopped after removing {} channels", removed))?;
            removed += 1;
        }
        info!("Cleared {} blocked channels", removed);
        Ok(removed)
    }
}
