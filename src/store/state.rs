use serde::{Deserialize, Serialize};

/// The single persisted state document. Field names follow the wire/export
/// shape (camelCase), so the same types serve storage, the HTTP surface and
/// the export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredState {
    pub blocked_channels: Vec<String>,
    pub excluded_channels: Vec<String>,
    pub blocked_titles: Vec<String>,
    pub blocked_comments: Vec<String>,
    pub smart_filters: SmartFilters,
    pub settings: Settings,
}

impl Default for StoredState {
    fn default() -> Self {
        Self {
            blocked_channels: vec![],
            excluded_channels: vec![],
            blocked_titles: vec![],
            blocked_comments: vec![],
            smart_filters: SmartFilters::default(),
            settings: Settings::default(),
        }
    }
}

impl StoredState {
    /// Inserts a channel entry unless the exact string is already present.
    /// Returns true when the list changed.
    pub fn add_blocked_channel(&mut self, name: &str) -> bool {
        if self.blocked_channels.iter().any(|c| c == name) {
            return false;
        }
        self.blocked_channels.push(name.to_string());
        true
    }

    /// Removes an exact channel entry. Returns true when the list changed.
    pub fn remove_blocked_channel(&mut self, name: &str) -> bool {
        let before = self.blocked_channels.len();
        self.blocked_channels.retain(|c| c != name);
        self.blocked_channels.len() < before
    }

    /// Drops smart filters with empty or whitespace-only text/value.
    /// Returns true when anything was removed.
    pub fn sanitize_filters(&mut self) -> bool {
        let before =
            self.smart_filters.keywords.len() + self.smart_filters.patterns.len();
        self.smart_filters
            .keywords
            .retain(|f| !f.text.trim().is_empty());
        self.smart_filters
            .patterns
            .retain(|f| !f.value.trim().is_empty());
        before > self.smart_filters.keywords.len() + self.smart_filters.patterns.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartFilters {
    pub keywords: Vec<KeywordFilter>,
    pub patterns: Vec<PatternFilter>,
}

impl SmartFilters {
    /// Smallest id that is both >= `candidate` and unused in `existing`.
    /// Ids are creation timestamps in milliseconds; the bump keeps two
    /// inserts within the same millisecond distinct.
    pub fn next_id(existing: &[i64], candidate: i64) -> i64 {
        let max = existing.iter().copied().max().unwrap_or(i64::MIN);
        if candidate > max {
            candidate
        } else {
            max + 1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordFilter {
    pub id: i64,
    pub text: String,
    pub match_type: MatchType,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Must equal one whitespace-delimited token of the haystack.
    Exact,
    /// Substring containment.
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternFilter {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: PatternKind,
    pub value: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    Contains,
    StartsWith,
    EndsWith,
    Exactly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub show_buttons: bool,
    pub button_color: String,
    pub button_size: ButtonSize,
    pub sync_enabled: bool,
    pub hide_shorts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_buttons: default_show_buttons(),
            button_color: default_button_color(),
            button_size: ButtonSize::default(),
            sync_enabled: default_sync_enabled(),
            hide_shorts: false,
        }
    }
}

fn default_show_buttons() -> bool {
    true
}
fn default_button_color() -> String {
    "#ff4444".to_string()
}
fn default_sync_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Partial settings update. Present keys win over the stored value, absent
/// keys are left untouched (shallow merge, later write wins per key).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_buttons: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_size: Option<ButtonSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_shorts: Option<bool>,
}

impl SettingsPatch {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(v) = self.show_buttons {
            settings.show_buttons = v;
        }
        if let Some(ref v) = self.button_color {
            settings.button_color = v.clone();
        }
        if let Some(v) = self.button_size {
            settings.button_size = v;
        }
        if let Some(v) = self.sync_enabled {
            settings.sync_enabled = v;
        }
        if let Some(v) = self.hide_shorts {
            settings.hide_shorts = v;
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            show_buttons: Some(settings.show_buttons),
            button_color: Some(settings.button_color.clone()),
            button_size: Some(settings.button_size),
            sync_enabled: Some(settings.sync_enabled),
            hide_shorts: Some(settings.hide_shorts),
        }
    }
}

/// Reply shape for the list query: every stored list plus the smart filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockLists {
    pub blocked_channels: Vec<String>,
    pub excluded_channels: Vec<String>,
    pub blocked_titles: Vec<String>,
    pub blocked_comments: Vec<String>,
    pub smart_filters: SmartFilters,
}

impl Default for BlockLists {
    fn default() -> Self {
        Self::from(&StoredState::default())
    }
}

impl From<&StoredState> for BlockLists {
    fn from(state: &StoredState) -> Self {
        Self {
            blocked_channels: state.blocked_channels.clone(),
            excluded_channels: state.excluded_channels.clone(),
            blocked_titles: state.blocked_titles.clone(),
            blocked_comments: state.blocked_comments.clone(),
            smart_filters: state.smart_filters.clone(),
        }
    }
}
