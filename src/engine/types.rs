use crate::store::{KeywordFilter, PatternFilter};
use serde::{Deserialize, Serialize};

/// Ephemeral descriptor for one piece of rendered content, derived per
/// scanned element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentDescriptor {
    pub channel_name: String,
    pub video_title: String,
    pub description: String,
}

impl ContentDescriptor {
    pub fn channel(name: impl Into<String>) -> Self {
        Self {
            channel_name: name.into(),
            ..Default::default()
        }
    }
}

/// Outcome of evaluating a descriptor against the active filter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<BlockReason>,
    #[serde(rename = "filter", skip_serializing_if = "Option::is_none")]
    pub matched_filter: Option<MatchedFilter>,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            blocked: false,
            reason: None,
            matched_filter: None,
        }
    }

    pub fn channel() -> Self {
        Self {
            blocked: true,
            reason: Some(BlockReason::Channel),
            matched_filter: None,
        }
    }

    pub fn keyword(filter: KeywordFilter) -> Self {
        Self {
            blocked: true,
            reason: Some(BlockReason::Keyword),
            matched_filter: Some(MatchedFilter::Keyword(filter)),
        }
    }

    pub fn pattern(filter: PatternFilter) -> Self {
        Self {
            blocked: true,
            reason: Some(BlockReason::Pattern),
            matched_filter: Some(MatchedFilter::Pattern(filter)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockReason {
    Channel,
    Keyword,
    Pattern,
}

/// The rule that produced a blocking verdict. Untagged: the two shapes are
/// distinguishable by their fields, and the wire form stays identical to the
/// stored filter objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchedFilter {
    Keyword(KeywordFilter),
    Pattern(PatternFilter),
}

impl MatchedFilter {
    pub fn id(&self) -> i64 {
        match self {
            MatchedFilter::Keyword(f) => f.id,
            MatchedFilter::Pattern(f) => f.id,
        }
    }
}
