use super::traits::ContentMatcher;
use super::types::{ContentDescriptor, Verdict};
use crate::store::{MatchType, PatternKind, StoredState};
use regex::Regex;
use rustc_hash::FxHashSet;
use tracing::warn;

/// Filter set compiled into lookup-friendly form: hashed exact sets for the
/// channel lists, pre-built regexes for wildcard entries, lowercased needles
/// for everything matched case-insensitively. Disabled and blank filters are
/// dropped here so the hot path never sees them.
pub struct CompiledMatcher {
    excluded: FxHashSet<Box<str>>,
    exact: FxHashSet<Box<str>>,
    // Wildcard/substring entries in list order; the first hit is reported.
    rules: Vec<ChannelRule>,
    keywords: Vec<CompiledKeyword>,
    patterns: Vec<CompiledPattern>,
}

struct ChannelRule {
    entry: Box<str>,
    kind: RuleKind,
}

enum RuleKind {
    Wildcard(Regex),
    Substring(Box<str>),
}

struct CompiledKeyword {
    text: Box<str>,
    filter: crate::store::KeywordFilter,
}

struct CompiledPattern {
    value: Box<str>,
    filter: crate::store::PatternFilter,
}

impl CompiledMatcher {
    pub fn compile(state: &StoredState) -> Self {
        let excluded = state
            .excluded_channels
            .iter()
            .map(|c| c.clone().into_boxed_str())
            .collect();

        let mut exact = FxHashSet::default();
        let mut rules = Vec::new();
        for entry in &state.blocked_channels {
            if entry.trim().is_empty() {
                continue;
            }
            exact.insert(entry.clone().into_boxed_str());

            if entry.contains('*') {
                // Minimal wildcard translation: `*` is any sequence, the
                // match is anchored and case-insensitive. Other regex
                // metacharacters pass through unescaped.
                let pattern = format!("(?i)^{}$", entry.replace('*', ".*"));
                match Regex::new(&pattern) {
                    Ok(re) => rules.push(ChannelRule {
                        entry: entry.clone().into_boxed_str(),
                        kind: RuleKind::Wildcard(re),
                    }),
                    Err(e) => {
                        warn!("Skipping unparsable wildcard entry '{}': {}", entry, e);
                    }
                }
            } else {
                rules.push(ChannelRule {
                    entry: entry.clone().into_boxed_str(),
                    kind: RuleKind::Substring(entry.to_lowercase().into_boxed_str()),
                });
            }
        }

        let keywords = state
            .smart_filters
            .keywords
            .iter()
            .filter(|f| f.enabled && !f.text.trim().is_empty())
            .map(|f| CompiledKeyword {
                text: f.text.to_lowercase().into_boxed_str(),
                filter: f.clone(),
            })
            .collect();

        let patterns = state
            .smart_filters
            .patterns
            .iter()
            .filter(|f| f.enabled && !f.value.trim().is_empty())
            .map(|f| CompiledPattern {
                value: f.value.to_lowercase().into_boxed_str(),
                filter: f.clone(),
            })
            .collect();

        Self {
            excluded,
            exact,
            rules,
            keywords,
            patterns,
        }
    }
}

impl ContentMatcher for CompiledMatcher {
    fn check_channel(&self, channel: &str) -> Option<&str> {
        // 1. Exclusion short-circuits every block rule.
        if self.excluded.contains(channel) {
            return None;
        }

        // 2. Exact literal membership.
        if let Some(entry) = self.exact.get(channel) {
            return Some(entry);
        }

        // 3. Wildcard / substring entries in list order.
        let lowered = channel.to_lowercase();
        for rule in &self.rules {
            let hit = match &rule.kind {
                RuleKind::Wildcard(re) => re.is_match(channel),
                RuleKind::Substring(needle) => lowered.contains(needle.as_ref()),
            };
            if hit {
                return Some(&rule.entry);
            }
        }

        None
    }

    fn evaluate(&self, content: &ContentDescriptor) -> Verdict {
        // 1. Channel membership is the cheapest check and wins outright.
        if self.exact.contains(content.channel_name.as_str()) {
            return Verdict::channel();
        }

        let haystack = format!(
            "{} {} {}",
            content.channel_name, content.video_title, content.description
        )
        .to_lowercase();

        // 2. Keyword filters in list order, first match wins.
        for kw in &self.keywords {
            let hit = match kw.filter.match_type {
                MatchType::Exact => haystack.split_whitespace().any(|t| t == kw.text.as_ref()),
                MatchType::Partial => haystack.contains(kw.text.as_ref()),
            };
            if hit {
                return Verdict::keyword(kw.filter.clone());
            }
        }

        // 3. Pattern filters in list order, first match wins.
        let channel = content.channel_name.to_lowercase();
        let title = content.video_title.to_lowercase();
        for p in &self.patterns {
            let value = p.value.as_ref();
            let hit = match p.filter.kind {
                PatternKind::Contains => haystack.contains(value),
                PatternKind::StartsWith => {
                    channel.starts_with(value) || title.starts_with(value)
                }
                PatternKind::EndsWith => channel.ends_with(value) || title.ends_with(value),
                PatternKind::Exactly => channel == value || title == value,
            };
            if hit {
                return Verdict::pattern(p.filter.clone());
            }
        }

        Verdict::allow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::BlockReason;
    use crate::store::{KeywordFilter, PatternFilter};

    fn state_with_channels(blocked: &[&str], excluded: &[&str]) -> StoredState {
        StoredState {
            blocked_channels: blocked.iter().map(|s| s.to_string()).collect(),
            excluded_channels: excluded.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn keyword(id: i64, text: &str, match_type: MatchType, enabled: bool) -> KeywordFilter {
        KeywordFilter {
            id,
            text: text.to_string(),
            match_type,
            enabled,
        }
    }

    fn pattern(id: i64, kind: PatternKind, value: &str, enabled: bool) -> PatternFilter {
        PatternFilter {
            id,
            kind,
            value: value.to_string(),
            enabled,
        }
    }

    #[test]
    fn test_exact_membership_blocks() {
        let matcher = CompiledMatcher::compile(&state_with_channels(&["SpamCo"], &[]));
        assert_eq!(matcher.check_channel("SpamCo"), Some("SpamCo"));
        assert_eq!(matcher.check_channel("Legit"), None);
    }

    #[test]
    fn test_exclusion_overrides_any_block_rule() {
        let matcher =
            CompiledMatcher::compile(&state_with_channels(&["SpamCo", "Spam*"], &["SpamCo"]));
        assert_eq!(matcher.check_channel("SpamCo"), None);
        // Exclusion is exact: other channels still match the rules.
        assert!(matcher.check_channel("SpamCorp").is_some());
    }

    #[test]
    fn test_wildcard_is_anchored_and_case_insensitive() {
        let matcher = CompiledMatcher::compile(&state_with_channels(&["Foo*"], &[]));
        assert_eq!(matcher.check_channel("FooBar"), Some("Foo*"));
        assert_eq!(matcher.check_channel("foobar"), Some("Foo*"));
        assert_eq!(matcher.check_channel("XFoo"), None);
    }

    #[test]
    fn test_plain_entry_matches_substring_case_insensitively() {
        let matcher = CompiledMatcher::compile(&state_with_channels(&["spam"], &[]));
        assert_eq!(matcher.check_channel("TotallySPAMChannel"), Some("spam"));
        assert_eq!(matcher.check_channel("Wholesome"), None);
    }

    #[test]
    fn test_first_matching_entry_is_reported() {
        let matcher = CompiledMatcher::compile(&state_with_channels(&["Gadget*", "get"], &[]));
        assert_eq!(matcher.check_channel("GadgetWorld"), Some("Gadget*"));

        let flipped = CompiledMatcher::compile(&state_with_channels(&["get", "Gadget*"], &[]));
        assert_eq!(flipped.check_channel("GadgetWorld"), Some("get"));
    }

    #[test]
    fn test_blank_channel_entry_never_matches_everything() {
        let matcher = CompiledMatcher::compile(&state_with_channels(&["", "  "], &[]));
        assert_eq!(matcher.check_channel("Anything"), None);
    }

    #[test]
    fn test_unparsable_wildcard_entry_is_skipped() {
        let matcher = CompiledMatcher::compile(&state_with_channels(&["Foo(*"], &[]));
        assert_eq!(matcher.check_channel("Foo(Bar"), None);
    }

    #[test]
    fn test_empty_filter_set_never_blocks() {
        let matcher = CompiledMatcher::compile(&StoredState::default());
        assert_eq!(matcher.check_channel("Anyone"), None);
        let verdict = matcher.evaluate(&ContentDescriptor::channel("Anyone"));
        assert!(!verdict.blocked);
    }

    #[test]
    fn test_evaluate_channel_match_has_highest_priority() {
        let mut state = state_with_channels(&["SpamCo"], &[]);
        state.smart_filters.keywords = vec![keyword(1, "spamco", MatchType::Partial, true)];
        let matcher = CompiledMatcher::compile(&state);

        let verdict = matcher.evaluate(&ContentDescriptor::channel("SpamCo"));
        assert!(verdict.blocked);
        assert_eq!(verdict.reason, Some(BlockReason::Channel));
        assert!(verdict.matched_filter.is_none());
    }

    #[test]
    fn test_evaluate_keyword_partial_match() {
        let mut state = StoredState::default();
        state.smart_filters.keywords = vec![keyword(1, "sale", MatchType::Partial, true)];
        let matcher = CompiledMatcher::compile(&state);

        let verdict = matcher.evaluate(&ContentDescriptor {
            channel_name: "X".into(),
            video_title: "Big Sale Today".into(),
            description: String::new(),
        });
        assert!(verdict.blocked);
        assert_eq!(verdict.reason, Some(BlockReason::Keyword));
        assert_eq!(verdict.matched_filter.unwrap().id(), 1);
    }

    #[test]
    fn test_evaluate_keyword_exact_requires_whole_token() {
        let mut state = StoredState::default();
        state.smart_filters.keywords = vec![keyword(1, "cat", MatchType::Exact, true)];
        let matcher = CompiledMatcher::compile(&state);

        let miss = matcher.evaluate(&ContentDescriptor {
            channel_name: "X".into(),
            video_title: "concatenate".into(),
            description: String::new(),
        });
        assert!(!miss.blocked);

        let hit = matcher.evaluate(&ContentDescriptor {
            channel_name: "X".into(),
            video_title: "my cat video".into(),
            description: String::new(),
        });
        assert!(hit.blocked);
    }

    #[test]
    fn test_evaluate_disabled_filters_are_skipped() {
        let mut state = StoredState::default();
        state.smart_filters.keywords = vec![keyword(1, "sale", MatchType::Partial, false)];
        state.smart_filters.patterns =
            vec![pattern(2, PatternKind::Contains, "sale", false)];
        let matcher = CompiledMatcher::compile(&state);

        let verdict = matcher.evaluate(&ContentDescriptor {
            channel_name: "X".into(),
            video_title: "Big Sale Today".into(),
            description: String::new(),
        });
        assert!(!verdict.blocked);
    }

    #[test]
    fn test_evaluate_blank_filters_are_dropped() {
        let mut state = StoredState::default();
        state.smart_filters.keywords = vec![keyword(1, "   ", MatchType::Partial, true)];
        state.smart_filters.patterns = vec![pattern(2, PatternKind::Contains, "", true)];
        let matcher = CompiledMatcher::compile(&state);

        let verdict = matcher.evaluate(&ContentDescriptor {
            channel_name: "X".into(),
            video_title: "anything at all".into(),
            description: String::new(),
        });
        assert!(!verdict.blocked);
    }

    #[test]
    fn test_evaluate_starts_with_checks_channel_and_title_only() {
        let mut state = StoredState::default();
        state.smart_filters.patterns =
            vec![pattern(1, PatternKind::StartsWith, "abc", true)];
        let matcher = CompiledMatcher::compile(&state);

        assert!(
            matcher
                .evaluate(&ContentDescriptor::channel("ABCShow"))
                .blocked
        );
        assert!(
            matcher
                .evaluate(&ContentDescriptor {
                    channel_name: "X".into(),
                    video_title: "abcd".into(),
                    description: String::new(),
                })
                .blocked
        );
        // A description-only occurrence must not match.
        assert!(
            !matcher
                .evaluate(&ContentDescriptor {
                    channel_name: "X".into(),
                    video_title: "Y".into(),
                    description: "abc everywhere".into(),
                })
                .blocked
        );
    }

    #[test]
    fn test_evaluate_pattern_kinds() {
        let mut state = StoredState::default();
        state.smart_filters.patterns = vec![
            pattern(1, PatternKind::EndsWith, "tv", true),
            pattern(2, PatternKind::Exactly, "newsroom", true),
            pattern(3, PatternKind::Contains, "giveaway", true),
        ];
        let matcher = CompiledMatcher::compile(&state);

        let ends = matcher.evaluate(&ContentDescriptor::channel("RetroTV"));
        assert_eq!(ends.matched_filter.as_ref().unwrap().id(), 1);

        let exactly = matcher.evaluate(&ContentDescriptor::channel("NewsRoom"));
        assert_eq!(exactly.matched_filter.as_ref().unwrap().id(), 2);

        let contains = matcher.evaluate(&ContentDescriptor {
            channel_name: "X".into(),
            video_title: "Y".into(),
            description: "huge GIVEAWAY inside".into(),
        });
        assert_eq!(contains.matched_filter.as_ref().unwrap().id(), 3);
    }

    #[test]
    fn test_evaluate_first_keyword_in_list_order_wins() {
        let mut state = StoredState::default();
        state.smart_filters.keywords = vec![
            keyword(1, "sale", MatchType::Partial, true),
            keyword(2, "big", MatchType::Partial, true),
        ];
        let matcher = CompiledMatcher::compile(&state);

        let verdict = matcher.evaluate(&ContentDescriptor {
            channel_name: "X".into(),
            video_title: "Big Sale".into(),
            description: String::new(),
        });
        assert_eq!(verdict.matched_filter.unwrap().id(), 1);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut state = state_with_channels(&["spam"], &[]);
        state.smart_filters.keywords = vec![keyword(1, "sale", MatchType::Partial, true)];
        let matcher = CompiledMatcher::compile(&state);

        let content = ContentDescriptor {
            channel_name: "SomeSpammer".into(),
            video_title: "Big Sale".into(),
            description: "desc".into(),
        };
        assert_eq!(matcher.evaluate(&content), matcher.evaluate(&content));
    }
}
