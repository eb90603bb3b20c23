use super::types::{ContentDescriptor, Verdict};

/// The "Hot Path" for per-element checks. A matcher is immutable once built;
/// the service swaps in a freshly compiled one after every mutation.
pub trait ContentMatcher: Send + Sync {
    /// Channel-only membership check. Returns the block-list entry that
    /// matched, `None` when the channel is allowed (including via exclusion).
    fn check_channel(&self, channel: &str) -> Option<&str>;

    /// Full verdict over channel name, title and description.
    fn evaluate(&self, content: &ContentDescriptor) -> Verdict;
}
