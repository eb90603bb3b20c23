use super::page::{NodeId, PageSurface};

/// Selector candidates for the channel-name element, tried in order. The
/// mix covers the grid/list/compact video layouts, the metadata block and
/// comment threads.
pub const CHANNEL_SELECTORS: &[&str] = &[
    "ytd-channel-name a",
    "#channel-name a",
    ".ytd-channel-name a",
    "[id=\"channel-name\"] a",
    "#owner-text a",
    ".owner-text a",
    "#text.ytd-channel-name",
    ".ytd-video-meta-block #channel-name",
    "#author-text",
    ".ytd-comment-renderer #author-text",
];

/// First non-empty, non-bare-`@` text among the candidates, with a leading
/// `@` handle marker stripped. `None` means the element carries no
/// recognizable channel name and is skipped entirely.
pub fn extract_channel_name(page: &dyn PageSurface, element: NodeId) -> Option<String> {
    for selector in CHANNEL_SELECTORS {
        let Some(text) = page.query_text(element, selector) else {
            continue;
        };
        let text = text.trim();
        if text.is_empty() || text == "@" {
            continue;
        }
        let name = text.strip_prefix('@').unwrap_or(text).trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::page::MemoryPage;

    #[test]
    fn test_extracts_first_candidate_and_strips_handle() {
        let page = MemoryPage::new();
        let card = page.add_element(None, "ytd-video-renderer");
        let name = page.add_element(Some(card), "ytd-channel-name");
        let link = page.add_element(Some(name), "a");
        page.set_text(link, "  @AcmeVideos ");

        assert_eq!(
            extract_channel_name(&page, card),
            Some("AcmeVideos".to_string())
        );
    }

    #[test]
    fn test_falls_through_empty_and_bare_at_candidates() {
        let page = MemoryPage::new();
        let card = page.add_element(None, "ytd-video-renderer");
        // First candidate resolves to a bare "@": must be skipped.
        let name = page.add_element(Some(card), "ytd-channel-name");
        let link = page.add_element(Some(name), "a");
        page.set_text(link, "@");
        // A later candidate carries the real name.
        let author = page.add_element(Some(card), "span");
        page.set_id(author, "author-text");
        page.set_text(author, "RealName");

        assert_eq!(
            extract_channel_name(&page, card),
            Some("RealName".to_string())
        );
    }

    #[test]
    fn test_no_candidate_yields_none() {
        let page = MemoryPage::new();
        let card = page.add_element(None, "ytd-video-renderer");
        page.add_element(Some(card), "div");

        assert_eq!(extract_channel_name(&page, card), None);
    }
}
