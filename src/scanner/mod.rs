pub mod extract;
pub mod page;
mod runner;

pub use extract::{extract_channel_name, CHANNEL_SELECTORS};
pub use page::{MemoryPage, NodeId, PageSurface};
pub use runner::{PageEvent, PageScanner, CHANNEL_ATTR, PROCESSED_ATTR, VIDEO_SELECTORS};
