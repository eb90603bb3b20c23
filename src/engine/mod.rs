mod matcher;
mod traits;
pub mod types;

pub use matcher::CompiledMatcher;
pub use traits::ContentMatcher;
pub use types::{BlockReason, ContentDescriptor, MatchedFilter, Verdict};
