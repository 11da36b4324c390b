mod entry;
mod release;

pub use entry::FeedEntry;
pub use release::{Language, NewUpdate, ReleaseTitle, Resolved, Series, UpdateView};
