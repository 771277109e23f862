mod content_store;

pub use self::content_store::{ContentStore, SavedPost};
