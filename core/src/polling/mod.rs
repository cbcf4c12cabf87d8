pub mod feed;
pub mod scheduler;

pub use feed::{Feed, FeedFuture, FeedOutcome, FeedSource, FeedUpdate};
pub use scheduler::{PollingHandle, PollingScheduler, DEFAULT_POLL_PERIOD};
