pub mod log;
pub mod metrics;

pub use self::log::FeedLog;
pub use self::metrics::{FeedCounters, FeedMetrics};
