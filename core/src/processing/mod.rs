pub mod histogram;

pub use histogram::{BucketAssignment, HistogramSeries, RssiHistogram, RssiHistogramAggregator};
