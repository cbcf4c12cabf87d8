use crate::model::RssiSampleSet;
use crate::render::surface::Rgba;

pub const BUCKET_COUNT: usize = 11;
pub const LOWEST_THRESHOLD_DBM: i32 = -100;
pub const BUCKET_WIDTH_DBM: i32 = 10;
pub const SERIES_LABEL: &str = "Device RSSI Distribution";

/// Where a single reading lands in the histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketAssignment {
    Bucket(usize),
    /// Readings at or above 0 dBm exceed every threshold and are not counted.
    AtOrAboveZero,
}

impl BucketAssignment {
    pub fn classify(rssi: i32) -> Self {
        if rssi >= 0 {
            return BucketAssignment::AtOrAboveZero;
        }
        let index = (rssi - LOWEST_THRESHOLD_DBM)
            .div_euclid(BUCKET_WIDTH_DBM)
            .clamp(0, BUCKET_COUNT as i32 - 1);
        BucketAssignment::Bucket(index as usize)
    }
}

/// Styling of the single histogram series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub label: &'static str,
    pub data: [u32; BUCKET_COUNT],
    pub fill: Rgba,
    pub border: Rgba,
    pub border_width: f32,
}

/// Bucket counts for one poll generation of RSSI samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssiHistogram {
    counts: [u32; BUCKET_COUNT],
    dropped: u32,
}

impl RssiHistogram {
    pub fn counts(&self) -> &[u32; BUCKET_COUNT] {
        &self.counts
    }

    /// Samples that fell through every threshold.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn thresholds() -> [i32; BUCKET_COUNT] {
        let mut thresholds = [0; BUCKET_COUNT];
        for (index, threshold) in thresholds.iter_mut().enumerate() {
            *threshold = LOWEST_THRESHOLD_DBM + index as i32 * BUCKET_WIDTH_DBM;
        }
        thresholds
    }

    pub fn labels() -> Vec<String> {
        Self::thresholds()
            .iter()
            .map(|threshold| format!("{}dBm~", threshold))
            .collect()
    }

    pub fn series(&self) -> HistogramSeries {
        HistogramSeries {
            label: SERIES_LABEL,
            data: self.counts,
            fill: Rgba::new(75, 192, 192, 0.2),
            border: Rgba::opaque(75, 192, 192),
            border_width: 1.0,
        }
    }
}

/// Bins every known RSSI sample into fixed 10 dBm buckets.
pub struct RssiHistogramAggregator;

impl RssiHistogramAggregator {
    /// Recounts from scratch; sample sets are replaced wholesale each poll.
    pub fn aggregate(samples: &RssiSampleSet) -> RssiHistogram {
        let mut histogram = RssiHistogram::default();
        for rssi in samples.samples() {
            match BucketAssignment::classify(rssi) {
                BucketAssignment::Bucket(index) => histogram.counts[index] += 1,
                BucketAssignment::AtOrAboveZero => histogram.dropped += 1,
            }
        }
        histogram
    }
}
