//! True/false positive rates derived from finished confusion buckets.
//!
//! A rate whose denominator is zero (no ground-truth positives for `tprate`,
//! no ground-truth negatives for `fprate`) is undefined and represented as
//! `None`. It is never reported as zero.

use crate::accumulator::{Accumulator, ConfusionBucket};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatePair {
    /// TP / (TP + FN)
    pub tprate: Option<f64>,
    /// FP / (FP + TN)
    pub fprate: Option<f64>,
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

impl RatePair {
    pub fn from_bucket(bucket: &ConfusionBucket) -> Self {
        Self {
            tprate: ratio(bucket.true_positive, bucket.positives()),
            fprate: ratio(bucket.false_positive, bucket.negatives()),
        }
    }
}

impl From<&ConfusionBucket> for RatePair {
    fn from(bucket: &ConfusionBucket) -> Self {
        Self::from_bucket(bucket)
    }
}

/// Rates for every parameter of a finished accumulation.
pub fn derive_rates(acc: &Accumulator) -> BTreeMap<String, RatePair> {
    acc.iter()
        .map(|(parameter, bucket)| (parameter.to_string(), RatePair::from_bucket(bucket)))
        .collect()
}
