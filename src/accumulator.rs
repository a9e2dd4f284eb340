//! Per-parameter confusion-matrix tallies.

use crate::record::Record;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

/// Which of the four confusion outcomes a record falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    TruePositive,
    FalsePositive,
    FalseNegative,
    TrueNegative,
}

impl Outcome {
    pub fn classify(expected: bool, detected: bool) -> Self {
        match (expected, detected) {
            (true, true) => Self::TruePositive,
            (false, true) => Self::FalsePositive,
            (true, false) => Self::FalseNegative,
            (false, false) => Self::TrueNegative,
        }
    }
}

/// Four outcome counters for one parameter value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionBucket {
    pub true_positive: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    pub true_negative: u64,
}

impl ConfusionBucket {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::TruePositive => self.true_positive += 1,
            Outcome::FalsePositive => self.false_positive += 1,
            Outcome::FalseNegative => self.false_negative += 1,
            Outcome::TrueNegative => self.true_negative += 1,
        }
    }

    /// Number of records tallied into this bucket.
    pub fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.false_negative + self.true_negative
    }

    /// Ground-truth positives (TP + FN).
    pub fn positives(&self) -> u64 {
        self.true_positive + self.false_negative
    }

    /// Ground-truth negatives (FP + TN).
    pub fn negatives(&self) -> u64 {
        self.false_positive + self.true_negative
    }

    pub fn merge(&mut self, other: &ConfusionBucket) {
        self.true_positive += other.true_positive;
        self.false_positive += other.false_positive;
        self.false_negative += other.false_negative;
        self.true_negative += other.true_negative;
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AccumulateError {
    #[error("record has an empty parameter")]
    EmptyParameter,
}

/// Record that could not be tallied, with its position in the input batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub index: usize,
    pub error: AccumulateError,
}

/// Confusion buckets keyed by the verbatim parameter string.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Accumulator {
    buckets: BTreeMap<String, ConfusionBucket>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert-if-absent accessor: a parameter seen for the first time gets a
    /// zero-initialized bucket.
    pub fn bucket_mut(&mut self, parameter: &str) -> &mut ConfusionBucket {
        if !self.buckets.contains_key(parameter) {
            debug!(parameter, "new confusion bucket");
        }
        self.buckets.entry(parameter.to_string()).or_default()
    }

    pub fn bucket(&self, parameter: &str) -> Option<&ConfusionBucket> {
        self.buckets.get(parameter)
    }

    /// Tally one record.
    pub fn add(&mut self, record: &Record) -> Result<Outcome, AccumulateError> {
        if record.parameter.is_empty() {
            return Err(AccumulateError::EmptyParameter);
        }
        let outcome = Outcome::classify(record.expected, record.detected);
        self.bucket_mut(&record.parameter).record(outcome);
        Ok(outcome)
    }

    /// Tally every record, returning the ones that were rejected. Rejected
    /// records never touch a counter.
    pub fn ingest<'a, I>(&mut self, records: I) -> Vec<Rejected>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut rejected = Vec::new();
        let mut accepted = 0usize;
        for (index, record) in records.into_iter().enumerate() {
            match self.add(record) {
                Ok(_) => accepted += 1,
                Err(error) => rejected.push(Rejected { index, error }),
            }
        }
        info!(
            accepted,
            rejected = rejected.len(),
            buckets = self.buckets.len(),
            "ingested records"
        );
        rejected
    }

    /// Sum same-key counters from another accumulation into this one.
    pub fn merge(&mut self, other: &Accumulator) {
        for (parameter, bucket) in &other.buckets {
            self.bucket_mut(parameter).merge(bucket);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfusionBucket)> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn record_count(&self) -> u64 {
        self.buckets.values().map(ConfusionBucket::total).sum()
    }
}

/// Build an accumulation from a batch, together with the rejected records.
pub fn ingest(records: &[Record]) -> (Accumulator, Vec<Rejected>) {
    let mut acc = Accumulator::new();
    let rejected = acc.ingest(records);
    (acc, rejected)
}

impl<'a> Extend<&'a Record> for Accumulator {
    fn extend<I: IntoIterator<Item = &'a Record>>(&mut self, iter: I) {
        for rejected in self.ingest(iter) {
            debug!(index = rejected.index, error = %rejected.error, "skipped record");
        }
    }
}
