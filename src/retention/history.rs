//! Fixed-capacity sample history.

use std::collections::VecDeque;
use std::fmt::Display;

/// Ring buffer of sampled values. The oldest sample is evicted once the
/// buffer is full.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<u64>,
    capacity: usize,
}

impl SampleHistory {
    /// Creates an empty history. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: u64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().copied()
    }

    /// Renders the history as a comma delimited string, oldest first.
    pub fn render(&self) -> String {
        render_samples(self.samples.iter())
    }
}

/// Joins samples with commas.
pub fn render_samples<I>(samples: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    samples
        .into_iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
