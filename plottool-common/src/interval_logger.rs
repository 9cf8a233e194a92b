use coarsetime::{Duration as CDuration, Instant as CInstant};
use log::Level;
use std::{cmp::Eq, collections::HashMap, fmt::Display, hash::Hash};

/// Folds repeated failures into one line per key and interval,
/// e.g. `cpu: sample unavailable [12 times]`.
#[derive(Debug)]
pub struct IntervalLogger<E> {
    counts: HashMap<E, u64>,
    interval: CDuration,
    last_flush: CInstant,
    level: Level,
}

impl<E: Hash + Eq + Display> IntervalLogger<E> {
    pub fn new(interval_ms: u64, level: Level) -> Self {
        let interval = CDuration::from_millis(interval_ms);
        Self {
            counts: HashMap::new(),
            interval,
            last_flush: CInstant::now() - interval - CDuration::from_millis(1),
            level,
        }
    }

    /// Counts one occurrence of `event`, logs the accumulated counters when
    /// the interval has passed since the previous flush.
    pub fn report(&mut self, event: E) {
        *self.counts.entry(event).or_insert(0) += 1;
        if self.last_flush.elapsed() > self.interval {
            self.flush();
        }
    }

    /// Logs and resets all pending counters.
    pub fn flush(&mut self) {
        for (event, count) in self.counts.iter_mut() {
            if *count > 0 {
                log!(self.level, "{} [{} times]", event, count);
                *count = 0;
            }
        }
        self.last_flush = CInstant::now();
    }

    /// Occurrences of `event` reported since the last flush.
    pub fn pending(&self, event: &E) -> u64 {
        self.counts.get(event).copied().unwrap_or(0)
    }
}
