use crate::prelude::*;

/// Width of a monotonically increasing device counter, deltas wrap modulo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterWidth {
    Bits32,
    Bits64,
}

impl CounterWidth {
    fn delta(self, current: u64, previous: u64) -> u64 {
        match self {
            Self::Bits32 => u64::from((current as u32).wrapping_sub(previous as u32)),
            Self::Bits64 => current.wrapping_sub(previous),
        }
    }
}

/// Raw inbound/outbound byte counters at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSample {
    pub inbound: u64,
    pub outbound: u64,
}

/// Converts successive counter readings into per-second rates.
///
/// The first reading only establishes the baseline: it reports a rate of 0
/// and is not counted in the statistics. A reading that does not advance the
/// clock keeps the previous rates.
#[derive(Debug)]
pub struct RateTracker {
    width: CounterWidth,
    previous: Option<(CounterSample, Instant)>,
    inbound_rate: f64,
    outbound_rate: f64,
    inbound: Statistics,
    outbound: Statistics,
    combined: Statistics,
}

impl RateTracker {
    pub fn new(width: CounterWidth) -> Self {
        Self {
            width,
            previous: None,
            inbound_rate: 0.0,
            outbound_rate: 0.0,
            inbound: Statistics::default(),
            outbound: Statistics::default(),
            combined: Statistics::default(),
        }
    }

    pub fn update(&mut self, sample: CounterSample, at: Instant) -> (f64, f64) {
        match self.previous {
            None => {
                self.previous = Some((sample, at));
                self.inbound_rate = 0.0;
                self.outbound_rate = 0.0;
            }
            Some((previous, previous_at)) => {
                let elapsed = at
                    .checked_duration_since(previous_at)
                    .map_or(0.0, |d| d.as_secs_f64());
                if elapsed <= 0.0 {
                    return self.rates();
                }
                self.inbound_rate =
                    self.width.delta(sample.inbound, previous.inbound) as f64 / elapsed;
                self.outbound_rate =
                    self.width.delta(sample.outbound, previous.outbound) as f64 / elapsed;
                self.inbound.record(self.inbound_rate);
                self.outbound.record(self.outbound_rate);
                self.combined.record(self.combined_rate());
                self.previous = Some((sample, at));
            }
        }
        self.rates()
    }

    pub fn rates(&self) -> (f64, f64) {
        (self.inbound_rate, self.outbound_rate)
    }

    /// Inbound plus outbound, the value of a single-series chart.
    pub fn combined_rate(&self) -> f64 {
        self.inbound_rate + self.outbound_rate
    }

    pub fn stats(&self) -> DualStatistics {
        DualStatistics {
            primary: self.inbound,
            secondary: self.outbound,
        }
    }

    pub fn combined_stats(&self) -> Statistics {
        self.combined
    }
}

/// Reads raw counters from a device.
pub trait CounterReader: Send {
    fn read(&mut self) -> Option<CounterSample>;

    fn release(&mut self) {}
}

/// A throughput source built from a [`CounterReader`]. The primary series is
/// inbound traffic, the secondary one outbound.
pub struct RateSource<R> {
    descriptor: &'static SourceDescriptor,
    reader: R,
    tracker: RateTracker,
}

impl<R: CounterReader> RateSource<R> {
    pub fn new(descriptor: &'static SourceDescriptor, reader: R, width: CounterWidth) -> Self {
        Self {
            descriptor,
            reader,
            tracker: RateTracker::new(width),
        }
    }

    fn sample(&mut self) -> Option<(f64, f64)> {
        let counters = self.reader.read()?;
        Some(self.tracker.update(counters, Instant::now()))
    }
}

impl<R: CounterReader> MetricSource for RateSource<R> {
    fn descriptor(&self) -> &'static SourceDescriptor {
        self.descriptor
    }

    fn collect(&mut self) -> Option<f64> {
        self.sample()?;
        Some(self.tracker.combined_rate())
    }

    fn collect_dual(&mut self) -> Option<(f64, f64)> {
        self.sample()
    }

    fn stats(&self) -> DualStatistics {
        if self.descriptor.is_dual {
            self.tracker.stats()
        } else {
            DualStatistics::single(self.tracker.combined_stats())
        }
    }

    fn cleanup(&mut self) {
        self.reader.release();
    }
}
