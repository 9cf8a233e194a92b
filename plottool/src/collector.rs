use crate::prelude::*;
use log::Level;
use std::thread::JoinHandle;

const FAILURE_LOG_INTERVAL_MS: u64 = 60_000;

/// Render side view of a chart's data: its buffers and the statistics
/// published by the collector. Never gives access to the source itself.
#[derive(Debug, Clone)]
pub struct ChartSource {
    name: String,
    descriptor: &'static SourceDescriptor,
    primary: Arc<RingBuffer>,
    secondary: Option<Arc<RingBuffer>>,
    stats: SharedStats,
    interval: Duration,
}

impl ChartSource {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &'static SourceDescriptor {
        self.descriptor
    }

    pub fn primary(&self) -> &Arc<RingBuffer> {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&Arc<RingBuffer>> {
        self.secondary.as_ref()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Latest statistics published by the collector.
    pub fn stats(&self) -> DualStatistics {
        *self.stats.read().expect("chart stats lock")
    }

    pub fn format_value(&self, value: f64) -> String {
        self.descriptor.format.format(value)
    }

    /// Resizes all buffers of the chart together. When the secondary buffer
    /// can't follow, the primary is restored so both keep the same capacity.
    pub fn resize(&self, capacity: usize) -> Result<(), Error> {
        let previous = self.primary.capacity();
        self.primary.resize(capacity)?;
        if let Some(secondary) = &self.secondary {
            if let Err(e) = secondary.resize(capacity) {
                if let Err(restore) = self.primary.resize(previous) {
                    error!(
                        "chart '{}': can't restore primary buffer capacity: {}",
                        self.name, restore
                    );
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Owns one source and samples it into the chart buffers.
pub struct Collector {
    source: Option<Box<dyn MetricSource>>,
    chart: ChartSource,
}

impl Debug for Collector {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("Collector")
            .field("chart", &self.chart.name)
            .field("kind", &self.chart.descriptor.name)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

impl Collector {
    /// Allocates the chart buffers. `source` is `None` when the source could
    /// not be constructed; such a chart keeps advancing with gaps.
    pub fn new(
        name: impl Into<String>,
        descriptor: &'static SourceDescriptor,
        source: Option<Box<dyn MetricSource>>,
        capacity: usize,
        interval: Duration,
    ) -> Result<Self, Error> {
        let primary = Arc::new(RingBuffer::new(capacity)?);
        let secondary = if descriptor.is_dual {
            Some(Arc::new(RingBuffer::new(capacity)?))
        } else {
            None
        };
        let chart = ChartSource {
            name: name.into(),
            descriptor,
            primary,
            secondary,
            stats: SharedStats::default(),
            interval,
        };
        Ok(Self { source, chart })
    }

    pub fn chart_source(&self) -> ChartSource {
        self.chart.clone()
    }

    /// Takes one sample and pushes it, or the unavailable marker, into every
    /// buffer of the chart. Returns whether a real sample was obtained.
    pub fn collect_once(&mut self) -> bool {
        let chart = &self.chart;
        let collected = match (self.source.as_mut(), &chart.secondary) {
            (Some(source), Some(secondary)) => match source.collect_dual() {
                Some((primary, second)) => {
                    chart.primary.push(primary);
                    secondary.push(second);
                    true
                }
                None => {
                    chart.primary.push(UNAVAILABLE);
                    secondary.push(UNAVAILABLE);
                    false
                }
            },
            (Some(source), None) => match source.collect() {
                Some(value) => {
                    chart.primary.push(value);
                    true
                }
                None => {
                    chart.primary.push(UNAVAILABLE);
                    false
                }
            },
            (None, secondary) => {
                chart.primary.push(UNAVAILABLE);
                if let Some(secondary) = secondary {
                    secondary.push(UNAVAILABLE);
                }
                false
            }
        };
        if let Some(source) = &self.source {
            *chart.stats.write().expect("chart stats lock") = source.stats();
        }
        collected
    }

    /// Starts the sampling thread. It runs until `shutdown` is raised and the
    /// thread is unparked.
    pub fn spawn(self, shutdown: Arc<AtomicBool>) -> Result<CollectorHandle, Error> {
        let name = self.chart.name.clone();
        let thread = thread::Builder::new()
            .name(format!("collector-{}", name))
            .spawn(move || self.run(&shutdown))
            .map_err(|e| Error::failed(format!("spawn collector for '{}': {}", name, e)))?;
        Ok(CollectorHandle { name, thread })
    }

    fn run(mut self, shutdown: &AtomicBool) {
        info!(
            "collector '{}' ({}) started, interval {:?}",
            self.chart.name, self.chart.descriptor.name, self.chart.interval
        );
        let mut failures = IntervalLogger::new(FAILURE_LOG_INTERVAL_MS, Level::Warn);
        while !shutdown.load(Ordering::Acquire) {
            let deadline = Instant::now() + self.chart.interval;
            if !self.collect_once() {
                failures.report(format!("'{}': sample unavailable", self.chart.name));
            }
            sleep_until(deadline, shutdown);
        }
        failures.flush();
        if let Some(source) = self.source.as_mut() {
            source.cleanup();
        }
        info!("collector '{}' stopped", self.chart.name);
    }
}

/// Parks until `deadline`, returning early once shutdown is requested.
fn sleep_until(deadline: Instant, shutdown: &AtomicBool) {
    loop {
        if shutdown.load(Ordering::Acquire) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::park_timeout(deadline - now);
    }
}

#[derive(Debug)]
pub struct CollectorHandle {
    name: String,
    thread: JoinHandle<()>,
}

impl CollectorHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wakes the thread so it notices a raised shutdown flag.
    pub fn wake(&self) {
        self.thread.thread().unpark();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn join(self) {
        if self.thread.join().is_err() {
            error!("collector '{}' panicked", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use plottool_sources::ValueFormat;
    use std::sync::Mutex;

    static SINGLE: SourceDescriptor = SourceDescriptor {
        name: "single",
        unit: "%",
        is_dual: false,
        max_scale: 100.0,
        format: ValueFormat::Percent,
    };

    static DUAL: SourceDescriptor = SourceDescriptor {
        name: "dual",
        unit: "B/s",
        is_dual: true,
        max_scale: 0.0,
        format: ValueFormat::Throughput,
    };

    mock! {
        pub Source {}
        impl MetricSource for Source {
            fn descriptor(&self) -> &'static SourceDescriptor;
            fn collect(&mut self) -> Option<f64>;
            fn collect_dual(&mut self) -> Option<(f64, f64)>;
            fn stats(&self) -> DualStatistics;
            fn cleanup(&mut self);
        }
    }

    fn collector(
        descriptor: &'static SourceDescriptor,
        source: Option<MockSource>,
    ) -> Collector {
        let source = source.map(|s| Box::new(s) as Box<dyn MetricSource>);
        Collector::new("test", descriptor, source, 8, Duration::from_millis(10)).unwrap()
    }

    #[test]
    fn successful_sample_is_pushed_and_stats_published() {
        let mut source = MockSource::new();
        source.expect_collect().times(1).returning(|| Some(42.0));
        source.expect_stats().returning(|| {
            let mut stats = DualStatistics::default();
            stats.primary.record(42.0);
            stats
        });
        let mut collector = collector(&SINGLE, Some(source));
        let chart = collector.chart_source();
        assert!(collector.collect_once());
        assert_eq!(chart.primary().to_vec().unwrap(), vec![42.0]);
        assert!(chart.secondary().is_none());
        assert_eq!(chart.stats().primary.last(), 42.0);
    }

    #[test]
    fn failed_sample_pushes_unavailable() {
        let mut source = MockSource::new();
        source.expect_collect().times(2).returning(|| None);
        source.expect_stats().returning(DualStatistics::default);
        let mut collector = collector(&SINGLE, Some(source));
        let chart = collector.chart_source();
        assert!(!collector.collect_once());
        assert!(!collector.collect_once());
        assert_eq!(chart.primary().to_vec().unwrap(), vec![-1.0, -1.0]);
    }

    #[test]
    fn dual_failure_marks_both_series() {
        let mut source = MockSource::new();
        let mut results = vec![None, Some((10.0, 20.0))];
        source
            .expect_collect_dual()
            .times(2)
            .returning(move || results.pop().flatten());
        source.expect_stats().returning(DualStatistics::default);
        let mut collector = collector(&DUAL, Some(source));
        let chart = collector.chart_source();
        assert!(collector.collect_once());
        assert!(!collector.collect_once());
        assert_eq!(chart.primary().to_vec().unwrap(), vec![10.0, -1.0]);
        let secondary = chart.secondary().unwrap();
        assert_eq!(secondary.to_vec().unwrap(), vec![20.0, -1.0]);
    }

    #[test]
    fn missing_source_still_advances() {
        let mut collector = collector(&DUAL, None);
        let chart = collector.chart_source();
        for _ in 0..3 {
            assert!(!collector.collect_once());
        }
        assert_eq!(chart.primary().count(), 3);
        assert_eq!(chart.secondary().unwrap().count(), 3);
        assert_eq!(chart.stats(), DualStatistics::default());
    }

    #[test]
    fn thread_stops_on_shutdown_and_cleans_up() {
        let mut source = MockSource::new();
        source.expect_collect().returning(|| Some(1.0));
        source.expect_stats().returning(DualStatistics::default);
        source.expect_cleanup().times(1).return_const(());
        let collector = collector(&SINGLE, Some(source));
        let chart = collector.chart_source();
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = collector.spawn(shutdown.clone()).unwrap();
        thread::sleep(Duration::from_millis(50));
        shutdown.store(true, Ordering::Release);
        handle.wake();
        handle.join();
        assert!(chart.primary().count() > 0);
    }

    #[test]
    fn thread_is_named_after_chart() {
        let seen = Arc::new(Mutex::new(None));
        let mut source = MockSource::new();
        let names = seen.clone();
        source.expect_collect().returning(move || {
            let current = thread::current().name().map(str::to_string);
            *names.lock().expect("names lock") = current;
            Some(1.0)
        });
        source.expect_stats().returning(DualStatistics::default);
        source.expect_cleanup().return_const(());
        let collector = Collector::new(
            "uplink",
            &SINGLE,
            Some(Box::new(source) as Box<dyn MetricSource>),
            8,
            Duration::from_millis(10),
        )
        .unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = collector.spawn(shutdown.clone()).unwrap();
        assert_eq!(handle.name(), "uplink");
        thread::sleep(Duration::from_millis(50));
        shutdown.store(true, Ordering::Release);
        handle.wake();
        handle.join();
        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("collector-uplink")
        );
    }

    #[test]
    fn chart_resize_keeps_buffers_aligned() {
        let collector = collector(&DUAL, None);
        let chart = collector.chart_source();
        chart.resize(20).unwrap();
        assert_eq!(chart.primary().capacity(), 20);
        assert_eq!(chart.secondary().unwrap().capacity(), 20);
        assert!(chart.resize(0).unwrap_err().is_invalid_capacity());
        assert_eq!(chart.primary().capacity(), 20);
    }
}
