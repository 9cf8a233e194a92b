use crate::{
    collector::{ChartSource, Collector, CollectorHandle},
    prelude::*,
};

const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

/// All collectors of a dashboard, from construction to shutdown.
#[derive(Debug)]
pub struct Pipeline {
    pending: Vec<Collector>,
    running: Vec<CollectorHandle>,
    charts: Vec<ChartSource>,
    shutdown: Arc<AtomicBool>,
}

impl Pipeline {
    /// Builds one collector per configured chart, in config order.
    ///
    /// A source that fails to construct is logged and its chart keeps
    /// running without data. Unknown kinds and buffer allocation failures
    /// abort the whole pipeline.
    pub fn create(config: &Config, registry: &Registry) -> Result<Self, Error> {
        let mut pending = Vec::with_capacity(config.charts().len());
        for chart in config.charts() {
            let descriptor = registry.descriptor(chart.kind()).map_err(|e| {
                error!(
                    "chart '{}': {}, known kinds: {}",
                    chart.name(),
                    e,
                    registry.kinds().join(", ")
                );
                e
            })?;
            let source = match registry.create(chart.kind(), chart.target()) {
                Ok(source) => Some(source),
                Err(e) => {
                    error!(
                        "chart '{}': can't create {} source for target '{}': {}",
                        chart.name(),
                        chart.kind(),
                        chart.target(),
                        e
                    );
                    None
                }
            };
            let collector = Collector::new(
                chart.name(),
                descriptor,
                source,
                config.buffer_capacity(chart),
                chart.refresh_interval(config.refresh_interval()),
            )?;
            debug!("created {:?}", collector);
            pending.push(collector);
        }
        let charts = pending.iter().map(Collector::chart_source).collect();
        Ok(Self {
            pending,
            running: Vec::new(),
            charts,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Chart views in config order.
    pub fn sources(&self) -> &[ChartSource] {
        &self.charts
    }

    /// Spawns every collector thread.
    pub fn start(&mut self) -> Result<(), Error> {
        for collector in self.pending.drain(..) {
            let handle = collector.spawn(self.shutdown.clone())?;
            self.running.push(handle);
        }
        info!("{} collectors started", self.running.len());
        Ok(())
    }

    pub fn running(&self) -> usize {
        self.running.iter().filter(|h| !h.is_finished()).count()
    }

    /// Signals every collector to stop and joins those that finish within
    /// `timeout`. Returns the number of threads left behind.
    pub fn shutdown(&mut self, timeout: Duration) -> usize {
        self.shutdown.store(true, Ordering::Release);
        for handle in &self.running {
            handle.wake();
        }

        let deadline = Instant::now() + timeout;
        while self.running.iter().any(|h| !h.is_finished()) && Instant::now() < deadline {
            thread::sleep(SHUTDOWN_POLL);
        }

        let (finished, stuck): (Vec<_>, Vec<_>) = self
            .running
            .drain(..)
            .partition(CollectorHandle::is_finished);
        for handle in finished {
            handle.join();
        }
        for handle in &stuck {
            warn!(
                "collector '{}' did not stop within {:?}, detaching",
                handle.name(),
                timeout
            );
        }
        self.pending.clear();
        stuck.len()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if !self.running.is_empty() {
            self.shutdown(Duration::from_secs(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plottool_sources::ValueFormat;

    static COUNTING: SourceDescriptor = SourceDescriptor {
        name: "counting",
        unit: "",
        is_dual: false,
        max_scale: 0.0,
        format: ValueFormat::Percent,
    };

    static BROKEN: SourceDescriptor = SourceDescriptor {
        name: "broken",
        unit: "",
        is_dual: true,
        max_scale: 0.0,
        format: ValueFormat::Throughput,
    };

    #[derive(Default)]
    struct Counting {
        next: f64,
        stats: DualStatistics,
    }

    impl MetricSource for Counting {
        fn descriptor(&self) -> &'static SourceDescriptor {
            &COUNTING
        }

        fn collect(&mut self) -> Option<f64> {
            self.next += 1.0;
            self.stats.primary.record(self.next);
            Some(self.next)
        }

        fn stats(&self) -> DualStatistics {
            self.stats
        }
    }

    fn counting(_target: &str) -> Result<Box<dyn MetricSource>, Error> {
        Ok(Box::new(Counting::default()))
    }

    fn broken(target: &str) -> Result<Box<dyn MetricSource>, Error> {
        Err(Error::invalid_target(target, "always broken"))
    }

    fn registry() -> Registry {
        let mut registry = Registry::empty();
        registry.register("counting", &COUNTING, counting);
        registry.register("broken", &BROKEN, broken);
        registry
    }

    fn config(charts: Vec<ChartConfig>) -> Config {
        Config::from_charts(charts).with_refresh_interval("100ms")
    }

    #[test]
    fn buffers_follow_config() {
        let config = config(vec![
            ChartConfig::new("a", "counting", ""),
            ChartConfig::new("b", "broken", "x").with_width(12),
        ]);
        let pipeline = Pipeline::create(&config, &registry()).unwrap();
        let sources = pipeline.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name(), "a");
        assert_eq!(sources[0].primary().capacity(), 78);
        assert!(sources[0].secondary().is_none());
        assert_eq!(sources[1].primary().capacity(), 10);
        assert_eq!(sources[1].secondary().unwrap().capacity(), 10);
        assert_eq!(sources[1].interval(), Duration::from_millis(100));
    }

    #[test]
    fn unknown_kind_aborts_creation() {
        let config = config(vec![ChartConfig::new("a", "gpu", "")]);
        let err = Pipeline::create(&config, &registry()).unwrap_err();
        assert!(err.is_unknown_kind());
    }

    #[test]
    fn collectors_sample_at_their_interval() {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = config(vec![ChartConfig::new("a", "counting", "")]);
        let mut pipeline = Pipeline::create(&config, &registry()).unwrap();
        let chart = pipeline.sources()[0].clone();
        pipeline.start().unwrap();
        thread::sleep(Duration::from_millis(1050));
        assert_eq!(pipeline.shutdown(Duration::from_secs(1)), 0);

        let pushed = chart.primary().count();
        assert!((9..=12).contains(&pushed), "pushed {} samples", pushed);
        let values = chart.primary().to_vec().unwrap();
        assert_eq!(values[0], 1.0);
        assert_eq!(chart.stats().primary.last(), pushed as f64);
    }

    #[test]
    fn broken_source_does_not_stop_others() {
        let config = config(vec![
            ChartConfig::new("broken", "broken", "x"),
            ChartConfig::new("ok", "counting", ""),
        ]);
        let mut pipeline = Pipeline::create(&config, &registry()).unwrap();
        let broken = pipeline.sources()[0].clone();
        let ok = pipeline.sources()[1].clone();
        pipeline.start().unwrap();
        assert_eq!(pipeline.running(), 2);
        thread::sleep(Duration::from_millis(350));
        assert_eq!(pipeline.shutdown(Duration::from_secs(1)), 0);

        assert!(ok.primary().count() >= 3);
        let gaps = broken.primary().to_vec().unwrap();
        assert!(gaps.len() >= 3);
        assert!(gaps.iter().all(|v| *v == -1.0));
        assert!(broken.secondary().unwrap().count() >= 3);
        assert!(broken.stats().primary.is_empty());
    }

    #[test]
    fn shutdown_interrupts_long_intervals() {
        let config = Config::from_charts(vec![ChartConfig::new("slow", "counting", "")])
            .with_refresh_interval("1h");
        let mut pipeline = Pipeline::create(&config, &registry()).unwrap();
        pipeline.start().unwrap();
        thread::sleep(Duration::from_millis(50));
        let started = Instant::now();
        assert_eq!(pipeline.shutdown(Duration::from_secs(2)), 0);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(pipeline.running(), 0);
    }
}
