use crate::prelude::*;

const CPU_STAT_FILE: &str = "/proc/stat";

pub static CPU: SourceDescriptor = SourceDescriptor {
    name: "cpu",
    unit: "%",
    is_dual: true,
    max_scale: 100.0,
    format: ValueFormat::Percent,
};

/// Aggregate tick counters of the `cpu` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub total: u64,
    pub idle: u64,
    /// system + irq + softirq
    pub system: u64,
}

impl CpuTicks {
    /// Parses `cpu  user nice system idle iowait irq softirq steal ...`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        if parts.next()? != "cpu" {
            return None;
        }
        let columns = parts
            .take(8)
            .map(|column| column.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        if columns.len() < 4 {
            return None;
        }
        let column = |i: usize| columns.get(i).copied().unwrap_or(0);
        Some(Self {
            total: columns.iter().sum(),
            idle: column(3),
            system: column(2) + column(5) + column(6),
        })
    }
}

/// Turns successive tick readings into total and system load percentages.
#[derive(Debug, Default)]
pub struct CpuLoad {
    previous: Option<CpuTicks>,
}

impl CpuLoad {
    /// Returns `(total, system)` in percent, both within `0..=100`.
    /// The first reading has nothing to compare with and yields zeros.
    pub fn update(&mut self, ticks: CpuTicks) -> (f64, f64) {
        let load = match self.previous {
            Some(previous) if ticks.total > previous.total => {
                let total = (ticks.total - previous.total) as f64;
                let idle = ticks.idle as f64 - previous.idle as f64;
                let system = ticks.system as f64 - previous.system as f64;
                (100.0 * (1.0 - idle / total), 100.0 * system / total)
            }
            _ => (0.0, 0.0),
        };
        self.previous = Some(ticks);
        (clamp_percent(load.0), clamp_percent(load.1))
    }

    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Total CPU load (primary) and system load (secondary).
#[derive(Debug, Default)]
pub struct CpuSource {
    load: CpuLoad,
    stats: DualStatistics,
}

impl CpuSource {
    pub fn create(_target: &str) -> Result<Box<dyn MetricSource>, Error> {
        read_ticks().map_err(Error::source_unavailable)?;
        Ok(Box::new(Self::default()))
    }

    fn sample(&mut self) -> Option<(f64, f64)> {
        match read_ticks() {
            Ok(ticks) => {
                let had_baseline = self.load.has_baseline();
                let (total, system) = self.load.update(ticks);
                if had_baseline {
                    self.stats.primary.record(total);
                    self.stats.secondary.record(system);
                }
                Some((total, system))
            }
            Err(e) => {
                debug!("cpu sample failed: {}", e);
                None
            }
        }
    }
}

impl MetricSource for CpuSource {
    fn descriptor(&self) -> &'static SourceDescriptor {
        &CPU
    }

    fn collect(&mut self) -> Option<f64> {
        self.sample().map(|(total, _)| total)
    }

    fn collect_dual(&mut self) -> Option<(f64, f64)> {
        self.sample()
    }

    fn stats(&self) -> DualStatistics {
        self.stats
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        fn read_ticks() -> Result<CpuTicks, String> {
            let contents = std::fs::read_to_string(CPU_STAT_FILE)
                .map_err(|e| format!("can't read file {}: {}", CPU_STAT_FILE, e))?;
            contents
                .lines()
                .find_map(CpuTicks::parse)
                .ok_or_else(|| format!("no aggregate cpu line in {}", CPU_STAT_FILE))
        }
    } else {
        fn read_ticks() -> Result<CpuTicks, String> {
            Err(format!("{} is not available on this platform", CPU_STAT_FILE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks(total: u64, idle: u64, system: u64) -> CpuTicks {
        CpuTicks {
            total,
            idle,
            system,
        }
    }

    #[test]
    fn parse_aggregate_line() {
        let line = "cpu  100 5 30 800 10 4 6 0 0 0";
        let parsed = CpuTicks::parse(line).unwrap();
        assert_eq!(parsed, ticks(955, 800, 40));
    }

    #[test]
    fn parse_rejects_per_core_and_garbage() {
        assert!(CpuTicks::parse("cpu0 1 2 3 4 5 6 7 8").is_none());
        assert!(CpuTicks::parse("intr 12345").is_none());
        assert!(CpuTicks::parse("cpu  1 2 x 4").is_none());
        assert!(CpuTicks::parse("cpu  1 2").is_none());
    }

    #[test]
    fn first_reading_yields_zero() {
        let mut load = CpuLoad::default();
        assert!(!load.has_baseline());
        assert_eq!(load.update(ticks(1000, 900, 50)), (0.0, 0.0));
        assert!(load.has_baseline());
    }

    #[test]
    fn load_from_tick_deltas() {
        let mut load = CpuLoad::default();
        load.update(ticks(1000, 900, 50));
        let (total, system) = load.update(ticks(1200, 1000, 90));
        assert_eq!(total, 50.0);
        assert_eq!(system, 20.0);
    }

    #[test]
    fn regressing_idle_is_clamped() {
        let mut load = CpuLoad::default();
        load.update(ticks(1000, 900, 50));
        let (total, system) = load.update(ticks(1100, 800, 40));
        assert_eq!(total, 100.0);
        assert_eq!(system, 0.0);
    }

    #[test]
    fn idle_growing_faster_than_total_is_clamped() {
        let mut load = CpuLoad::default();
        load.update(ticks(1000, 900, 50));
        let (total, _) = load.update(ticks(1100, 1100, 50));
        assert_eq!(total, 0.0);
    }

    #[test]
    fn no_progress_yields_zero() {
        let mut load = CpuLoad::default();
        load.update(ticks(1000, 900, 50));
        assert_eq!(load.update(ticks(1000, 900, 50)), (0.0, 0.0));
        assert_eq!(load.update(ticks(900, 800, 50)), (0.0, 0.0));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn collect_from_procfs() {
        let mut source = CpuSource::create("").unwrap();
        assert_eq!(source.collect_dual(), Some((0.0, 0.0)));
        assert!(source.stats().primary.is_empty());
        let (total, system) = source.collect_dual().unwrap();
        assert!((0.0..=100.0).contains(&total));
        assert!((0.0..=100.0).contains(&system));
        assert_eq!(source.stats().primary.count(), 1);
    }
}
