use crate::prelude::*;
use sysinfo::{RefreshKind, System, SystemExt};

pub static MEMORY: SourceDescriptor = SourceDescriptor {
    name: "memory",
    unit: "%",
    is_dual: false,
    max_scale: 100.0,
    format: ValueFormat::Percent,
};

/// Share of physical memory in use, `(total - available) / total`.
pub fn usage_percent(total: u64, available: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(available) as f64;
    Some((100.0 * used / total as f64).clamp(0.0, 100.0))
}

pub struct MemorySource {
    system: System,
    stats: Statistics,
}

impl MemorySource {
    pub fn create(_target: &str) -> Result<Box<dyn MetricSource>, Error> {
        let system = System::new_with_specifics(RefreshKind::new().with_memory());
        if system.total_memory() == 0 {
            return Err(Error::source_unavailable("total memory is not reported"));
        }
        Ok(Box::new(Self {
            system,
            stats: Statistics::default(),
        }))
    }
}

impl MetricSource for MemorySource {
    fn descriptor(&self) -> &'static SourceDescriptor {
        &MEMORY
    }

    fn collect(&mut self) -> Option<f64> {
        self.system.refresh_memory();
        let usage = usage_percent(self.system.total_memory(), self.system.available_memory())?;
        self.stats.record(usage);
        Some(usage)
    }

    fn stats(&self) -> DualStatistics {
        DualStatistics::single(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_from_total_and_available() {
        assert_eq!(usage_percent(1000, 250), Some(75.0));
        assert_eq!(usage_percent(1000, 1000), Some(0.0));
        assert_eq!(usage_percent(1000, 0), Some(100.0));
    }

    #[test]
    fn usage_is_clamped_and_defined() {
        assert_eq!(usage_percent(1000, 2000), Some(0.0));
        assert_eq!(usage_percent(0, 0), None);
    }

    #[test]
    fn memory_is_single_valued() {
        let mut source = MemorySource::create("ignored").unwrap();
        assert!(!source.descriptor().is_dual);
        assert_eq!(source.collect_dual(), None);
        let usage = source.collect().unwrap();
        assert!((0.0..=100.0).contains(&usage));
        assert_eq!(source.stats().primary.count(), 1);
        assert!(source.stats().secondary.is_empty());
        assert_eq!(source.format_value(42.26), "42.3%");
    }
}
