use crate::prelude::*;

const KIB: f64 = 1024.0;
const THROUGHPUT_UNITS: [&str; 4] = ["B/s", "KB/s", "MB/s", "GB/s"];

/// How a source renders its values as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// `"12.3%"`
    Percent,
    /// Auto-scaled bytes per second with 1024 steps, `"2.0 KB/s"`.
    Throughput,
    /// `"12.3ms"`
    Milliseconds,
}

impl ValueFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            Self::Percent => format!("{:.1}%", value),
            Self::Milliseconds => format!("{:.1}ms", value),
            Self::Throughput => format_throughput(value),
        }
    }
}

fn format_throughput(value: f64) -> String {
    let mut scaled = value;
    let mut unit = 0;
    while scaled >= KIB && unit < THROUGHPUT_UNITS.len() - 1 {
        scaled /= KIB;
        unit += 1;
    }
    format!("{:.1} {}", scaled, THROUGHPUT_UNITS[unit])
}

/// Static description of a source kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    pub name: &'static str,
    pub unit: &'static str,
    /// Produces two series (e.g. inbound and outbound) per sample.
    pub is_dual: bool,
    /// Natural upper bound of values, 0 when unbounded.
    pub max_scale: f64,
    pub format: ValueFormat,
}

/// A pluggable producer of periodic samples.
///
/// A source is owned by exactly one collector thread, it is never touched
/// by the render loop.
pub trait MetricSource: Send {
    fn descriptor(&self) -> &'static SourceDescriptor;

    /// Takes one sample, `None` when it could not be obtained.
    fn collect(&mut self) -> Option<f64>;

    /// Takes one sample of both series. Single-value sources never produce a pair.
    fn collect_dual(&mut self) -> Option<(f64, f64)> {
        None
    }

    fn stats(&self) -> DualStatistics;

    fn format_value(&self, value: f64) -> String {
        self.descriptor().format.format(value)
    }

    /// Releases sessions and handles, called once when the collector stops.
    fn cleanup(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_and_millis_have_one_decimal() {
        assert_eq!(ValueFormat::Percent.format(12.345), "12.3%");
        assert_eq!(ValueFormat::Percent.format(0.0), "0.0%");
        assert_eq!(ValueFormat::Milliseconds.format(0.26), "0.3ms");
    }

    #[test]
    fn throughput_scales_by_1024() {
        assert_eq!(ValueFormat::Throughput.format(512.0), "512.0 B/s");
        assert_eq!(ValueFormat::Throughput.format(1023.0), "1023.0 B/s");
        assert_eq!(ValueFormat::Throughput.format(2048.0), "2.0 KB/s");
        assert_eq!(ValueFormat::Throughput.format(5_242_880.0), "5.0 MB/s");
        assert_eq!(ValueFormat::Throughput.format(3.0 * 1024.0 * 1024.0 * 1024.0), "3.0 GB/s");
    }

    #[test]
    fn throughput_stops_at_largest_unit() {
        let value = 2048.0 * 1024.0 * 1024.0 * 1024.0;
        assert_eq!(ValueFormat::Throughput.format(value), "2048.0 GB/s");
    }
}
