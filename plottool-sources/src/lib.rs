#[macro_use]
extern crate log;

/// CPU load from `/proc/stat` tick counters.
pub mod cpu;
/// Interface throughput of the local host.
pub mod if_thr;
/// Physical memory usage.
pub mod memory;
/// Round trip time to a remote host.
pub mod ping;
/// Shared delta-over-time logic of counter based sources.
pub mod rate;
/// Name to constructor mapping of the available sources.
pub mod registry;
/// Interface throughput of a remote device polled over SNMP.
pub mod snmp_rate;
/// The source trait and value formatting.
pub mod source;

pub use registry::Registry;
pub use source::{MetricSource, SourceDescriptor, ValueFormat};

pub(crate) mod prelude {
    pub(crate) use crate::source::{MetricSource, SourceDescriptor, ValueFormat};
    pub(crate) use plottool_common::{
        error::Error,
        stats::{DualStatistics, Statistics},
    };
    pub(crate) use std::time::{Duration, Instant};
}
