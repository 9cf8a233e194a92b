#![warn(missing_debug_implementations)]

//! Strip-chart dashboard: one collector thread per chart feeds ring buffers
//! that the render loop snapshots and draws.

#[macro_use]
extern crate log;

pub mod chart;
pub mod collector;
pub mod dashboard;
pub mod display;
pub mod host;
pub mod pipeline;

pub use crate::{
    collector::{ChartSource, Collector, CollectorHandle},
    dashboard::Dashboard,
    display::{Display, Event, Rect},
    pipeline::Pipeline,
};
pub use plottool_common::{
    configs::{ChartConfig, Color, Config, Fullscreen},
    error::Error,
};
pub use plottool_sources::{MetricSource, Registry, SourceDescriptor};

mod prelude {
    pub use plottool_common::{
        configs::{ChartConfig, Color, Config, Fullscreen},
        error::Error,
        interval_logger::IntervalLogger,
        ring_buffer::{Position, RingBuffer, UNAVAILABLE},
        stats::{DualStatistics, SharedStats},
    };
    pub use plottool_sources::{MetricSource, Registry, SourceDescriptor};
    pub use std::{
        fmt::{Debug, Formatter, Result as FmtResult},
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc, RwLock,
        },
        thread,
        time::{Duration, Instant},
    };
}

#[cfg(test)]
mod test_display;
