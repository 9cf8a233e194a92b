pub mod configs;
pub mod error;
pub mod interval_logger;
pub mod ring_buffer;
pub mod stats;

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
