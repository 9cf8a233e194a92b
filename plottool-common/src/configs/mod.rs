/// Dashboard and per-chart configuration.
pub mod dashboard;
mod dashboard_tests;
/// `#rrggbb` colors used in configs.
pub mod color;
mod reader;
mod validation;

pub use color::Color;
pub use dashboard::{ChartConfig, Config, Fullscreen};
pub use reader::YamlConfig;
pub use validation::{Validatable, Validator};
