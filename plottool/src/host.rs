use sysinfo::{System, SystemExt};

const FALLBACK_HOSTNAME: &str = "localhost";
const APP_NAME: &str = "PlotTool";

/// Hostname up to the first dot, `localhost` when it can't be determined.
pub fn short_hostname() -> String {
    System::new()
        .host_name()
        .as_deref()
        .and_then(shorten)
        .unwrap_or_else(|| FALLBACK_HOSTNAME.to_string())
}

fn shorten(hostname: &str) -> Option<String> {
    let short = hostname.split('.').next().unwrap_or_default().trim();
    if short.is_empty() {
        None
    } else {
        Some(short.to_string())
    }
}

/// Title of the dashboard window, e.g. `PlotTool : web01`.
pub fn window_title(hostname: &str) -> String {
    format!("{} : {}", APP_NAME, hostname)
}
