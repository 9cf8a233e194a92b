mod term_display;

use anyhow::{anyhow, Context, Result};
use clap::{crate_version, value_t, App, Arg, ArgMatches};
use plottool::{host, ChartSource, Config, Dashboard, Error, Pipeline, Registry};
use plottool_common::stats::Statistics;
use std::{
    thread,
    time::{Duration, Instant},
};
use term_display::TermDisplay;

#[macro_use]
extern crate log;

const DEFAULT_CONFIG: &str = "plottool.yaml";
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    let matches = get_matches();

    let config_path = matches.value_of("config").unwrap_or(DEFAULT_CONFIG);
    let config = load_config(config_path)?;
    let headless = if matches.is_present("headless") {
        Some(value_t!(matches, "headless", u64).context("--headless expects a number of seconds")?)
    } else {
        None
    };
    init_logger(&config, headless.is_some())?;
    info!("config: {}", config_path);

    let registry = Registry::default();
    let mut pipeline = Pipeline::create(&config, &registry).context("can't create collectors")?;
    pipeline.start().context("can't start collectors")?;

    let result = match headless {
        Some(secs) => {
            run_headless(&config, pipeline.sources(), Duration::from_secs(secs));
            Ok(())
        }
        None => run_dashboard(config.clone(), pipeline.sources()),
    };

    let stuck = pipeline.shutdown(SHUTDOWN_TIMEOUT);
    if stuck > 0 {
        warn!("{} collectors left running on exit", stuck);
    }
    result
}

fn load_config(path: &str) -> Result<Config> {
    Config::get(path)
        .map_err(Error::config)
        .with_context(|| format!("can't load config '{}'", path))
}

/// log4rs when the config names a log file. Without one, console logging is
/// only enabled in headless mode since the dashboard owns the terminal.
fn init_logger(config: &Config, headless: bool) -> Result<()> {
    if let Some(log_config) = config.log_config() {
        log4rs::init_file(log_config, Default::default())
            .map_err(|e| anyhow!("can't init logger from '{}': {}", log_config, e))?;
    } else if headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    Ok(())
}

fn run_dashboard(config: Config, sources: &[ChartSource]) -> Result<()> {
    let hostname = host::short_hostname();
    let display = TermDisplay::open(&host::window_title(&hostname)).context("can't open terminal")?;
    let mut dashboard = Dashboard::new(display, config, sources, &hostname)?;
    dashboard.run()?;
    Ok(())
}

fn run_headless(config: &Config, sources: &[ChartSource], duration: Duration) {
    let interval = config.refresh_interval();
    info!(
        "headless run for {}, reporting every {}",
        humantime::format_duration(duration),
        humantime::format_duration(interval)
    );
    let deadline = Instant::now() + duration;
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(interval.min(deadline - now));
        for source in sources {
            report(source);
        }
    }
}

fn report(source: &ChartSource) {
    let stats = source.stats();
    let format = |s: &Statistics| {
        format!(
            "min {} avg {} max {} last {}",
            source.format_value(s.min()),
            source.format_value(s.avg()),
            source.format_value(s.max()),
            source.format_value(s.last())
        )
    };
    if source.secondary().is_some() {
        info!(
            "{}: {} | {}",
            source.name(),
            format(&stats.primary),
            format(&stats.secondary)
        );
    } else {
        info!("{}: {}", source.name(), format(&stats.primary));
    }
}

fn get_matches<'a>() -> ArgMatches<'a> {
    App::new("plottool")
        .version(crate_version!())
        .about("live strip-chart dashboard for host metrics")
        .arg(
            Arg::with_name("config")
                .help("dashboard config file")
                .takes_value(true)
                .short("f")
                .long("config")
                .default_value(DEFAULT_CONFIG),
        )
        .arg(
            Arg::with_name("headless")
                .help("collect without a terminal for the given number of seconds, logging statistics")
                .takes_value(true)
                .value_name("SECONDS")
                .long("headless"),
        )
        .get_matches()
}
