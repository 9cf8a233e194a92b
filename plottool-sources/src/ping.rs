use crate::prelude::*;
use std::{
    net::{IpAddr, ToSocketAddrs},
    process::{Command, Stdio},
};

/// Minimum delay between attempts to re-establish a failed session.
const SESSION_RETRY_INTERVAL: Duration = Duration::from_secs(30);
const PING_PROGRAM: &str = "ping";

pub static PING: SourceDescriptor = SourceDescriptor {
    name: "ping",
    unit: "ms",
    is_dual: false,
    max_scale: 0.0,
    format: ValueFormat::Milliseconds,
};

/// Resolved destination and the bookkeeping of its re-creation.
#[derive(Debug)]
struct Session {
    address: Option<IpAddr>,
    last_attempt: Instant,
}

impl Session {
    fn open(host: &str, now: Instant) -> Self {
        let address = resolve(host);
        if address.is_none() {
            warn!(
                "ping: can't resolve {}, retrying every {:?}",
                host, SESSION_RETRY_INTERVAL
            );
        }
        Self {
            address,
            last_attempt: now,
        }
    }

    fn retry_due(&self, now: Instant) -> bool {
        self.address.is_none()
            && now.saturating_duration_since(self.last_attempt) >= SESSION_RETRY_INTERVAL
    }

    fn invalidate(&mut self, now: Instant) {
        self.address = None;
        self.last_attempt = now;
    }
}

fn resolve(host: &str) -> Option<IpAddr> {
    match (host, 0).to_socket_addrs() {
        Ok(mut addrs) => addrs.next().map(|addr| addr.ip()),
        Err(e) => {
            debug!("ping: resolve {} failed: {}", host, e);
            None
        }
    }
}

/// Round trip time to a host in milliseconds, one echo request per sample.
#[derive(Debug)]
pub struct PingSource {
    host: String,
    session: Session,
    stats: Statistics,
}

impl PingSource {
    pub fn create(target: &str) -> Result<Box<dyn MetricSource>, Error> {
        let host = target.trim();
        if host.is_empty() {
            return Err(Error::invalid_target(target, "host is empty"));
        }
        // an unresolvable host is not fatal, the session is retried later
        let session = Session::open(host, Instant::now());
        Ok(Box::new(Self {
            host: host.to_string(),
            session,
            stats: Statistics::default(),
        }))
    }

    fn address(&mut self) -> Option<IpAddr> {
        let now = Instant::now();
        if self.session.retry_due(now) {
            debug!("ping: re-creating session for {}", self.host);
            self.session = Session::open(&self.host, now);
        }
        self.session.address
    }
}

impl MetricSource for PingSource {
    fn descriptor(&self) -> &'static SourceDescriptor {
        &PING
    }

    fn collect(&mut self) -> Option<f64> {
        let address = self.address()?;
        match echo(address) {
            Ok(Some(rtt)) => {
                self.stats.record(rtt);
                Some(rtt)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("ping: {}", e);
                self.session.invalidate(Instant::now());
                None
            }
        }
    }

    fn stats(&self) -> DualStatistics {
        DualStatistics::single(self.stats)
    }
}

// iputils and BSD ping disagree on `-W` units, so macOS bounds the whole
// run with `-t` seconds instead.
cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        fn echo_args(address: &str) -> Vec<&str> {
            vec!["-n", "-c", "1", "-W", "1", address]
        }
    } else if #[cfg(target_os = "macos")] {
        fn echo_args(address: &str) -> Vec<&str> {
            vec!["-n", "-c", "1", "-t", "1", address]
        }
    } else if #[cfg(windows)] {
        fn echo_args(address: &str) -> Vec<&str> {
            vec!["-n", "1", "-w", "1000", address]
        }
    } else {
        fn echo_args(address: &str) -> Vec<&str> {
            vec!["-c", "1", address]
        }
    }
}

/// Sends one echo request with a one second deadline.
///
/// Runs the system `ping` and reads its text output, so it relies on the
/// reply line carrying `time=` or `time<`. iputils, BSD/macOS and Windows
/// ping all print that in the C locale, which is forced here. A localized
/// Windows ping may still print other words and then every sample counts as
/// lost.
///
/// `Ok(None)` means no reply arrived in time, `Err` that `ping` itself could
/// not be run.
fn echo(address: IpAddr) -> Result<Option<f64>, String> {
    let address = address.to_string();
    let output = Command::new(PING_PROGRAM)
        .args(echo_args(&address))
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| format!("failed to execute command {}: {}", PING_PROGRAM, e))?;
    if !output.status.success() {
        return Ok(None);
    }
    match String::from_utf8(output.stdout) {
        Ok(out) => Ok(parse_round_trip(&out)),
        Err(e) => Err(format!(
            "can not convert output of {} into string: {}",
            PING_PROGRAM, e
        )),
    }
}

/// Extracts the round trip time from a `time=12.3 ms` (or `time<1ms`) reply line.
pub fn parse_round_trip(output: &str) -> Option<f64> {
    output.lines().find_map(|line| {
        let start = line.find("time=").or_else(|| line.find("time<"))? + "time=".len();
        let value: String = line[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        value.parse::<f64>().ok()
    })
}
