use crate::{
    prelude::*,
    rate::{CounterReader, CounterSample, CounterWidth, RateSource},
};
use sysinfo::{NetworkExt, NetworksExt, RefreshKind, System, SystemExt};

const LOCAL_HOST: &str = "local";

pub static IF_THR: SourceDescriptor = SourceDescriptor {
    name: "if_thr",
    unit: "B/s",
    is_dual: true,
    max_scale: 0.0,
    format: ValueFormat::Throughput,
};

/// Interface name from `local,<iface>` (or a bare `<iface>`).
pub fn parse_target(target: &str) -> Result<String, Error> {
    let (host, interface) = match target.split_once(',') {
        Some((host, interface)) => (host.trim(), interface.trim()),
        None => (LOCAL_HOST, target.trim()),
    };
    if host != LOCAL_HOST {
        return Err(Error::invalid_target(
            target,
            "only local interfaces are supported, use snmp for remote hosts",
        ));
    }
    if interface.is_empty() {
        return Err(Error::invalid_target(target, "interface name is empty"));
    }
    Ok(interface.to_string())
}

/// Byte counters of one local interface.
pub struct InterfaceCounters {
    interface: String,
    system: System,
}

impl InterfaceCounters {
    pub fn new(interface: String) -> Self {
        let system = System::new_with_specifics(RefreshKind::new().with_networks_list());
        Self { interface, system }
    }

    fn lookup(&self) -> Option<CounterSample> {
        self.system
            .networks()
            .iter()
            .find(|(name, _)| name.as_str() == self.interface)
            .map(|(_, data)| CounterSample {
                inbound: data.total_received(),
                outbound: data.total_transmitted(),
            })
    }
}

impl CounterReader for InterfaceCounters {
    fn read(&mut self) -> Option<CounterSample> {
        self.system.refresh_networks();
        if let Some(sample) = self.lookup() {
            return Some(sample);
        }
        // interfaces come and go (vpn, usb), rescan before giving up
        self.system.refresh_networks_list();
        let sample = self.lookup();
        if sample.is_none() {
            debug!("interface {} not found", self.interface);
        }
        sample
    }
}

pub fn create(target: &str) -> Result<Box<dyn MetricSource>, Error> {
    let interface = parse_target(target)?;
    let counters = InterfaceCounters::new(interface);
    Ok(Box::new(RateSource::new(
        &IF_THR,
        counters,
        CounterWidth::Bits64,
    )))
}
