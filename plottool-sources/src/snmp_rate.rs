use crate::{
    prelude::*,
    rate::{CounterReader, CounterSample, CounterWidth, RateSource},
};
use snmp::{SyncSession, Value};
use std::{net::ToSocketAddrs, str::FromStr};

const SNMP_PORT: u16 = 161;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_COMMUNITY: &str = "public";

/// IF-MIB ifTable columns, `1.3.6.1.2.1.2.2.1.<column>.<ifIndex>`.
const IF_TABLE: [u32; 9] = [1, 3, 6, 1, 2, 1, 2, 2, 1];
const IF_IN_OCTETS: u32 = 10;
const IF_OUT_OCTETS: u32 = 16;

pub static SNMP: SourceDescriptor = SourceDescriptor {
    name: "snmp",
    unit: "B/s",
    is_dual: true,
    max_scale: 0.0,
    format: ValueFormat::Throughput,
};

/// `host,community,ifIndex`, the community may be omitted: `host,ifIndex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpTarget {
    pub host: String,
    pub community: String,
    pub interface_index: u32,
}

impl FromStr for SnmpTarget {
    type Err = Error;

    fn from_str(target: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = target.split(',').map(str::trim).collect();
        let (host, community, index) = match parts.as_slice() {
            [host, community, index] => (*host, *community, *index),
            [host, index] => (*host, DEFAULT_COMMUNITY, *index),
            _ => {
                return Err(Error::invalid_target(
                    target,
                    "expected 'host,community,ifIndex'",
                ))
            }
        };
        if host.is_empty() {
            return Err(Error::invalid_target(target, "host is empty"));
        }
        if community.is_empty() {
            return Err(Error::invalid_target(target, "community is empty"));
        }
        let interface_index = index
            .parse::<u32>()
            .map_err(|e| Error::invalid_target(target, format!("bad ifIndex: {}", e)))?;
        Ok(Self {
            host: host.to_string(),
            community: community.to_string(),
            interface_index,
        })
    }
}

impl SnmpTarget {
    pub fn oid(&self, column: u32) -> [u32; 11] {
        let mut oid = [0; 11];
        oid[..IF_TABLE.len()].copy_from_slice(&IF_TABLE);
        oid[9] = column;
        oid[10] = self.interface_index;
        oid
    }
}

/// ifInOctets/ifOutOctets of one interface of a remote device.
pub struct SnmpCounters {
    target: SnmpTarget,
    session: Option<SyncSession>,
}

impl SnmpCounters {
    pub fn open(target: SnmpTarget) -> Result<Self, Error> {
        let address = (target.host.as_str(), SNMP_PORT)
            .to_socket_addrs()
            .map_err(|e| Error::source_unavailable(format!("resolve {}: {}", target.host, e)))?
            .next()
            .ok_or_else(|| Error::source_unavailable(format!("no address for {}", target.host)))?;
        let session = SyncSession::new(
            address,
            target.community.as_bytes(),
            Some(REQUEST_TIMEOUT),
            0,
        )
        .map_err(|e| Error::source_unavailable(format!("snmp session to {}: {}", address, e)))?;
        Ok(Self {
            target,
            session: Some(session),
        })
    }

    fn counter(&mut self, column: u32) -> Option<u32> {
        let oid = self.target.oid(column);
        let session = self.session.as_mut()?;
        match session.get(&oid) {
            Ok(mut response) => {
                if response.error_status != 0 {
                    debug!(
                        "snmp get {:?} answered with error status {}",
                        oid, response.error_status
                    );
                    return None;
                }
                match response.varbinds.next() {
                    // zero means the agent has no data for this interface
                    Some((_, Value::Counter32(value))) if value != 0 => Some(value),
                    _ => None,
                }
            }
            Err(e) => {
                debug!("snmp get {:?} failed: {:?}", oid, e);
                None
            }
        }
    }
}

impl CounterReader for SnmpCounters {
    fn read(&mut self) -> Option<CounterSample> {
        let inbound = self.counter(IF_IN_OCTETS)?;
        let outbound = self.counter(IF_OUT_OCTETS)?;
        Some(CounterSample {
            inbound: u64::from(inbound),
            outbound: u64::from(outbound),
        })
    }

    fn release(&mut self) {
        self.session = None;
    }
}

pub fn create(target: &str) -> Result<Box<dyn MetricSource>, Error> {
    let target = target.parse::<SnmpTarget>()?;
    let counters = SnmpCounters::open(target)?;
    Ok(Box::new(RateSource::new(
        &SNMP,
        counters,
        CounterWidth::Bits32,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_target() {
        let target: SnmpTarget = "192.168.1.1, private, 3".parse().unwrap();
        assert_eq!(target.host, "192.168.1.1");
        assert_eq!(target.community, "private");
        assert_eq!(target.interface_index, 3);
    }

    #[test]
    fn community_defaults_to_public() {
        let target: SnmpTarget = "switch.lan,12".parse().unwrap();
        assert_eq!(target.community, "public");
        assert_eq!(target.interface_index, 12);
    }

    #[test]
    fn reject_malformed_targets() {
        for target in ["", "host", "host,public,x", ",public,1", "host,,1", "a,b,c,d"] {
            let err = target.parse::<SnmpTarget>().unwrap_err();
            assert!(err.is_invalid_target(), "{}: {}", target, err);
        }
    }

    #[test]
    fn octet_oids() {
        let target: SnmpTarget = "h,7".parse().unwrap();
        assert_eq!(target.oid(IF_IN_OCTETS), [1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 7]);
        assert_eq!(target.oid(IF_OUT_OCTETS), [1, 3, 6, 1, 2, 1, 2, 2, 1, 16, 7]);
    }
}
