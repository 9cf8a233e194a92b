use crate::{cpu, if_thr, memory, ping, prelude::*, snmp_rate};
use std::collections::HashMap;

/// Builds a source from its target string.
pub type Constructor = fn(&str) -> Result<Box<dyn MetricSource>, Error>;

#[derive(Clone)]
struct Entry {
    descriptor: &'static SourceDescriptor,
    constructor: Constructor,
}

/// Maps chart kinds to source implementations.
///
/// [`Registry::default`] knows every built-in kind, additional sources are
/// added with [`Registry::register`].
#[derive(Clone)]
pub struct Registry {
    entries: HashMap<String, Entry>,
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds or replaces the source behind `kind`.
    pub fn register(
        &mut self,
        kind: &str,
        descriptor: &'static SourceDescriptor,
        constructor: Constructor,
    ) {
        let entry = Entry {
            descriptor,
            constructor,
        };
        if self.entries.insert(normalize(kind), entry).is_some() {
            debug!("source kind '{}' replaced", kind);
        }
    }

    fn entry(&self, kind: &str) -> Result<&Entry, Error> {
        self.entries
            .get(&normalize(kind))
            .ok_or_else(|| Error::unknown_kind(kind))
    }

    pub fn descriptor(&self, kind: &str) -> Result<&'static SourceDescriptor, Error> {
        self.entry(kind).map(|entry| entry.descriptor)
    }

    pub fn create(&self, kind: &str, target: &str) -> Result<Box<dyn MetricSource>, Error> {
        let entry = self.entry(kind)?;
        (entry.constructor)(target)
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("cpu", &cpu::CPU, cpu::CpuSource::create);
        registry.register("memory", &memory::MEMORY, memory::MemorySource::create);
        registry.register("if_thr", &if_thr::IF_THR, if_thr::create);
        registry.register("network", &if_thr::IF_THR, if_thr::create);
        registry.register("ping", &ping::PING, ping::PingSource::create);
        registry.register("snmp", &snmp_rate::SNMP, snmp_rate::create);
        registry
    }
}

fn normalize(kind: &str) -> String {
    kind.trim().to_ascii_lowercase()
}
