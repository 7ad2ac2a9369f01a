//! Persistent per-entity memory, scoped into four namespaces.
//!
//! Lifecycle per tick: loaded from the store at tick start, mutated by
//! behaviours through an explicitly passed `&mut MemoryStore`, flushed back
//! at tick end. Records are opaque JSON documents.

use crate::{
    error::{SimError, SimResult},
    store::SimStore,
    types::Tick,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryNamespace {
    Creeps,
    Flags,
    Rooms,
    Spawns,
}

impl MemoryNamespace {
    pub const ALL: [MemoryNamespace; 4] = [Self::Creeps, Self::Flags, Self::Rooms, Self::Spawns];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creeps => "creeps",
            Self::Flags  => "flags",
            Self::Rooms  => "rooms",
            Self::Spawns => "spawns",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.as_str() == s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStore {
    pub creeps: BTreeMap<String, Value>,
    pub flags:  BTreeMap<String, Value>,
    pub rooms:  BTreeMap<String, Value>,
    pub spawns: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(&self, ns: MemoryNamespace) -> &BTreeMap<String, Value> {
        match ns {
            MemoryNamespace::Creeps => &self.creeps,
            MemoryNamespace::Flags  => &self.flags,
            MemoryNamespace::Rooms  => &self.rooms,
            MemoryNamespace::Spawns => &self.spawns,
        }
    }

    pub fn namespace_mut(&mut self, ns: MemoryNamespace) -> &mut BTreeMap<String, Value> {
        match ns {
            MemoryNamespace::Creeps => &mut self.creeps,
            MemoryNamespace::Flags  => &mut self.flags,
            MemoryNamespace::Rooms  => &mut self.rooms,
            MemoryNamespace::Spawns => &mut self.spawns,
        }
    }

    pub fn get(&self, ns: MemoryNamespace, name: &str) -> Option<&Value> {
        self.namespace(ns).get(name)
    }

    /// The record for `name`, created as an empty object if missing.
    pub fn record_mut(&mut self, ns: MemoryNamespace, name: &str) -> &mut Value {
        self.namespace_mut(ns)
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
    }

    pub fn insert(&mut self, ns: MemoryNamespace, name: &str, doc: Value) -> Option<Value> {
        self.namespace_mut(ns).insert(name.to_string(), doc)
    }

    pub fn remove(&mut self, ns: MemoryNamespace, name: &str) -> Option<Value> {
        self.namespace_mut(ns).remove(name)
    }

    /// Read one top-level field of a record.
    pub fn field(&self, ns: MemoryNamespace, name: &str, key: &str) -> Option<&Value> {
        self.get(ns, name)?.get(key)
    }

    /// Write one top-level field, creating the record if needed.
    /// A record that is not an object is replaced by one.
    pub fn set_field(&mut self, ns: MemoryNamespace, name: &str, key: &str, value: Value) {
        let record = self.record_mut(ns, name);
        if !record.is_object() {
            *record = Value::Object(Map::new());
        }
        if let Value::Object(map) = record {
            map.insert(key.to_string(), value);
        }
    }

    /// Drop creep records for which `alive` returns false. Returns the
    /// names removed.
    pub fn retain_creeps(&mut self, alive: impl Fn(&str) -> bool) -> Vec<String> {
        let dead: Vec<String> = self.creeps.keys().filter(|n| !alive(n)).cloned().collect();
        for name in &dead {
            self.creeps.remove(name);
        }
        dead
    }

    pub fn record_count(&self) -> usize {
        MemoryNamespace::ALL.iter().map(|ns| self.namespace(*ns).len()).sum()
    }

    // ── Raw form ─────────────────────────────────────────────────────

    /// The whole memory as one JSON document.
    pub fn to_raw(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a raw document. An empty string is an empty memory.
    pub fn from_raw(raw: &str) -> SimResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    // ── Persistence ──────────────────────────────────────────────────

    pub fn load(store: &SimStore, run_id: &str) -> SimResult<Self> {
        let mut memory = Self::default();
        for (namespace, name, doc) in store.memory_rows(run_id)? {
            let ns = MemoryNamespace::parse(&namespace).ok_or_else(|| {
                SimError::Other(anyhow::anyhow!("unknown memory namespace '{namespace}'"))
            })?;
            memory.insert(ns, &name, serde_json::from_str(&doc)?);
        }
        Ok(memory)
    }

    /// Write every record back to the store. Returns the serialized size
    /// in bytes.
    pub fn flush(&self, store: &SimStore, run_id: &str, tick: Tick) -> SimResult<usize> {
        let mut rows = Vec::with_capacity(self.record_count());
        let mut bytes = 0;
        for ns in MemoryNamespace::ALL {
            for (name, doc) in self.namespace(ns) {
                let json = serde_json::to_string(doc)?;
                bytes += json.len();
                rows.push((ns.as_str(), name.as_str(), json));
            }
        }
        store.replace_memory(run_id, tick, &rows)?;
        Ok(bytes)
    }
}
