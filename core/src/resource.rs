//! Resource types and capacity-bounded stores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Energy,
    Power,
    Hydrogen,
    Oxygen,
    Utrium,
    Lemergium,
    Keanium,
    Zynthium,
    Catalyst,
    Ghodium,
}

/// Carried resources with a shared capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryStore {
    pub contents: BTreeMap<ResourceType, u32>,
    pub capacity: u32,
}

impl CarryStore {
    pub fn with_capacity(capacity: u32) -> Self {
        Self { contents: BTreeMap::new(), capacity }
    }

    pub fn get(&self, resource: ResourceType) -> u32 {
        self.contents.get(&resource).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.contents.values().sum()
    }

    pub fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.total())
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Add up to `amount`; returns what fit.
    pub fn add(&mut self, resource: ResourceType, amount: u32) -> u32 {
        let stored = amount.min(self.free());
        if stored > 0 {
            *self.contents.entry(resource).or_insert(0) += stored;
        }
        stored
    }

    /// Remove up to `amount`; returns what was removed.
    pub fn remove(&mut self, resource: ResourceType, amount: u32) -> u32 {
        let held = self.get(resource);
        let taken = held.min(amount);
        if taken == held {
            self.contents.remove(&resource);
        } else if let Some(v) = self.contents.get_mut(&resource) {
            *v -= taken;
        }
        taken
    }

    /// Change the capacity. Whatever no longer fits is removed, last
    /// resource type first, and returned.
    pub fn set_capacity(&mut self, capacity: u32) -> Vec<(ResourceType, u32)> {
        self.capacity = capacity;
        let mut overflow = self.total().saturating_sub(capacity);
        let mut spilled = Vec::new();
        let held: Vec<ResourceType> = self.contents.keys().rev().copied().collect();
        for resource in held {
            if overflow == 0 {
                break;
            }
            let taken = self.remove(resource, overflow);
            overflow -= taken;
            spilled.push((resource, taken));
        }
        spilled
    }
}
