//! String-keyed registries mapping identifiers to unit constructors.
use crate::unit::{ChartConstructor, MethodConstructor};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Registry<C> {
    entries: HashMap<&'static str, C>,
}

pub type MethodRegistry = Registry<MethodConstructor>;
pub type ChartRegistry = Registry<ChartConstructor>;

impl<C: Copy> Registry<C> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `ctor` under `id`, replacing any earlier entry.
    pub fn with(mut self, id: &'static str, ctor: C) -> Self {
        self.entries.insert(id, ctor);
        self
    }

    /// Unknown ids are an ordinary outcome, left to the caller.
    pub fn lookup(&self, id: &str) -> Option<C> {
        self.entries.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Copy> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}
