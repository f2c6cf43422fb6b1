//! Strategy factory registry
//!
//! Instance-scoped mapping from unique names to strategy factories.
//! Insertion order is preserved for listing.

use crate::error::{EngineError, Result};
use crate::strategies::StrategyHandle;

#[derive(Default)]
pub struct StrategyRegistry {
    entries: Vec<(String, StrategyHandle)>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`. Duplicate names are rejected.
    pub fn register(&mut self, name: impl Into<String>, factory: StrategyHandle) -> Result<()> {
        let name = name.into();
        if self.entries.iter().any(|(n, _)| *n == name) {
            return Err(EngineError::invalid(
                "name",
                format!("strategy {name:?} is already registered"),
            ));
        }
        self.entries.push((name, factory));
        Ok(())
    }

    /// Look up a factory by name.
    pub fn get(&self, name: &str) -> Result<StrategyHandle> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f.clone())
            .ok_or_else(|| {
                EngineError::invalid("name", format!("unknown strategy {name:?}"))
            })
    }

    /// Registered names in insertion order.
    pub fn list_strategies(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn unregister(&mut self, name: &str) -> Result<()> {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        if self.entries.len() == before {
            return Err(EngineError::invalid(
                "name",
                format!("unknown strategy {name:?}"),
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
