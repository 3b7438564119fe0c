//! Checker registry, keyed by the `tag` a [`judge_common::CheckerRef`] names
//! (spec.md §4.4).

use std::collections::BTreeMap;
use std::sync::Arc;

use judge_common::{InternalError, JudgeError};

use crate::checker::{Checker, IdenticalChecker, StandardChecker};

#[derive(Clone)]
pub struct CheckerRegistry {
    checkers: BTreeMap<String, Arc<dyn Checker>>,
}

impl CheckerRegistry {
    pub fn new() -> Self {
        Self { checkers: BTreeMap::new() }
    }

    /// A registry pre-populated with the two built-in checkers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("identical", Arc::new(IdenticalChecker));
        registry.register("standard", Arc::new(StandardChecker));
        registry
    }

    pub fn register(&mut self, tag: impl Into<String>, checker: Arc<dyn Checker>) -> &mut Self {
        self.checkers.insert(tag.into(), checker);
        self
    }

    pub fn get(&self, tag: &str) -> Result<Arc<dyn Checker>, JudgeError> {
        self.checkers
            .get(tag)
            .cloned()
            .ok_or_else(|| InternalError::new(format!("no checker registered for tag: {tag}")).into())
    }
}

impl Default for CheckerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
