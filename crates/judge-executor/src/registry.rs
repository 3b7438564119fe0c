//! Explicit executor registration (spec.md §4.2 Registry; see also
//! DESIGN.md Open Question: the teacher's `_registry` global replaced by an
//! explicit, constructible registry — no `inventory`/ctor-style magic).

use std::collections::BTreeMap;
use std::sync::Arc;

use judge_common::{InternalError, JudgeError};

use crate::recipe::ExecutorRecipe;

/// Maps a language name (as it appears on a [`judge_common::Submission`])
/// to the recipe that knows how to build and run it.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    recipes: BTreeMap<String, Arc<dyn ExecutorRecipe>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, recipe: Arc<dyn ExecutorRecipe>) -> &mut Self {
        self.recipes.insert(recipe.name().to_string(), recipe);
        self
    }

    pub fn get(&self, language: &str) -> Result<Arc<dyn ExecutorRecipe>, JudgeError> {
        self.recipes
            .get(language)
            .cloned()
            .ok_or_else(|| InternalError::new(format!("no executor registered for language: {language}")).into())
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.recipes.keys().map(String::as_str)
    }
}
