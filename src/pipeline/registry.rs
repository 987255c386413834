//! Run-scoped mutable state: the category registry and the annotation id
//! allocator.
//!
//! These are the only two pieces of state shared across images within a
//! run. Both are owned by the assembler and passed by reference into the
//! per-image processing, never ambient globals.

use std::collections::HashMap;

use crate::dataset::{AnnotationId, Category, CategoryId};

/// Maps free-text building-type labels to stable integer category ids.
///
/// Labels are normalized (trimmed, case-folded) before lookup; ids are
/// assigned in first-seen order starting at 1 and never reassigned. The
/// final category list follows first-seen order, which is reproducible
/// given a fixed input iteration order.
#[derive(Debug, Default)]
pub struct CategoryRegistry {
    by_name: HashMap<String, CategoryId>,
    /// Categories in first-seen order.
    categories: Vec<Category>,
    supercategory: Option<String>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the supercategory attached to every new category record.
    pub fn with_supercategory(supercategory: impl Into<String>) -> Self {
        Self {
            supercategory: Some(supercategory.into()),
            ..Self::default()
        }
    }

    /// Resolves a label to its category id, creating the category on
    /// first encounter. Idempotent for any labels that normalize
    /// identically.
    pub fn resolve(&mut self, label: &str) -> CategoryId {
        let normalized = Self::normalize(label);
        if let Some(&id) = self.by_name.get(&normalized) {
            return id;
        }

        let id = CategoryId::new(self.categories.len() as u64 + 1);
        let category = match &self.supercategory {
            Some(supercategory) => {
                Category::with_supercategory(id, normalized.clone(), supercategory.clone())
            }
            None => Category::new(id, normalized.clone()),
        };
        self.categories.push(category);
        self.by_name.insert(normalized, id);
        id
    }

    /// The normalized name for an id, if the id has been issued.
    pub fn name_of(&self, id: CategoryId) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.id == id)
            .map(|category| category.name.as_str())
    }

    /// All categories in first-seen order.
    pub fn into_categories(self) -> Vec<Category> {
        self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn normalize(label: &str) -> String {
        label.trim().to_lowercase()
    }
}

/// Issues globally unique, monotonically increasing annotation ids.
///
/// The counter starts at 1 and is scoped to the whole dataset, not per
/// image. An issued id is never reused, even if the annotation is later
/// dropped.
#[derive(Debug)]
pub struct AnnotationIdAllocator {
    next: u64,
}

impl AnnotationIdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Issues the next id.
    pub fn next_id(&mut self) -> AnnotationId {
        let id = AnnotationId::new(self.next);
        self.next += 1;
        id
    }

    /// How many ids have been issued so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for AnnotationIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
