//! Style-class classification.
//!
//! Layout-tool exports name their paragraph and character styles after the
//! designer's style sheet ("Platte-tekst", "Titel-meditatie", "Kader"). This
//! module turns those opaque names into [`Role`]s. The result is an
//! immutable [`StyleClassification`] built once per load and passed by
//! reference to every later stage.

mod rules;

pub use rules::{ROLE_RULES, RoleRule, classify_name, is_generator_class, is_inline_override};

use std::collections::HashMap;

use serde::Serialize;

use crate::dom::DeclaredRule;

/// Semantic role of a style class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Title,
    Chapeau,
    Body,
    Author,
    Category,
    Subheading,
    Streamer,
    Sidebar,
    Caption,
    CoverTitle,
    CoverChapeau,
    IntroVerse,
    VerseReference,
    AuthorBio,
    Question,
    ArticleBoundary,
}

/// Mapping from class name to role.
///
/// Entries keep insertion order; a name that is already present is never
/// reclassified, so the first source merged wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleClassification {
    entries: Vec<(String, Role)>,
    index: HashMap<String, usize>,
}

impl StyleClassification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the classes named by declared stylesheet rules.
    pub fn from_declared(rules: &[DeclaredRule]) -> Self {
        Self::from_names(rules.iter().flat_map(|r| r.classes.iter().map(String::as_str)))
    }

    /// Classify a sequence of class names (e.g. every class attribute used
    /// in page content).
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classification = Self::new();
        for name in names {
            classification.insert(name);
        }
        classification
    }

    /// Build the full classification: declared rules first, then classes
    /// used in content.
    pub fn build<'a>(
        declared: &[DeclaredRule],
        used: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut classification = Self::from_declared(declared);
        classification.merge(&Self::from_names(used));
        classification
    }

    /// Classify `name` and record it unless it is already known or matches
    /// no rule. Returns the role the name now has.
    pub fn insert(&mut self, name: &str) -> Option<Role> {
        if let Some(role) = self.role_of(name) {
            return Some(role);
        }
        let role = classify_name(name)?;
        self.push(name, role);
        Some(role)
    }

    /// Union with `other`. Names already present keep their role.
    pub fn merge(&mut self, other: &StyleClassification) {
        for (name, role) in &other.entries {
            if !self.index.contains_key(name) {
                self.push(name, *role);
            }
        }
    }

    fn push(&mut self, name: &str, role: Role) {
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push((name.to_string(), role));
    }

    pub fn role_of(&self, name: &str) -> Option<Role> {
        self.index.get(name).map(|&i| self.entries[i].1)
    }

    /// Class names with the given role, in insertion order.
    pub fn classes_for(&self, role: Role) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(move |(_, r)| *r == role)
            .map(|(name, _)| name.as_str())
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.classes_for(role).next().is_some()
    }

    /// The first class of `classes` that carries `role`.
    pub fn class_with_role<'a>(&self, classes: &'a [String], role: Role) -> Option<&'a str> {
        classes
            .iter()
            .find(|c| self.role_of(c) == Some(role))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Role)> + '_ {
        self.entries.iter().map(|(name, role)| (name.as_str(), *role))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
