//! Study materials catalogue
//!
//! A JSON tree of `subject -> category -> content`, loaded once at startup.
//! Lookups are case-insensitive on the requested keys.

use std::path::Path;

use serde_json::{Map, Value};

use crate::Result;

/// Default catalogue location, relative to the working directory
pub const DEFAULT_MATERIALS_PATH: &str = "data/study_materials.json";

/// In-memory study materials
#[derive(Debug, Clone, Default)]
pub struct StudyMaterials {
    subjects: Map<String, Value>,
}

impl StudyMaterials {
    /// Parse a catalogue from JSON text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a JSON object of objects
    pub fn from_json(text: &str) -> Result<Self> {
        let subjects: Map<String, Value> = serde_json::from_str(text)?;
        Ok(Self { subjects })
    }

    /// Load the catalogue, or an empty one if the file is missing or invalid
    pub fn load_or_empty(path: &Path) -> Self {
        let loaded = std::fs::read_to_string(path)
            .map_err(crate::Error::from)
            .and_then(|text| Self::from_json(&text));

        match loaded {
            Ok(materials) => {
                tracing::info!(
                    path = %path.display(),
                    subjects = materials.subjects.len(),
                    "loaded study materials"
                );
                materials
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load study materials, serving an empty catalogue"
                );
                Self::default()
            }
        }
    }

    /// Subject keys
    #[must_use]
    pub fn subjects(&self) -> Vec<&str> {
        self.subjects.keys().map(String::as_str).collect()
    }

    /// Category keys for a subject
    #[must_use]
    pub fn categories(&self, subject: &str) -> Option<Vec<&str>> {
        let subject = self.subjects.get(&subject.to_lowercase())?;
        Some(
            subject
                .as_object()
                .map(|categories| categories.keys().map(String::as_str).collect())
                .unwrap_or_default(),
        )
    }

    /// Content for a subject category
    ///
    /// Returns `Err(MissingMaterial::Subject)` or `Err(MissingMaterial::Category)`
    /// so callers can tell which key was unknown.
    pub fn content(&self, subject: &str, category: &str) -> std::result::Result<&Value, MissingMaterial> {
        let subject = self
            .subjects
            .get(&subject.to_lowercase())
            .ok_or(MissingMaterial::Subject)?;

        subject
            .get(category.to_lowercase())
            .ok_or(MissingMaterial::Category)
    }
}

/// Which lookup key was unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingMaterial {
    Subject,
    Category,
}
