//! Streamer-info data model.
//!
//! A ROOT file describes each serialized class with an ordered list of
//! member descriptors (name + type name). The file-reading collaborator
//! extracts those once per file open; this module holds them for the
//! session as an immutable lookup table.

use std::collections::HashMap;

/// One declared member of a serialized class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamerField {
    /// Member name (ROOT `fName`).
    pub name: String,
    /// Member type name (ROOT `fTypeName`), possibly another class.
    pub type_name: String,
}

impl StreamerField {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self { name: name.into(), type_name: type_name.into() }
    }
}

/// Per-file mapping from fully-qualified class name to its ordered member
/// descriptors. Recursion through member type names terminates at
/// primitive/leaf types.
#[derive(Debug, Clone, Default)]
pub struct StreamerDb {
    classes: HashMap<String, Vec<StreamerField>>,
}

impl StreamerDb {
    /// Empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class and its ordered members.
    pub fn insert(&mut self, class_name: impl Into<String>, fields: Vec<StreamerField>) {
        self.classes.insert(class_name.into(), fields);
    }

    /// Ordered members of `class_name`, if known.
    pub fn fields(&self, class_name: &str) -> Option<&[StreamerField]> {
        self.classes.get(class_name).map(Vec::as_slice)
    }

    /// Whether the file declared streamer info for `class_name`.
    pub fn contains(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }
}
