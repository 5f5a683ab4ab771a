use std::collections::BTreeMap;

/// Catalog of registered command names for the help/listing surface.
///
/// Names are unique; re-registering a name moves it to the new category.
/// Filled once at startup, read-only afterwards.
#[derive(Debug, Default)]
pub struct CommandCatalog {
    // name -> category
    entries: BTreeMap<String, String>,
}

impl CommandCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, category: impl Into<String>) {
        self.entries.insert(name.into(), category.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn category_of(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Commands grouped by category, names sorted within each category.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut out: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (name, category) in &self.entries {
            out.entry(category.as_str()).or_default().push(name.as_str());
        }
        out
    }
}
