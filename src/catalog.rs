//! Compliment catalog — the fixed list of every compliment the jar can hold.
//!
//! Supplied once by the page at startup (JSON array) and never mutated.
//! Entry order is display order in the collection view.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub id: String,
    /// The compliment itself. Unique across the catalog.
    pub text: String,
    /// Relative image path, e.g. "/stars/pink1.PNG".
    pub image: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Validate and wrap the entries. An empty list is refused: the jar
    /// would spawn nothing and read back as never spawned.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::Catalog("catalog is empty".to_string()));
        }
        for (i, entry) in entries.iter().enumerate() {
            if entry.text.is_empty() {
                return Err(ConfigError::Catalog(format!("entry {} has empty text", i)));
            }
            if entries[..i].iter().any(|e| e.text == entry.text) {
                return Err(ConfigError::Catalog(format!(
                    "duplicate compliment text: {}",
                    entry.text
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_by_text(&self, text: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.text == text)
    }

    /// Resolve an image reference to its entry by bare filename, ignoring
    /// directories, query string and fragment. Stored stars keep their
    /// original image path, so this survives catalog id changes but not
    /// asset renames.
    pub fn find_by_image(&self, image: &str) -> Option<&CatalogEntry> {
        let wanted = image_filename(image);
        self.entries.iter().find(|e| image_filename(&e.image) == wanted)
    }
}

/// `"/a/b/pink1.PNG?v=2#x"` → `"pink1.PNG"`.
pub fn image_filename(url: &str) -> &str {
    let last = url.rsplit('/').next().unwrap_or(url);
    let last = last.split('?').next().unwrap_or(last);
    last.split('#').next().unwrap_or(last)
}

#[cfg(test)]
pub(crate) fn sample_catalog(n: usize) -> Catalog {
    let entries = (0..n)
        .map(|i| CatalogEntry {
            id: format!("c{}", i),
            text: format!("Compliment {}", i),
            image: format!("/stars/star{}.PNG", i),
            description: format!("Description {}", i),
        })
        .collect();
    Catalog { entries }
}
