//! The `FontProvider` capability (spec §9): loads canonical full-font bytes by id.
//!
//! Grounded on `font_provider.h`/`file_font_provider.cc`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{PatchSubsetError, Result};

/// Loads the canonical full font associated with an id.
pub trait FontProvider {
    /// Returns `NotFound` if `id` is not recognised.
    fn get_font(&self, id: &str) -> Result<Vec<u8>>;
}

/// Loads fonts from a directory on the filesystem, keyed by file name.
pub struct FileFontProvider {
    base_directory: PathBuf,
}

impl FileFontProvider {
    pub fn new(base_directory: impl Into<PathBuf>) -> Self {
        FileFontProvider {
            base_directory: base_directory.into(),
        }
    }
}

impl FontProvider for FileFontProvider {
    fn get_font(&self, id: &str) -> Result<Vec<u8>> {
        let path: &Path = &self.base_directory.join(id);
        std::fs::read(path).map_err(|_| {
            warn!("{} does not exist.", path.display());
            PatchSubsetError::not_found(format!("font {id} does not exist"))
        })
    }
}

/// Loads fonts from an in-memory table, used by tests and the demo binary.
#[derive(Debug, Clone, Default)]
pub struct MemoryFontProvider {
    fonts: HashMap<String, Vec<u8>>,
}

impl MemoryFontProvider {
    pub fn new() -> Self {
        MemoryFontProvider::default()
    }

    pub fn with_font(mut self, id: impl Into<String>, data: Vec<u8>) -> Self {
        self.fonts.insert(id.into(), data);
        self
    }
}

impl FontProvider for MemoryFontProvider {
    fn get_font(&self, id: &str) -> Result<Vec<u8>> {
        self.fonts
            .get(id)
            .cloned()
            .ok_or_else(|| PatchSubsetError::not_found(format!("font {id} does not exist")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_provider_round_trips() {
        let provider = MemoryFontProvider::new().with_font("Roboto-Regular.ttf", vec![1, 2, 3]);
        assert_eq!(provider.get_font("Roboto-Regular.ttf").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn memory_provider_reports_not_found() {
        let provider = MemoryFontProvider::new();
        assert!(matches!(
            provider.get_font("missing.ttf"),
            Err(PatchSubsetError::NotFound(_))
        ));
    }
}
