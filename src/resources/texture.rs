//! Texture asset handles.
//!
//! Decoding image files is the loader's business. The pipeline only needs a
//! stable handle per texture name so materials can refer to it and passes
//! can bind it as [`TextureView::Asset`](crate::renderer::core::TextureView::Asset).

use rustc_hash::FxHashMap;

use crate::errors::{Result, StrataError};

/// Opaque handle to a loaded texture.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureHandle(pub u32);

/// The texture loader capability.
pub trait TextureLibrary {
    /// Loads `name` (once) and returns its handle.
    fn load_texture(&mut self, name: &str) -> Result<TextureHandle>;

    /// Returns the handle of an already loaded texture.
    fn get_texture(&self, name: &str) -> Result<TextureHandle>;
}

/// In-memory name → handle table.
#[derive(Debug, Default)]
pub struct TextureRegistry {
    by_name: FxHashMap<String, TextureHandle>,
    next: u32,
}

impl TextureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl TextureLibrary for TextureRegistry {
    fn load_texture(&mut self, name: &str) -> Result<TextureHandle> {
        if let Some(handle) = self.by_name.get(name) {
            return Ok(*handle);
        }
        let handle = TextureHandle(self.next);
        self.next += 1;
        self.by_name.insert(name.to_owned(), handle);
        log::debug!("Registered texture `{name}` as {handle:?}");
        Ok(handle)
    }

    fn get_texture(&self, name: &str) -> Result<TextureHandle> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| StrataError::MissingTexture(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_twice_returns_same_handle() {
        let mut registry = TextureRegistry::new();
        let a = registry.load_texture("bricks_colour").unwrap();
        let b = registry.load_texture("bricks_colour").unwrap();
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_texture_is_an_error() {
        let registry = TextureRegistry::new();
        assert!(matches!(
            registry.get_texture("height"),
            Err(StrataError::MissingTexture(_))
        ));
    }
}
