use std::collections::HashMap;

/// Name -> region index lookup for one atlas, built by
/// `TextureAtlas::define_regions`.
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: HashMap<String, u32>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, index: u32) {
        self.regions.insert(name.into(), index);
    }

    /// Look up a region by name. Returns None if not found.
    pub fn get(&self, name: &str) -> Option<u32> {
        self.regions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
