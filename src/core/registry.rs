use crate::core::compression::export::ProfileExporter;
use crate::models::{ImportError, TypeProfile};

/// Destination registry of content types
///
/// Registration is strictly additive: implementations must refuse a name
/// that already exists with [`ImportError::NameCollision`].
pub trait TypeRegistry {
    /// Snapshot of the identifiers currently registered
    fn list_content_types(&self) -> Vec<String>;

    /// Add a new type
    fn register_type(&mut self, profile: TypeProfile) -> Result<(), ImportError>;

    fn contains_type(&self, name: &str) -> bool {
        self.list_content_types().iter().any(|existing| existing == name)
    }
}

/// Ordered in-memory registry
#[derive(Debug, Default, Clone)]
pub struct InMemoryTypeRegistry {
    profiles: Vec<TypeProfile>,
}

impl InMemoryTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with profiles; later duplicates are dropped
    pub fn with_profiles(profiles: impl IntoIterator<Item = TypeProfile>) -> Self {
        let mut registry = Self::new();
        for profile in profiles {
            if !registry.contains_type(&profile.name) {
                registry.profiles.push(profile);
            }
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&TypeProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Export every registered type as a profile archive
    pub fn export_archive(&self, meta_type: &str) -> Result<Vec<u8>, ImportError> {
        ProfileExporter::export(&self.profiles, meta_type)
    }
}

impl TypeRegistry for InMemoryTypeRegistry {
    fn list_content_types(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }

    fn register_type(&mut self, profile: TypeProfile) -> Result<(), ImportError> {
        if self.contains_type(&profile.name) {
            return Err(ImportError::NameCollision(profile.name));
        }
        self.profiles.push(profile);
        Ok(())
    }

    fn contains_type(&self, name: &str) -> bool {
        self.profiles.iter().any(|p| p.name == name)
    }
}
