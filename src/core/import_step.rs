use std::collections::HashSet;
use tracing::debug;
use crate::core::compression::ImportContext;
use crate::core::registry::TypeRegistry;
use crate::core::validator::{MANIFEST_NAME, PROFILE_SUFFIX, TYPES_DIR};
use crate::models::profile::profile_file_stem;
use crate::models::{ImportError, TypeProfile, TypesManifest};

/// A profile import step run against an [`ImportContext`]
pub trait ImportStep {
    /// Step identifier
    fn id(&self) -> &str;

    /// Pull files from `context` and register them; returns the names registered
    fn run(
        &mut self,
        context: &mut dyn ImportContext,
        registry: &mut dyn TypeRegistry,
    ) -> Result<Vec<String>, ImportError>;
}

/// Registers every type listed in `types.xml`
///
/// Each type's `types/<name>.xml` is optional; a type without one is
/// registered with an empty profile body.
#[derive(Debug, Default)]
pub struct TypeInfoImportStep;

impl TypeInfoImportStep {
    pub const ID: &'static str = "typeinfo";

    pub fn new() -> Self {
        Self
    }
}

impl ImportStep for TypeInfoImportStep {
    fn id(&self) -> &str {
        Self::ID
    }

    fn run(
        &mut self,
        context: &mut dyn ImportContext,
        registry: &mut dyn TypeRegistry,
    ) -> Result<Vec<String>, ImportError> {
        let source = match context.read_data_file(MANIFEST_NAME, None) {
            Some(source) => source,
            None => {
                debug!("{}: no {} in context, nothing to do", Self::ID, MANIFEST_NAME);
                return Ok(Vec::new());
            }
        };
        let manifest = TypesManifest::parse(&source)?;

        // Nothing is registered unless every name is free
        let mut seen = HashSet::new();
        if let Some(descriptor) = manifest
            .types
            .iter()
            .find(|t| registry.contains_type(&t.name) || !seen.insert(t.name.as_str()))
        {
            return Err(ImportError::NameCollision(descriptor.name.clone()));
        }

        let available = if context.is_directory(TYPES_DIR) {
            context.list_directory(Some(TYPES_DIR), &[])
        } else {
            Default::default()
        };

        let mut imported = Vec::with_capacity(manifest.types.len());
        for descriptor in manifest.types {
            let file_name = format!("{}{}", profile_file_stem(&descriptor.name), PROFILE_SUFFIX);
            let (body, modified) = if available.contains(&file_name) {
                let path = format!("{}/{}", TYPES_DIR, file_name);
                let modified = context.last_modified(&path);
                debug!("{}: reading {} (modified {:?})", Self::ID, path, modified);
                (context.read_data_file(&file_name, Some(TYPES_DIR)), modified)
            } else {
                (None, None)
            };

            let profile = TypeProfile::new(descriptor.name.as_str(), body.unwrap_or_default())
                .with_modified(modified);
            registry.register_type(profile)?;
            imported.push(descriptor.name);
        }

        Ok(imported)
    }
}
