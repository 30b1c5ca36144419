//! Import of content type profiles from an uploaded ZIP archive.
//!
//! An upload is first checked by [`ArchiveValidator`], then exposed to a
//! format-agnostic [`ImportStep`] through a [`ZipImportContext`], which gives
//! the archive directory and file semantics.

// Module declarations
pub mod models;
pub mod core;
pub mod commands;
pub mod utils;

pub use commands::import::{check_profile_upload, import_profile_upload, ImportOutcome};
pub use crate::core::compression::{ImportContext, ProfileExporter, ZipImportContext};
pub use crate::core::import_step::{ImportStep, TypeInfoImportStep};
pub use crate::core::registry::{InMemoryTypeRegistry, TypeRegistry};
pub use crate::core::validator::ArchiveValidator;
pub use models::{
    ImportConfig, ImportError, ProfileUpload, TypeDescriptor, TypeProfile, TypesManifest,
    DEXTERITY_META_TYPE,
};
