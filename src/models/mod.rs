pub mod error;
pub mod config;
pub mod profile;

// Re-export commonly used types
pub use error::ImportError;
pub use config::{ImportConfig, DEXTERITY_META_TYPE};
pub use profile::{ProfileUpload, TypeDescriptor, TypeProfile, TypesManifest};
