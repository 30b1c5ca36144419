use serde::Serialize;
use tracing::info;
use crate::core::compression::ZipImportContext;
use crate::core::import_step::ImportStep;
use crate::core::registry::TypeRegistry;
use crate::core::validator::ArchiveValidator;
use crate::models::{ImportConfig, ImportError, ProfileUpload};

/// Status message shown after a successful import
pub const IMPORT_SUCCESS_MESSAGE: &str = "Imported successfully.";

/// Result of an import, handed back to the form layer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    /// Identifier of the step that ran
    pub step: String,
    /// Type names registered, in `types.xml` order
    pub imported: Vec<String>,
    pub message: String,
}

/// Form-time check of an uploaded archive
///
/// A missing upload passes; the form's required-field check reports it.
pub fn check_profile_upload(
    upload: Option<&ProfileUpload>,
    registry: &dyn TypeRegistry,
    config: &ImportConfig,
) -> Result<(), ImportError> {
    match upload {
        Some(upload) => ArchiveValidator::new(registry, config).validate(&upload.data),
        None => Ok(()),
    }
}

/// Import the types in an uploaded archive
///
/// # Flow
/// 1. Validate the archive against the current registry while opening it
/// 2. Run `step` over the opened context
/// 3. Report the registered names
pub fn import_profile_upload(
    upload: ProfileUpload,
    registry: &mut dyn TypeRegistry,
    step: &mut dyn ImportStep,
    config: &ImportConfig,
) -> Result<ImportOutcome, ImportError> {
    info!("Importing type profiles from {}", upload.display_name());

    let mut context = ZipImportContext::open_validated(upload.data, &*registry, config)?;
    let imported = step.run(&mut context, registry)?;

    info!("Step {} imported {} types: {:?}", step.id(), imported.len(), imported);

    Ok(ImportOutcome {
        step: step.id().to_string(),
        imported,
        message: IMPORT_SUCCESS_MESSAGE.to_string(),
    })
}
