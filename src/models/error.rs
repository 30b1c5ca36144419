use thiserror::Error;

/// Errors raised while validating or importing a type profile archive
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Error: The file submitted must be a zip archive. ({0})")]
    ContainerFormat(String),

    #[error(
        "Error: The file submitted must be a zip archive containing only type profile information. \
         Unexpected entry \"{0}\"."
    )]
    PathPolicy(String),

    #[error("types.xml in archive is invalid: {0}")]
    DocumentFormat(String),

    #[error("Types in archive must be only {expected} types; \"{name}\" has meta_type \"{found}\".")]
    TypeKind {
        name: String,
        found: String,
        expected: String,
    },

    #[error(
        "One or more types in the import archive is an existing type. \
         Delete \"{0}\" if you really wish to replace it."
    )]
    NameCollision(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Import step failed: {0}")]
    ImportStep(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// True for the rejections a user fixes by correcting the archive and resubmitting
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ImportError::ContainerFormat(_)
                | ImportError::PathPolicy(_)
                | ImportError::DocumentFormat(_)
                | ImportError::TypeKind { .. }
                | ImportError::NameCollision(_)
        )
    }
}

// Form layers only display a message
impl From<ImportError> for String {
    fn from(err: ImportError) -> String {
        err.to_string()
    }
}
