use serde::{Deserialize, Serialize};
use crate::models::ImportError;

/// Marker carried by every importable type in `types.xml`
pub const DEXTERITY_META_TYPE: &str = "Dexterity FTI";

/// Import configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportConfig {
    /// Required `meta_type` of every type in the archive
    #[serde(default = "default_meta_type")]
    pub meta_type: String,
    /// Largest accepted upload, in bytes (unbounded when absent)
    #[serde(default)]
    pub max_archive_bytes: Option<u64>,
}

fn default_meta_type() -> String {
    DEXTERITY_META_TYPE.to_string()
}

impl ImportConfig {
    pub fn new(meta_type: impl Into<String>) -> Self {
        Self {
            meta_type: meta_type.into(),
            max_archive_bytes: None,
        }
    }

    pub fn with_max_archive_bytes(mut self, limit: u64) -> Self {
        self.max_archive_bytes = Some(limit);
        self
    }

    /// Parse a JSON configuration document; missing fields take their defaults
    pub fn from_json(source: &str) -> Result<Self, ImportError> {
        let config: ImportConfig = serde_json::from_str(source)
            .map_err(|e| ImportError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ImportError> {
        if self.meta_type.trim().is_empty() {
            return Err(ImportError::InvalidConfig("metaType must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::new(DEXTERITY_META_TYPE)
    }
}
