use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;
use crate::core::compression::common::ImportContext;
use crate::core::compression::open_archive;
use crate::core::registry::TypeRegistry;
use crate::core::validator::ArchiveValidator;
use crate::models::{ImportConfig, ImportError};
use crate::utils::paths::{join_entry, split_entry};

/// Import context backed by an in-memory ZIP archive
///
/// ZIP files only store full entry names, so directories are inferred from
/// the `/`-separated names rather than read from the archive.
pub struct ZipImportContext {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    name_list: Vec<String>,
}

impl ZipImportContext {
    /// Open a context over raw archive bytes
    ///
    /// # Errors
    /// * [`ImportError::ContainerFormat`] if the bytes are not a ZIP archive
    pub fn open(bytes: Vec<u8>) -> Result<Self, ImportError> {
        let archive = open_archive(bytes)?;
        let name_list: Vec<String> = archive.file_names().map(str::to_string).collect();
        debug!("Opened import archive with {} entries", name_list.len());

        Ok(Self { archive, name_list })
    }

    /// Validate the archive as a type profile against `registry`, then open it
    pub fn open_validated(
        bytes: Vec<u8>,
        registry: &dyn TypeRegistry,
        config: &ImportConfig,
    ) -> Result<Self, ImportError> {
        ArchiveValidator::new(registry, config).validate(&bytes)?;
        Self::open(bytes)
    }

    /// Entry names in archive order
    pub fn name_list(&self) -> &[String] {
        &self.name_list
    }
}

impl ImportContext for ZipImportContext {
    fn read_data_file(&mut self, filename: &str, subdir: Option<&str>) -> Option<Vec<u8>> {
        let path = join_entry(subdir, filename);
        let mut file = match self.archive.by_name(&path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return None,
            Err(e) => {
                warn!("Unreadable archive entry {}: {}", path, e);
                return None;
            }
        };

        // The declared size is not trusted for allocation
        let mut data = Vec::new();
        if let Err(e) = file.read_to_end(&mut data) {
            warn!("Failed to decompress archive entry {}: {}", path, e);
            return None;
        }
        Some(data)
    }

    fn last_modified(&mut self, path: &str) -> Option<NaiveDateTime> {
        let stamp = self.archive.by_name(path).ok()?.last_modified()?;
        NaiveDate::from_ymd_opt(
            i32::from(stamp.year()),
            u32::from(stamp.month()),
            u32::from(stamp.day()),
        )?
        .and_hms_opt(
            u32::from(stamp.hour()),
            u32::from(stamp.minute()),
            u32::from(stamp.second()),
        )
    }

    fn is_directory(&self, path: &str) -> bool {
        !self.name_list.iter().any(|name| name == path)
    }

    fn list_directory(&self, path: Option<&str>, skip: &[&str]) -> BTreeSet<String> {
        let path = path.unwrap_or("");
        let depth = path.split('/').count();
        let mut children = BTreeSet::new();

        for name in &self.name_list {
            let (parent, base) = split_entry(name);
            if parent == path {
                if !skip.contains(&base) {
                    children.insert(base.to_string());
                }
            } else if parent.starts_with(path)
                && (path.is_empty() || parent.split('/').count() == depth + 1)
            {
                // Report the intermediate directory one level below `path`
                let dir = parent.rsplit('/').next().unwrap_or(parent);
                children.insert(dir.to_string());
            }
        }

        children
    }
}
