use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::{write::FileOptions, CompressionMethod, DateTime, ZipWriter};
use crate::core::manifest::{TYPES_TOOL_META_TYPE, TYPES_TOOL_NAME};
use crate::core::validator::MANIFEST_NAME;
use crate::models::profile::find_stem_clash;
use crate::models::{ImportError, TypeDescriptor, TypeProfile, TypesManifest};

type ArchiveEntry = (String, Vec<u8>, Option<NaiveDateTime>);

/// Writes type profiles into an importable ZIP archive
pub struct ProfileExporter;

impl ProfileExporter {
    /// Build an archive holding `types.xml` plus one `types/<name>.xml` per profile
    ///
    /// Every type is listed in `types.xml` with the given `meta_type`. A
    /// profile's `modified` timestamp is stored on its entry.
    ///
    /// # Errors
    /// * [`ImportError::Archive`] if two names share a profile file name
    pub fn export(profiles: &[TypeProfile], meta_type: &str) -> Result<Vec<u8>, ImportError> {
        if let Some((first, second)) = find_stem_clash(profiles.iter().map(|p| p.name.as_str())) {
            return Err(ImportError::Archive(format!(
                "Types '{}' and '{}' would both be written to {}",
                first,
                second,
                TypeDescriptor::new(second, meta_type).profile_path()
            )));
        }

        let manifest = TypesManifest {
            name: Some(TYPES_TOOL_NAME.to_string()),
            meta_type: Some(TYPES_TOOL_META_TYPE.to_string()),
            types: profiles
                .iter()
                .map(|p| TypeDescriptor::new(p.name.as_str(), meta_type))
                .collect(),
        };

        let mut entries = Vec::with_capacity(profiles.len() + 1);
        entries.push((MANIFEST_NAME.to_string(), manifest.to_xml()?, None));
        for (descriptor, profile) in manifest.types.iter().zip(profiles) {
            entries.push((descriptor.profile_path(), profile.body.clone(), profile.modified));
        }

        debug!("Exporting {} type profiles", profiles.len());
        write_archive(entries)
    }

    /// Pack a profile directory from disk into archive bytes
    ///
    /// # Behavior
    /// - Entry names are relative to `source_dir` and `/`-separated
    /// - Only files are stored; directories are implied by the names
    pub fn pack_directory(source_dir: &Path) -> Result<Vec<u8>, ImportError> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(source_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(source_dir).map_err(|e| {
                ImportError::Archive(format!("Failed to calculate relative path: {}", e))
            })?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");

            let data = fs::read(path).map_err(|e| {
                ImportError::Archive(format!("Failed to read file {}: {}", path.display(), e))
            })?;
            entries.push((name, data, None));
        }

        write_archive(entries)
    }
}

fn write_archive(entries: Vec<ArchiveEntry>) -> Result<Vec<u8>, ImportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::<()>::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (name, data, modified) in entries {
        let entry_opts = match modified.map(|m| (m, zip_timestamp(&m))) {
            Some((_, Some(stamp))) => opts.last_modified_time(stamp),
            Some((m, None)) => {
                warn!("Timestamp {} of {} cannot be stored in a ZIP entry", m, name);
                opts
            }
            None => opts,
        };
        zip.start_file(name.as_str(), entry_opts)
            .map_err(|e| ImportError::Archive(
                format!("Failed to start file {} in archive: {}", name, e)
            ))?;
        zip.write_all(&data)
            .map_err(|e| ImportError::Archive(
                format!("Failed to write file {} to archive: {}", name, e)
            ))?;
    }

    let cursor = zip.finish()
        .map_err(|e| ImportError::Archive(
            format!("Failed to finalize ZIP archive: {}", e)
        ))?;

    Ok(cursor.into_inner())
}

/// DOS timestamps cover 1980 through 2107
fn zip_timestamp(stamp: &NaiveDateTime) -> Option<DateTime> {
    DateTime::from_date_and_time(
        u16::try_from(stamp.year()).ok()?,
        stamp.month() as u8,
        stamp.day() as u8,
        stamp.hour() as u8,
        stamp.minute() as u8,
        stamp.second() as u8,
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compression::{ImportContext, ZipImportContext};
    use tempfile::TempDir;

    #[test]
    fn test_export_layout() {
        let profiles = vec![
            TypeProfile::new("event", b"<object name=\"event\"/>".to_vec()),
            TypeProfile::new("News Item", b"<object name=\"News Item\"/>".to_vec()),
        ];
        let bytes = ProfileExporter::export(&profiles, "Dexterity FTI").unwrap();
        let mut ctx = ZipImportContext::open(bytes).unwrap();

        assert_eq!(
            ctx.name_list(),
            ["types.xml", "types/event.xml", "types/News_Item.xml"]
        );
        assert_eq!(
            ctx.read_data_file("News_Item.xml", Some("types")).unwrap(),
            b"<object name=\"News Item\"/>"
        );

        let manifest = TypesManifest::parse(&ctx.read_data_file("types.xml", None).unwrap()).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("portal_types"));
        assert_eq!(
            manifest.types,
            vec![
                TypeDescriptor::new("event", "Dexterity FTI"),
                TypeDescriptor::new("News Item", "Dexterity FTI"),
            ]
        );
    }

    #[test]
    fn test_export_keeps_modified_time() {
        let stamp = chrono::NaiveDate::from_ymd_opt(2022, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 10)
            .unwrap();
        let profiles = vec![
            TypeProfile::new("event", b"<object/>".to_vec()).with_modified(Some(stamp)),
            TypeProfile::new("page", b"<object/>".to_vec()),
        ];
        let bytes = ProfileExporter::export(&profiles, "Dexterity FTI").unwrap();
        let mut ctx = ZipImportContext::open(bytes).unwrap();

        assert_eq!(ctx.last_modified("types/event.xml"), Some(stamp));
        assert_ne!(ctx.last_modified("types/page.xml"), Some(stamp));
    }

    #[test]
    fn test_export_out_of_range_time_still_writes() {
        let stamp = chrono::NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let profiles = vec![TypeProfile::new("event", Vec::new()).with_modified(Some(stamp))];
        let bytes = ProfileExporter::export(&profiles, "Dexterity FTI").unwrap();
        let ctx = ZipImportContext::open(bytes).unwrap();
        assert_eq!(ctx.name_list(), ["types.xml", "types/event.xml"]);
    }

    #[test]
    fn test_export_rejects_shared_profile_file() {
        let profiles = vec![
            TypeProfile::new("News Item", Vec::new()),
            TypeProfile::new("News_Item", Vec::new()),
        ];
        match ProfileExporter::export(&profiles, "Dexterity FTI") {
            Err(ImportError::Archive(msg)) => {
                assert!(msg.contains("News Item"));
                assert!(msg.contains("types/News_Item.xml"));
            }
            other => panic!("Expected Archive error, got {:?}", other),
        }
    }

    #[test]
    fn test_pack_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("types")).unwrap();
        fs::write(temp.path().join("types.xml"), b"<object/>").unwrap();
        fs::write(temp.path().join("types/event.xml"), b"<object name=\"event\"/>").unwrap();

        let bytes = ProfileExporter::pack_directory(temp.path()).unwrap();
        let mut ctx = ZipImportContext::open(bytes).unwrap();

        let mut names = ctx.name_list().to_vec();
        names.sort();
        assert_eq!(names, vec!["types.xml", "types/event.xml"]);
        assert_eq!(ctx.read_data_file("types.xml", None).unwrap(), b"<object/>");
    }

    #[test]
    fn test_pack_empty_directory() {
        let temp = TempDir::new().unwrap();
        let bytes = ProfileExporter::pack_directory(temp.path()).unwrap();
        let ctx = ZipImportContext::open(bytes).unwrap();
        assert!(ctx.name_list().is_empty());
    }
}
