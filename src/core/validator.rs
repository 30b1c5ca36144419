use std::collections::HashSet;
use std::io::Read;
use tracing::debug;
use zip::result::ZipError;
use crate::core::compression::open_archive;
use crate::core::registry::TypeRegistry;
use crate::models::profile::find_stem_clash;
use crate::models::{ImportConfig, ImportError, TypeDescriptor, TypesManifest};
use crate::utils::paths::{extension_of, parent_of};

/// The one entry allowed at the archive root
pub const MANIFEST_NAME: &str = "types.xml";
/// Directory holding the per-type profile files
pub const TYPES_DIR: &str = "types";
/// Required suffix of per-type profile files
pub const PROFILE_SUFFIX: &str = ".xml";

/// Checks that an uploaded archive is a purely additive type profile
///
/// Checks run in a fixed order and the first failure is returned:
/// container format, entry paths, `types.xml` structure and profile file
/// names, type kinds, then name collisions. Nothing is mutated.
pub struct ArchiveValidator<'a> {
    registry: &'a dyn TypeRegistry,
    config: &'a ImportConfig,
}

impl<'a> ArchiveValidator<'a> {
    pub fn new(registry: &'a dyn TypeRegistry, config: &'a ImportConfig) -> Self {
        Self { registry, config }
    }

    /// Validate raw archive bytes
    ///
    /// Reads through its own cursor over `bytes`.
    pub fn validate(&self, bytes: &[u8]) -> Result<(), ImportError> {
        let result = self.run_checks(bytes);
        if let Err(ref e) = result {
            debug!("Rejected type profile archive: {}", e);
        }
        result
    }

    fn run_checks(&self, bytes: &[u8]) -> Result<(), ImportError> {
        if let Some(limit) = self.config.max_archive_bytes {
            if bytes.len() as u64 > limit {
                return Err(ImportError::ContainerFormat(format!(
                    "archive is {} bytes, limit is {}",
                    bytes.len(),
                    limit
                )));
            }
        }

        let mut archive = open_archive(bytes)?;

        if let Some(name) = archive.file_names().find(|name| !is_allowed_entry(name)) {
            return Err(ImportError::PathPolicy(name.to_string()));
        }

        let source = {
            let mut entry = match archive.by_name(MANIFEST_NAME) {
                Ok(entry) => entry,
                Err(ZipError::FileNotFound) => {
                    return Err(ImportError::DocumentFormat(format!(
                        "{} is missing from the archive",
                        MANIFEST_NAME
                    )))
                }
                Err(e) => {
                    return Err(ImportError::DocumentFormat(format!(
                        "cannot open {}: {}",
                        MANIFEST_NAME, e
                    )))
                }
            };
            let mut source = Vec::new();
            entry.read_to_end(&mut source).map_err(|e| {
                ImportError::DocumentFormat(format!("cannot read {}: {}", MANIFEST_NAME, e))
            })?;
            source
        };
        let manifest = TypesManifest::parse(&source)?;
        check_profile_files(&manifest)?;

        self.check_kinds(&manifest)?;
        self.check_collisions(&manifest)
    }

    fn check_kinds(&self, manifest: &TypesManifest) -> Result<(), ImportError> {
        match manifest.types.iter().find(|t| t.meta_type != self.config.meta_type) {
            Some(descriptor) => Err(ImportError::TypeKind {
                name: descriptor.name.clone(),
                found: descriptor.meta_type.clone(),
                expected: self.config.meta_type.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_collisions(&self, manifest: &TypesManifest) -> Result<(), ImportError> {
        let existing: HashSet<String> = self.registry.list_content_types().into_iter().collect();
        let mut seen = HashSet::new();
        // A name repeated within the manifest collides with its own first entry
        match manifest
            .types
            .iter()
            .find(|t| existing.contains(&t.name) || !seen.insert(t.name.as_str()))
        {
            Some(descriptor) => Err(ImportError::NameCollision(descriptor.name.clone())),
            None => Ok(()),
        }
    }
}

/// Two distinct type names must not share one `types/<stem>.xml` file
fn check_profile_files(manifest: &TypesManifest) -> Result<(), ImportError> {
    match find_stem_clash(manifest.types.iter().map(|t| t.name.as_str())) {
        Some((first, second)) => Err(ImportError::DocumentFormat(format!(
            "types '{}' and '{}' share the profile file {}",
            first,
            second,
            TypeDescriptor::new(second, "").profile_path()
        ))),
        None => Ok(()),
    }
}

/// `types.xml`, or an `.xml` file directly inside `types/`
fn is_allowed_entry(name: &str) -> bool {
    name == MANIFEST_NAME || (parent_of(name) == TYPES_DIR && extension_of(name) == PROFILE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;
    use crate::core::compression::ProfileExporter;
    use crate::core::registry::InMemoryTypeRegistry;
    use crate::models::TypeProfile;

    const ONE_TYPE: &[u8] =
        b"<object name=\"portal_types\"><object name=\"event\" meta_type=\"Dexterity FTI\"/></object>";

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            zip.start_file(*name, FileOptions::<()>::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn registry(names: &[&str]) -> InMemoryTypeRegistry {
        InMemoryTypeRegistry::with_profiles(names.iter().map(|n| TypeProfile::new(*n, Vec::new())))
    }

    fn validate(bytes: &[u8], existing: &[&str]) -> Result<(), ImportError> {
        let registry = registry(existing);
        let config = ImportConfig::default();
        ArchiveValidator::new(&registry, &config).validate(bytes)
    }

    #[test]
    fn test_valid_archive() {
        let bytes = build_zip(&[("types.xml", ONE_TYPE), ("types/event.xml", b"<object/>")]);
        validate(&bytes, &["page", "folder"]).unwrap();
    }

    #[test]
    fn test_manifest_without_type_files_is_valid() {
        let bytes = build_zip(&[("types.xml", ONE_TYPE)]);
        validate(&bytes, &[]).unwrap();
    }

    #[test]
    fn test_not_a_zip() {
        let result = validate(b"<object/>", &[]);
        assert!(matches!(result, Err(ImportError::ContainerFormat(_))));
    }

    #[test]
    fn test_size_limit() {
        let bytes = build_zip(&[("types.xml", ONE_TYPE)]);
        let registry = registry(&[]);
        let config = ImportConfig::default().with_max_archive_bytes(16);
        let result = ArchiveValidator::new(&registry, &config).validate(&bytes);
        assert!(matches!(result, Err(ImportError::ContainerFormat(_))));
    }

    #[test]
    fn test_disallowed_paths() {
        for bad in [
            "README.txt",
            "other.xml",
            "types/event.txt",
            "types/nested/event.xml",
            "profiles/types/event.xml",
            "types/.xml",
            "types.xml.bak",
            "types\\event.xml",
        ] {
            let bytes = build_zip(&[("types.xml", ONE_TYPE), (bad, b"<object/>")]);
            match validate(&bytes, &[]) {
                Err(ImportError::PathPolicy(name)) => assert_eq!(name, bad),
                other => panic!("{} accepted: {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_directory_entry_disallowed() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("types.xml", FileOptions::<()>::default()).unwrap();
        zip.write_all(ONE_TYPE).unwrap();
        zip.add_directory("types", FileOptions::<()>::default()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        match validate(&bytes, &[]) {
            Err(ImportError::PathPolicy(name)) => assert_eq!(name, "types/"),
            other => panic!("Expected PathPolicy error, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_declared_manifest() {
        let bytes = crate::core::compression::oversized_entry_archive("types.xml", ONE_TYPE);
        if let Err(e) = validate(&bytes, &[]) {
            assert!(e.is_rejection(), "unexpected error {:?}", e);
        }
    }

    #[test]
    fn test_path_checked_before_document() {
        let bytes = build_zip(&[("types.xml", b"<broken"), ("extra.txt", b"")]);
        assert!(matches!(validate(&bytes, &[]), Err(ImportError::PathPolicy(_))));
    }

    #[test]
    fn test_missing_manifest() {
        let bytes = build_zip(&[("types/event.xml", b"<object/>")]);
        assert!(matches!(validate(&bytes, &[]), Err(ImportError::DocumentFormat(_))));
    }

    #[test]
    fn test_malformed_manifest() {
        let bytes = build_zip(&[("types.xml", b"<object><object></object>")]);
        assert!(matches!(validate(&bytes, &[]), Err(ImportError::DocumentFormat(_))));
    }

    #[test]
    fn test_wrong_root_tag() {
        let bytes = build_zip(&[(
            "types.xml",
            b"<types><object name=\"event\" meta_type=\"Dexterity FTI\"/></types>",
        )]);
        assert!(matches!(validate(&bytes, &[]), Err(ImportError::DocumentFormat(_))));
    }

    #[test]
    fn test_wrong_meta_type() {
        let bytes = build_zip(&[(
            "types.xml",
            b"<object><object name=\"doc\" meta_type=\"Factory-based Type Information\"/></object>",
        )]);
        match validate(&bytes, &[]) {
            Err(ImportError::TypeKind { name, found, expected }) => {
                assert_eq!(name, "doc");
                assert_eq!(found, "Factory-based Type Information");
                assert_eq!(expected, "Dexterity FTI");
            }
            other => panic!("Expected TypeKind error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_meta_type_is_wrong_kind() {
        let bytes = build_zip(&[("types.xml", b"<object><object name=\"doc\"/></object>")]);
        assert!(matches!(validate(&bytes, &[]), Err(ImportError::TypeKind { .. })));
    }

    #[test]
    fn test_kind_checked_before_collision() {
        let bytes = build_zip(&[(
            "types.xml",
            b"<object>\
              <object name=\"event\" meta_type=\"Dexterity FTI\"/>\
              <object name=\"doc\" meta_type=\"Other\"/>\
              </object>",
        )]);
        assert!(matches!(
            validate(&bytes, &["event"]),
            Err(ImportError::TypeKind { ref name, .. }) if name == "doc"
        ));
    }

    #[test]
    fn test_name_collision() {
        let bytes = build_zip(&[("types.xml", ONE_TYPE)]);
        match validate(&bytes, &["page", "event"]) {
            Err(ImportError::NameCollision(name)) => assert_eq!(name, "event"),
            other => panic!("Expected NameCollision error, got {:?}", other),
        }
    }

    #[test]
    fn test_namespaced_root() {
        let bytes = build_zip(&[(
            "types.xml",
            b"<object xmlns=\"http://example.com/ns\">\
              <object name=\"event\" meta_type=\"Dexterity FTI\"/></object>",
        )]);
        assert!(matches!(validate(&bytes, &[]), Err(ImportError::DocumentFormat(_))));
    }

    #[test]
    fn test_names_sharing_profile_file() {
        let bytes = build_zip(&[(
            "types.xml",
            b"<object>\
              <object name=\"News Item\" meta_type=\"Dexterity FTI\"/>\
              <object name=\"News_Item\" meta_type=\"Dexterity FTI\"/>\
              </object>",
        )]);
        match validate(&bytes, &[]) {
            Err(ImportError::DocumentFormat(msg)) => assert!(msg.contains("types/News_Item.xml")),
            other => panic!("Expected DocumentFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_name_in_manifest() {
        let bytes = build_zip(&[(
            "types.xml",
            b"<object>\
              <object name=\"a\" meta_type=\"Dexterity FTI\"/>\
              <object name=\"b\" meta_type=\"Dexterity FTI\"/>\
              <object name=\"a\" meta_type=\"Dexterity FTI\"/>\
              </object>",
        )]);
        match validate(&bytes, &[]) {
            Err(ImportError::NameCollision(name)) => assert_eq!(name, "a"),
            other => panic!("Expected NameCollision error, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_meta_type() {
        let bytes = build_zip(&[(
            "types.xml",
            b"<object><object name=\"doc\" meta_type=\"Custom FTI\"/></object>",
        )]);
        let registry = registry(&[]);
        let config = ImportConfig::new("Custom FTI");
        ArchiveValidator::new(&registry, &config).validate(&bytes).unwrap();
    }

    #[test]
    fn test_exported_registry_always_collides() {
        let source = registry(&["event", "News Item", "page"]);
        let bytes = source.export_archive("Dexterity FTI").unwrap();
        let config = ImportConfig::default();

        ArchiveValidator::new(&InMemoryTypeRegistry::new(), &config)
            .validate(&bytes)
            .unwrap();

        for name in ["event", "News Item", "page"] {
            let only_one = registry(&[name]);
            match ArchiveValidator::new(&only_one, &config).validate(&bytes) {
                Err(ImportError::NameCollision(found)) => assert_eq!(found, name),
                other => panic!("Expected collision on {}, got {:?}", name, other),
            }
        }
        assert!(matches!(
            ArchiveValidator::new(&source, &config).validate(&bytes),
            Err(ImportError::NameCollision(_))
        ));
    }

    #[test]
    fn test_validation_leaves_buffer_usable() {
        let bytes = ProfileExporter::export(&[TypeProfile::new("event", b"<object/>".to_vec())], "Dexterity FTI")
            .unwrap();
        let registry = registry(&[]);
        let config = ImportConfig::default();
        let validator = ArchiveValidator::new(&registry, &config);
        validator.validate(&bytes).unwrap();
        validator.validate(&bytes).unwrap();
    }
}
