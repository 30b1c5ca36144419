use std::collections::HashMap;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One type listed in `types.xml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub name: String,
    pub meta_type: String,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, meta_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meta_type: meta_type.into(),
        }
    }

    /// Path of this type's profile file inside the archive
    pub fn profile_path(&self) -> String {
        format!("types/{}.xml", profile_file_stem(&self.name))
    }
}

/// Parsed `types.xml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypesManifest {
    /// `name` attribute of the root element, if any
    pub name: Option<String>,
    /// `meta_type` attribute of the root element, if any
    pub meta_type: Option<String>,
    pub types: Vec<TypeDescriptor>,
}

/// A single type profile: its name plus the raw `types/<name>.xml` document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeProfile {
    pub name: String,
    pub body: Vec<u8>,
    /// Timestamp of the profile file the body was read from
    pub modified: Option<NaiveDateTime>,
}

impl TypeProfile {
    pub fn new(name: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            modified: None,
        }
    }

    pub fn with_modified(mut self, modified: Option<NaiveDateTime>) -> Self {
        self.modified = modified;
        self
    }
}

/// An uploaded archive as handed over by the form layer
#[derive(Debug, Clone)]
pub struct ProfileUpload {
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

impl ProfileUpload {
    pub fn new(filename: Option<String>, data: Vec<u8>) -> Self {
        Self { filename, data }
    }

    /// Name used in log lines
    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("<upload>")
    }
}

/// File stem used for a type's profile file (spaces become underscores)
pub fn profile_file_stem(name: &str) -> String {
    name.replace(' ', "_")
}

/// First pair of distinct names that map to the same profile file
///
/// Repeats of one exact name are not reported here.
pub fn find_stem_clash<'a, I>(names: I) -> Option<(&'a str, &'a str)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut by_stem: HashMap<String, &'a str> = HashMap::new();
    for name in names {
        match by_stem.get(&profile_file_stem(name)) {
            Some(&first) if first != name => return Some((first, name)),
            Some(_) => {}
            None => {
                by_stem.insert(profile_file_stem(name), name);
            }
        }
    }
    None
}
