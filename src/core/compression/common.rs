// Import context trait consumed by format-agnostic import steps

use std::collections::BTreeSet;
use chrono::NaiveDateTime;

/// Directory-like read access to an uploaded profile
///
/// Lookups never fail: a missing entry is reported as `None` so that import
/// steps can look for optional files.
pub trait ImportContext {
    /// Raw bytes of `filename`, joined under `subdir` with `/` when given
    fn read_data_file(&mut self, filename: &str, subdir: Option<&str>) -> Option<Vec<u8>>;

    /// Stored modification time of the entry at `path`
    fn last_modified(&mut self, path: &str) -> Option<NaiveDateTime>;

    /// True unless `path` is itself a stored entry name
    fn is_directory(&self, path: &str) -> bool;

    /// Immediate children (files and inferred directories) of `path`
    ///
    /// `None` means the root. Names in `skip` are dropped from direct file
    /// children only.
    fn list_directory(&self, path: Option<&str>, skip: &[&str]) -> BTreeSet<String>;
}
