// Archive access for type profile uploads
pub mod common;
pub mod export;
pub mod zip_handler;

use std::io::Cursor;
use zip::ZipArchive;
use crate::models::ImportError;

pub use common::ImportContext;
pub use export::ProfileExporter;
pub use zip_handler::ZipImportContext;

/// Open an in-memory ZIP archive
///
/// Works on any byte container, so callers can read a borrowed buffer
/// without disturbing anyone else's view of it.
pub fn open_archive<B: AsRef<[u8]>>(bytes: B) -> Result<ZipArchive<Cursor<B>>, ImportError> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ImportError::ContainerFormat(format!("Failed to read ZIP archive: {}", e)))
}

/// Single stored entry whose central directory declares a zip64
/// uncompressed size of 2^63 bytes while holding only `data`
#[cfg(test)]
pub(crate) fn oversized_entry_archive(name: &str, data: &[u8]) -> Vec<u8> {
    let crc = crc32fast::hash(data);
    let name_len = name.len() as u16;
    let data_len = data.len() as u32;
    let mut out = Vec::new();

    // Local file header
    out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0x0021u16.to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(&name_len.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(data);

    // Central directory header with a zip64 extra field
    let cd_offset = out.len() as u32;
    out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0x0021u16.to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&name_len.to_le_bytes());
    out.extend_from_slice(&12u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&0x0001u16.to_le_bytes());
    out.extend_from_slice(&8u16.to_le_bytes());
    out.extend_from_slice(&(1u64 << 63).to_le_bytes());
    let cd_size = out.len() as u32 - cd_offset;

    // End of central directory
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}
