pub mod crx;

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use thiserror::Error;
use zip::ZipArchive;

use crate::models::MANIFEST_FILE_NAME;

/// How many scripts are pulled out of one archive for analysis.
pub const MAX_SCRIPTS: usize = 5;

const SCRIPT_EXTENSION: &str = ".js";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read archive: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid extension archive: {0}")]
    Container(#[from] zip::result::ZipError),
    #[error("malformed CRX wrapper: {0}")]
    Crx(String),
    #[error("manifest.json is not valid UTF-8")]
    ManifestEncoding,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveFormat {
    Crx3,
    Zip, // XPI files are plain ZIP
    Unknown,
}

pub fn detect_format(data: &[u8]) -> ArchiveFormat {
    // CRX3 magic: "Cr24"
    if data.starts_with(b"Cr24") {
        return ArchiveFormat::Crx3;
    }
    // ZIP magic: "PK\x03\x04"
    if data.starts_with(b"PK\x03\x04") {
        return ArchiveFormat::Zip;
    }
    ArchiveFormat::Unknown
}

/// Manifest and script sources pulled out of one uploaded archive.
#[derive(Debug, Default)]
pub struct ArchiveContents {
    pub manifest: Option<String>,
    pub scripts: Vec<(String, String)>,
}

/// Open the uploaded package and extract the manifest plus the first
/// [`MAX_SCRIPTS`] scripts in container-listing order.
///
/// A script that is not valid UTF-8 is skipped (it still counts against the
/// script cap); a manifest that is not valid UTF-8 fails the extraction.
pub fn extract_archive(path: &Path) -> Result<ArchiveContents, ExtractError> {
    let data = fs::read(path)?;
    let zip_data = match detect_format(&data) {
        ArchiveFormat::Crx3 => crx::zip_payload(&data)?,
        // Hand anything else to the zip reader; it rejects non-containers.
        ArchiveFormat::Zip | ArchiveFormat::Unknown => &data[..],
    };

    let mut archive = ZipArchive::new(Cursor::new(zip_data))?;
    let mut contents = ArchiveContents::default();
    let mut selected_scripts = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();

        if name == MANIFEST_FILE_NAME {
            let mut raw = Vec::new();
            entry.read_to_end(&mut raw)?;
            let text = String::from_utf8(raw).map_err(|_| ExtractError::ManifestEncoding)?;
            contents.manifest = Some(text);
        } else if name.ends_with(SCRIPT_EXTENSION) && selected_scripts < MAX_SCRIPTS {
            selected_scripts += 1;
            let mut raw = Vec::new();
            entry.read_to_end(&mut raw)?;
            match String::from_utf8(raw) {
                Ok(text) => contents.scripts.push((name, text)),
                Err(_) => {
                    tracing::debug!(script = %name, "skipping script that is not valid UTF-8");
                }
            }
        }
    }

    Ok(contents)
}
