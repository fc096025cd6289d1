//! Needs document file I/O.
//!
//! Writes create the parent directory first and go through a buffered
//! writer that is flushed explicitly; the handle is dropped on every path.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use needs_types::NeedsDocument;

use crate::error::{SyncError, SyncResult};

// ── In-memory ──

pub fn to_json_string(doc: &NeedsDocument) -> SyncResult<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

pub fn from_json_str(content: &str) -> SyncResult<NeedsDocument> {
    Ok(serde_json::from_str(content)?)
}

// ── Files ──

pub fn read_document(path: &Path) -> SyncResult<NeedsDocument> {
    let file = File::open(path).map_err(|e| SyncError::io(path, e))?;
    let doc = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        if source.is_io() {
            SyncError::io(path, std::io::Error::other(source))
        } else {
            SyncError::Parse {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    tracing::debug!(path = %path.display(), "needs document read");
    Ok(doc)
}

pub fn write_document(path: &Path, doc: &NeedsDocument) -> SyncResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
        }
    }

    let file = File::create(path).map_err(|e| SyncError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, doc).map_err(|source| {
        if source.is_io() {
            SyncError::io(path, std::io::Error::other(source))
        } else {
            SyncError::Serialize(source)
        }
    })?;
    writer.write_all(b"\n").map_err(|e| SyncError::io(path, e))?;
    writer.flush().map_err(|e| SyncError::io(path, e))?;

    tracing::info!(path = %path.display(), needs = doc.needs_amount(), "needs document written");
    Ok(())
}
