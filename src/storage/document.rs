use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Write a value as pretty-printed JSON.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    fs::write(path, text)
}

/// Read raw bytes, substitute invalid UTF-8 sequences, parse as JSON.
///
/// Malformed byte sequences become U+FFFD instead of aborting the read, so
/// a document written by a sloppy external writer still loads.
pub(crate) fn load_json(path: &Path) -> io::Result<Value> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);

    serde_json::from_str(&text).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

/// Permission-bit writability check for files and directories.
pub(crate) fn is_writable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| !meta.permissions().readonly())
        .unwrap_or(false)
}

/// Filesystem change and modification times of a document file.
pub(crate) fn file_times(path: &Path) -> io::Result<(DateTime<Utc>, DateTime<Utc>)> {
    let meta = fs::metadata(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let created = DateTime::from_timestamp(meta.ctime(), meta.ctime_nsec() as u32)
            .unwrap_or_default();
        let modified = DateTime::from_timestamp(meta.mtime(), meta.mtime_nsec() as u32)
            .unwrap_or_default();
        Ok((created, modified))
    }

    #[cfg(not(unix))]
    {
        let modified: DateTime<Utc> = meta.modified()?.into();
        let created = meta.created().map(Into::into).unwrap_or(modified);
        Ok((created, modified))
    }
}
