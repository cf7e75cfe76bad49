use std::fs;
use std::io;
use std::path::Path;

use crate::io::atomic_write_string;
use crate::io::wire::{self, TableSnapshot, WireError};
use crate::state::table_state::TableState;

/// Hands the current table to the preview page through the buffer file.
pub fn write_transfer(path: &Path, state: &TableState) -> Result<(), WireError> {
    let json = wire::encode(state)?;
    atomic_write_string(path, &json)?;
    tracing::info!(path = %path.display(), "preview buffer written");
    Ok(())
}

/// Reads and clears the buffer. `Ok(None)` means nothing was handed over.
/// A buffer that fails to parse is left in place.
pub fn take_transfer(path: &Path) -> Result<Option<TableSnapshot>, WireError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let snapshot = serde_json::from_str(&content)?;
    fs::remove_file(path)?;
    Ok(Some(snapshot))
}
