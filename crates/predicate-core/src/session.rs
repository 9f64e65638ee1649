use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::models::DeviceRecord;

/// Load the working set stored at `path`. A missing file is an empty session.
pub fn load_working_set(path: &Path) -> Result<Vec<DeviceRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records: Vec<DeviceRecord> = serde_json::from_str(&contents)?;
    Ok(records)
}

/// Save the working set as a pretty-printed JSON array.
pub fn save_working_set(path: &Path, records: &[DeviceRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    Ok(())
}

/// Remove the session file, if any.
pub fn clear_working_set(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
