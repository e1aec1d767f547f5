use std::fs;
use std::path::Path;

use anyhow::{bail, Result};

/// Ensures that a directory exists at the specified path, creating it and any
/// missing parents if necessary. Fails when the path exists but is not a directory.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => bail!("path '{}' exists but is not a directory", path.display()),
        Err(_) => {
            fs::create_dir_all(path)?;
            Ok(())
        }
    }
}
