//! Filesystem helpers.

use std::path::Path;

use sieve_core::{Result, SieveError};

/// Create `path` (and missing parents) as a new, empty directory.
///
/// Fails with [`SieveError::AlreadyExists`] if anything is already at
/// `path`, so a run never mixes its output with a previous one.
pub fn create_empty_dir(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(SieveError::AlreadyExists(format!(
            "directory \"{}\" exists",
            path.display()
        )));
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}
