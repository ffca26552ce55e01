//! Rename target resolution and file name validation.

use std::path::{Path, PathBuf};

/// Path `source` would have after being renamed to `new_name`.
pub fn sibling_path(source: &Path, new_name: &str) -> PathBuf {
    let parent = source.parent().unwrap_or(Path::new(""));
    parent.join(new_name)
}

/// Validate a single path component for use as a new name.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > 255 {
        return Err("Name is too long (max 255 bytes)".into());
    }

    for c in ['/', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain '{}'", c.escape_default()));
        }
    }

    #[cfg(target_os = "windows")]
    {
        for c in ['\\', ':', '*', '?', '"', '<', '>', '|'] {
            if name.contains(c) {
                return Err(format!("Name cannot contain '{}'", c));
            }
        }
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    Ok(())
}
