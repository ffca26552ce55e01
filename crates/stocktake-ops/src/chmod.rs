//! Permission strings back to mode bits.

use std::path::Path;

use stocktake_core::format::{S_ISGID, S_ISUID, S_ISVTX};

use crate::MutationError;

/// Glyphs accepted in the type position.
pub const TYPE_GLYPHS: [char; 8] = ['-', 'd', 'l', 'b', 'c', 'p', 's', '?'];

/// Read and write positions with the bit each one sets.
const READ_WRITE: [(usize, char, u32); 6] = [
    (1, 'r', 0o400),
    (2, 'w', 0o200),
    (4, 'r', 0o040),
    (5, 'w', 0o020),
    (7, 'r', 0o004),
    (8, 'w', 0o002),
];

/// Execute positions: index, execute bit, special bit, special glyph.
const EXECUTE: [(usize, u32, u32, char); 3] = [
    (3, 0o100, S_ISUID, 's'),
    (6, 0o010, S_ISGID, 's'),
    (9, 0o001, S_ISVTX, 't'),
];

/// Parse a 10-character listing string such as `-rwxr-x--T` into the
/// twelve permission bits (owner, group, other, setuid, setgid, sticky).
///
/// The type glyph is validated but does not contribute to the result.
pub fn parse_permission_string(value: &str) -> Result<u32, MutationError> {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() != 10 {
        return Err(MutationError::invalid_format(
            value,
            format!("expected 10 characters, got {}", chars.len()),
        ));
    }

    if !TYPE_GLYPHS.contains(&chars[0]) {
        return Err(MutationError::invalid_format(
            value,
            format!("unknown type glyph '{}'", chars[0]),
        ));
    }

    let mut mode = 0;

    for (idx, glyph, bit) in READ_WRITE {
        match chars[idx] {
            c if c == glyph => mode |= bit,
            '-' => {}
            other => return Err(unexpected(value, idx, other, &[glyph, '-'])),
        }
    }

    for (idx, exec_bit, special_bit, special) in EXECUTE {
        match chars[idx] {
            'x' => mode |= exec_bit,
            '-' => {}
            c if c == special => mode |= exec_bit | special_bit,
            c if c == special.to_ascii_uppercase() => mode |= special_bit,
            other => {
                return Err(unexpected(
                    value,
                    idx,
                    other,
                    &['x', '-', special, special.to_ascii_uppercase()],
                ));
            }
        }
    }

    Ok(mode)
}

fn unexpected(value: &str, idx: usize, found: char, allowed: &[char]) -> MutationError {
    let allowed: String = allowed.iter().collect();
    MutationError::invalid_format(
        value,
        format!("'{found}' at position {idx}, expected one of \"{allowed}\""),
    )
}

/// Set the permission bits of `path`.
#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

/// Only the read-only flag can be expressed; it follows the owner write bit.
#[cfg(not(unix))]
pub(crate) fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    std::fs::set_permissions(path, permissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stocktake_core::format::{S_IFDIR, S_IFREG, permission_string};

    #[test]
    fn test_parse_basic() {
        assert_eq!(parse_permission_string("-rw-r--r--").unwrap(), 0o644);
        assert_eq!(parse_permission_string("drwxr-xr-x").unwrap(), 0o755);
        assert_eq!(parse_permission_string("----------").unwrap(), 0);
    }

    #[test]
    fn test_parse_special_bits() {
        assert_eq!(parse_permission_string("drwxrwxrwt").unwrap(), 0o1777);
        assert_eq!(parse_permission_string("drwxrwxrwT").unwrap(), 0o1776);
        assert_eq!(parse_permission_string("-rwsr-xr-x").unwrap(), 0o4755);
        assert_eq!(parse_permission_string("-rw-r-Sr--").unwrap(), 0o2644);
    }

    #[test]
    fn test_parse_inverts_rendering() {
        for mode in [0o000, 0o644, 0o755, 0o1777, 0o4711, 0o2070, 0o7000, 0o7777] {
            let rendered = permission_string(S_IFREG | mode);
            assert_eq!(parse_permission_string(&rendered).unwrap(), mode, "{rendered}");
        }
        assert_eq!(
            parse_permission_string(&permission_string(S_IFDIR | 0o1750)).unwrap(),
            0o1750
        );
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = parse_permission_string("rwxr-xr-").unwrap_err();
        assert!(matches!(err, MutationError::InvalidPermissionFormat { .. }));
        assert!(parse_permission_string("-rwxr-xr-x-").is_err());
        assert!(parse_permission_string("").is_err());
    }

    #[test]
    fn test_rejects_bad_glyphs() {
        assert!(parse_permission_string("xrwxr-xr-x").is_err());
        assert!(parse_permission_string("-wrxr-xr-x").is_err());
        assert!(parse_permission_string("-rwtr-xr-x").is_err());
        assert!(parse_permission_string("-rwxr-xr-s").is_err());
        assert!(parse_permission_string("-rwxr-xr-ä").is_err());
    }

    #[test]
    fn test_error_names_position() {
        let err = parse_permission_string("-rwxr-xr-q").unwrap_err();
        assert!(err.to_string().contains("position 9"));
    }
}
