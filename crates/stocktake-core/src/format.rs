//! Listing-style rendering of raw metadata.
//!
//! Every function here is pure and infallible: a value that cannot be
//! rendered falls back to a fixed sentinel instead of producing an error.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Datelike, Local};

/// File type mask of a raw mode.
pub const S_IFMT: u32 = 0o170000;
pub const S_IFSOCK: u32 = 0o140000;
pub const S_IFLNK: u32 = 0o120000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFBLK: u32 = 0o060000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFCHR: u32 = 0o020000;
pub const S_IFIFO: u32 = 0o010000;

pub const S_ISUID: u32 = 0o4000;
pub const S_ISGID: u32 = 0o2000;
pub const S_ISVTX: u32 = 0o1000;

/// Rendered in place of a timestamp that cannot be represented.
pub const INVALID_DATE: &str = "Jan  1  1970";

/// How often a [`ReferenceYear`] re-reads the clock.
pub const REFERENCE_YEAR_REFRESH: Duration = Duration::from_secs(60 * 60);

/// Type glyph for the file type bits of a raw mode.
pub fn type_glyph(raw_mode: u32) -> char {
    match raw_mode & S_IFMT {
        S_IFREG => '-',
        S_IFDIR => 'd',
        S_IFLNK => 'l',
        S_IFBLK => 'b',
        S_IFCHR => 'c',
        S_IFIFO => 'p',
        S_IFSOCK => 's',
        _ => '?',
    }
}

/// Render a raw mode as a 10-character `ls -l` permission string.
///
/// Execute positions carry the setuid, setgid and sticky overrides:
/// `s`/`S` for owner and group, `t`/`T` for other, lower case when the
/// underlying execute bit is also set.
pub fn permission_string(raw_mode: u32) -> String {
    let mut chars = [type_glyph(raw_mode), '-', '-', '-', '-', '-', '-', '-', '-', '-'];

    for (triple, shift) in [6u32, 3, 0].into_iter().enumerate() {
        let base = 1 + triple * 3;
        if raw_mode & (0o4 << shift) != 0 {
            chars[base] = 'r';
        }
        if raw_mode & (0o2 << shift) != 0 {
            chars[base + 1] = 'w';
        }
        if raw_mode & (0o1 << shift) != 0 {
            chars[base + 2] = 'x';
        }
    }

    chars[3] = special_glyph(chars[3], raw_mode & S_ISUID != 0, 's');
    chars[6] = special_glyph(chars[6], raw_mode & S_ISGID != 0, 's');
    chars[9] = special_glyph(chars[9], raw_mode & S_ISVTX != 0, 't');

    chars.iter().collect()
}

fn special_glyph(exec: char, special: bool, glyph: char) -> char {
    match (special, exec == 'x') {
        (false, _) => exec,
        (true, true) => glyph,
        (true, false) => glyph.to_ascii_uppercase(),
    }
}

/// Render a modification time the way `ls -l` does.
///
/// `"Mon DD HH:MM"` within `reference_year`, `"Mon DD  YYYY"` otherwise.
/// The day is space padded so the result is always 12 characters wide.
pub fn date_string(modified_at: SystemTime, reference_year: i32) -> String {
    match to_local(modified_at) {
        Some(local) if local.year() == reference_year => local.format("%b %e %H:%M").to_string(),
        Some(local) if (0..=9999).contains(&local.year()) => {
            local.format("%b %e  %Y").to_string()
        }
        _ => INVALID_DATE.to_string(),
    }
}

fn to_local(time: SystemTime) -> Option<DateTime<Local>> {
    let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => (i64::try_from(after.as_secs()).ok()?, after.subsec_nanos()),
        Err(err) => {
            let before = err.duration();
            let secs = -i64::try_from(before.as_secs()).ok()?;
            match before.subsec_nanos() {
                0 => (secs, 0),
                n => (secs - 1, 1_000_000_000 - n),
            }
        }
    };
    DateTime::from_timestamp(secs, nanos).map(|utc| utc.with_timezone(&Local))
}

/// Bytes occupied on disk when `actual_size` is stored in `block_size` units.
pub fn allocated_size(actual_size: u64, block_size: u64) -> u64 {
    if actual_size == 0 || block_size == 0 {
        return actual_size;
    }
    actual_size.div_ceil(block_size).saturating_mul(block_size)
}

/// Render the `"actual/allocated"` size pair.
pub fn size_display(actual_size: u64, allocated_size: u64) -> String {
    format!("{actual_size}/{allocated_size}")
}

/// The current local year, re-read from the clock at a coarse interval.
///
/// Entries formatted within one refresh window share a reference year, so
/// a scan that crosses New Year may render a few dates in the old style.
#[derive(Debug, Clone)]
pub struct ReferenceYear {
    year: i32,
    checked_at: Instant,
    refresh_every: Option<Duration>,
}

impl ReferenceYear {
    /// Track the local year, refreshing hourly.
    pub fn new() -> Self {
        Self {
            year: Local::now().year(),
            checked_at: Instant::now(),
            refresh_every: Some(REFERENCE_YEAR_REFRESH),
        }
    }

    /// Pin the reference year. Never refreshes.
    pub fn fixed(year: i32) -> Self {
        Self {
            year,
            checked_at: Instant::now(),
            refresh_every: None,
        }
    }

    /// Get the reference year, refreshing it if the window has elapsed.
    pub fn get(&mut self) -> i32 {
        if let Some(every) = self.refresh_every {
            if self.checked_at.elapsed() >= every {
                self.year = Local::now().year();
                self.checked_at = Instant::now();
            }
        }
        self.year
    }
}

impl Default for ReferenceYear {
    fn default() -> Self {
        Self::new()
    }
}
