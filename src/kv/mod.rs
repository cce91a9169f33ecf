//! Key-value engine seam.
//!
//! Store никогда не разбирает формат сам: все чтения/записи идут через
//! `KvEngine::open(shadow_path)` -> `Box<dyn KvHandle>`. Хэндл буферизует
//! изменения до `flush()`; `status()` сообщает, чисто ли прошла последняя операция.
//!
//! Ключи dotted: `section.key`. Ключ без точки живёт в секции General.

use std::fmt;
use std::io;
use std::path::Path;

pub mod ini;

pub use ini::{IniEngine, IniHandle};

use crate::consts::GENERAL_SECTION;

/// Outcome of the last open/flush on a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvStatus {
    NoError,
    /// The backing file could not be read or written.
    AccessError,
    /// The backing file is malformed.
    FormatError,
}

impl KvStatus {
    #[inline]
    pub fn is_ok(self) -> bool {
        self == KvStatus::NoError
    }
}

impl fmt::Display for KvStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvStatus::NoError => write!(f, "no error"),
            KvStatus::AccessError => write!(f, "access error"),
            KvStatus::FormatError => write!(f, "format error"),
        }
    }
}

/// Live connection to one file through a key-value engine.
pub trait KvHandle {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
    /// All visible keys (file content plus pending writes), sorted.
    fn keys(&self) -> Vec<String>;
    /// Write pending changes to the backing file.
    fn flush(&mut self) -> KvStatus;
    fn status(&self) -> KvStatus;
}

/// Factory of handles over a file path.
pub trait KvEngine: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<Box<dyn KvHandle>>;
    /// Short engine name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Split `section.key` at the first dot. Keys without a dot go to General.
pub fn split_key(key: &str) -> (&str, &str) {
    match key.split_once('.') {
        Some((section, name)) if !section.is_empty() => (section, name),
        _ => (GENERAL_SECTION, key),
    }
}

/// Inverse of split_key: General keys are shown without a prefix.
pub fn join_key(section: &str, name: &str) -> String {
    if section == GENERAL_SECTION {
        name.to_string()
    } else {
        format!("{section}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_join_keys() {
        assert_eq!(split_key("meta.file_version"), ("meta", "file_version"));
        assert_eq!(split_key("a.b.c"), ("a", "b.c"));
        assert_eq!(split_key("plain"), (GENERAL_SECTION, "plain"));
        assert_eq!(split_key(".hidden"), (GENERAL_SECTION, ".hidden"));

        assert_eq!(join_key("meta", "file_version"), "meta.file_version");
        assert_eq!(join_key(GENERAL_SECTION, "plain"), "plain");
    }
}
