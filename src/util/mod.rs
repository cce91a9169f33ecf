//! util: общие файловые хелперы протокола.
//!
//! Содержит:
//! - absolute(): сделать путь абсолютным относительно cwd (без нормализации).
//! - with_suffix(): `<path><suffix>` без потери не-UTF-8 байт.
//! - remove_if_exists(): удалить файл, "не существовал" не ошибка.
//! - file_crc32(): CRC32 содержимого файла (crc32fast, потоково).
//! - sync_path(): fsync существующего файла.

use crc32fast::Hasher as Crc32;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Absolute form of `path`; relative paths are joined onto the current directory.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Append `suffix` to the last path component: `a/b.ini` + `~` -> `a/b.ini~`.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Remove a file. Returns Ok(false) when it did not exist.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// True if `path` exists and is a regular file.
#[inline]
pub fn is_existing_file(path: &Path) -> bool {
    path.is_file()
}

pub fn file_crc32(path: &Path) -> io::Result<u32> {
    let mut f = File::open(path)?;
    let mut hasher = Crc32::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

pub fn sync_path(path: &Path) -> io::Result<()> {
    let f = OpenOptions::new().read(true).write(true).open(path)?;
    f.sync_all()
}
