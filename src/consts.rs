//! Общие константы on-disk раскладки (canonical / backup / shadow) и зарезервированных ключей.

// -------- Backup (draft) --------
/// Суффикс черновика: `<path>~`.
pub const BACKUP_SUFFIX: &str = "~";

// -------- Shadow working copy --------
/// Имя каталога под системным temp dir, где живут shadow-копии.
pub const TEMP_ROOT_DIR: &str = "IniVault";

/// Суффикс промежуточного файла при PublishMode::AtomicRename.
pub const PUBLISH_TMP_SUFFIX: &str = ".publish";

// -------- Reserved keys --------
pub const VERSION_KEY: &str = "meta.file_version";

/// Sentinel for a store whose version key is absent or unparsable.
pub const UNKNOWN_FILE_VERSION: i32 = -1;

// -------- INI engine --------
/// Section for keys written without a `section.` prefix.
pub const GENERAL_SECTION: &str = "General";

// -------- Env --------
pub const ENV_TEMP_ROOT: &str = "INIVAULT_TEMP_ROOT";
pub const ENV_PUBLISH_MODE: &str = "INIVAULT_PUBLISH_MODE";
pub const ENV_VERIFY_CRC: &str = "INIVAULT_VERIFY_CRC";
pub const ENV_FSYNC: &str = "INIVAULT_FSYNC";
