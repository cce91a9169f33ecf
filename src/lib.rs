#![allow(non_snake_case)]

// Базовые модули
pub mod consts;
pub mod error;
pub mod metrics;
pub mod config;

// Протокол: backup locator, shadow copy, реестр хэндлов
pub mod backup;
pub mod shadow;
pub mod registry;

// Движок key-value (INI по умолчанию)
pub mod kv;

// Публичный Store (open/create/save/remove)
pub mod store;

// Утилиты (absolute, with_suffix, remove_if_exists, crc32 ...)
pub mod util;

// Удобные реэкспорты
pub use config::{PublishMode, StoreBuilder, StoreConfig};
pub use consts::{UNKNOWN_FILE_VERSION, VERSION_KEY};
pub use error::{Result, StoreError};
pub use kv::{IniEngine, KvEngine, KvHandle, KvStatus};
pub use registry::HandleId;
pub use store::{Store, StoreStatus, TeardownReport};
