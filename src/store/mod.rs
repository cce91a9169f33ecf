//! store: публичный объект Store (shadow copy + реестр хэндлов + publish).
//!
//! Раскладка:
//! - core:    структура Store, доступ к хэндлам, версия, teardown (close/Drop), status
//! - open:    open/create (BackupLocator -> ShadowCopy::materialize -> чтение версии)
//! - save:    flush всех хэндлов + publish в canonical или backup
//! - publish: delete-then-copy / atomic rename + проверка результата
//! - remove:  удаление canonical, backup и (если хэндлов нет) shadow
//!
//! Конкурентность: один Store обслуживается одним потоком за раз; несколько
//! процессов над одним canonical path не координируются (ответственность вызывающего).
//! Внутри процесса то же самое: shadow path зависит только от canonical path,
//! поэтому второй Store на тот же путь (в т.ч. read-only) перезаписывает shadow
//! первого при open и удаляет его при teardown. Держите не больше одного Store
//! на путь.

mod core;
mod open;
mod publish;
mod remove;
mod save;

pub use self::core::{Store, StoreStatus, TeardownReport};
