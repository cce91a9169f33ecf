//! Shadow working copy: private file under the temp root where every edit lands
//! before it is published to the canonical or backup path.
//!
//! - path: deterministic `<temp_root>/<base64url(sha256(canonical))>`
//! - copy: materialize (remove stale + copy source) and best-effort teardown

pub mod copy;
pub mod path;

pub use copy::ShadowCopy;
pub use path::{derive_shadow_path, shadow_id};
