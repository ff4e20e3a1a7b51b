//! Cross-platform utilities
//!
//! - [`fs`] - directory copies and atomic writes
//! - [`platform`] - home/data directory lookup and path expansion
//! - [`roots`] - the managed-roots guard every destructive operation passes through

pub mod fs;
pub mod platform;
pub mod roots;

pub use fs::{atomic_write, copy_dir, copy_path, ensure_dir, safe_write};
pub use platform::{is_windows, resolve_path};
pub use roots::ManagedRoots;
