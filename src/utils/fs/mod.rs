//! File system utilities shared by the update pipeline and the pack installer
//!
//! - [`dirs`] - directory creation and recursive copies
//! - [`atomic`] - write-then-rename file updates
//!
//! Recursive deletion is intentionally not offered here; see
//! [`crate::utils::roots`].

pub mod atomic;
pub mod dirs;

pub use atomic::{atomic_write, safe_write};
pub use dirs::{copy_dir, copy_path, ensure_dir, ensure_parent_dir};
