//! Filesystem module.
//!
//! Provides:
//! - Storage root and folder management
//! - Filename generation and sanitization
//! - Per-folder harvest progress

pub mod naming;
pub mod paths;
pub mod progress;

pub use naming::{attachment_filename, sanitize_filename, sanitize_path_component};
pub use paths::{ensure_dir, get_folder_path, list_folders};
pub use progress::{FolderProgress, ProgressStore};
