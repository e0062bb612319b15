//! Utility functions for directory management
//!
//! Helper functions following the XDG Base Directory specification for
//! portable storage of saved forwarding lists across Linux distributions.
//!
//! # Directory Structure
//!
//! - Data: `~/.local/share/portward/` - Application data
//! - Lists: `~/.local/share/portward/lists/` - Saved forwarding lists

use directories::ProjectDirs;
use std::path::PathBuf;

pub fn get_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "portward", "portward").map(|pd| pd.data_dir().to_path_buf())
}

/// Directory holding saved forwarding-list files.
pub fn get_lists_dir() -> Option<PathBuf> {
    get_data_dir().map(|mut dir| {
        dir.push("lists");
        dir
    })
}

/// Creates the data directories if missing.
///
/// On Unix the directories are created 0o700 so saved lists stay private to
/// the user.
pub fn ensure_dirs() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::fs::DirBuilder;
        use std::os::unix::fs::DirBuilderExt;

        let mut builder = DirBuilder::new();
        builder.mode(0o700);
        builder.recursive(true);

        if let Some(dir) = get_lists_dir() {
            builder.create(dir)?;
        }
    }

    #[cfg(not(unix))]
    {
        if let Some(dir) = get_lists_dir() {
            std::fs::create_dir_all(dir)?;
        }
    }

    Ok(())
}
