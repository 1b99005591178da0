use std::fs;
use std::path::PathBuf;

pub enum DirEntryCategory {
    DoesNotExist,
    RegularFile,
    SymbolicLink,
    Directory,
    Unknown,
}

pub fn classify_file(path: &PathBuf) -> DirEntryCategory {
    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.is_symlink() {
                DirEntryCategory::SymbolicLink
            } else if metadata.is_file() {
                DirEntryCategory::RegularFile
            } else if metadata.is_dir() {
                DirEntryCategory::Directory
            } else {
                DirEntryCategory::Unknown
            }
        },
        Err(_) => DirEntryCategory::DoesNotExist,
    }
}

// Mirror the candidate's position under the source root onto the
// destination root. None when the path is not under the source root.
pub fn map_to_destination(source_root: &PathBuf, destination_root: &PathBuf, path: &PathBuf) -> Option<PathBuf> {
    match path.strip_prefix(source_root) {
        Ok(relative) => Some(destination_root.join(relative)),
        Err(_) => None,
    }
}

pub fn ensure_parent_dirs(path: &PathBuf) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}
