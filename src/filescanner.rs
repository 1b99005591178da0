use std::fs;
use std::path::PathBuf;

pub struct FileScanner {
    suffix: String,
}

impl FileScanner {
    pub fn new(extension: &str) -> Self {
        FileScanner {
            suffix: format!(".{}", extension),
        }
    }

    // Entries are classified with DirEntry::file_type, which does not
    // follow symlinks: a symlinked directory is never traversed, so a
    // cycle in the tree cannot loop the walk.
    pub fn scan(&self, root: &PathBuf) -> Vec<PathBuf> {
        let mut found = vec![];
        let mut dirpaths = vec![root.clone()];
        while let Some(current_dir) = dirpaths.pop() {
            match fs::read_dir(&current_dir) {
                Ok(entries) => {
                    for entry in entries.filter_map(|e| e.ok()) {
                        if let Ok(ft) = entry.file_type() {
                            if ft.is_file() && self.matches(&entry.path()) {
                                found.push(entry.path());
                            } else if ft.is_dir() {
                                dirpaths.push(entry.path());
                            }
                        }
                    }
                },
                Err(_) => (),
            };
        }

        found.sort();
        found
    }

    fn matches(&self, path: &PathBuf) -> bool {
        match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name.ends_with(&self.suffix),
            None => false,
        }
    }
}
