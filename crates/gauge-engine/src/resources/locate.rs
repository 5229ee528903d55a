use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchRoot {
    dir: PathBuf,
    recursive: bool,
}

/// Finds resource files by name across an ordered list of directories.
///
/// Roots are searched in insertion order and the first match wins. A flat
/// root only looks at its direct entries; a recursive root walks its whole
/// subtree, depth first, entries in file-name order.
#[derive(Debug, Clone, Default)]
pub struct ResourceLocator {
    roots: Vec<SearchRoot>,
}

impl ResourceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory whose direct entries are searched.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.roots.push(SearchRoot { dir: dir.into(), recursive: false });
        self
    }

    /// Adds a directory searched with all its subdirectories.
    pub fn with_tree(mut self, dir: impl Into<PathBuf>) -> Self {
        self.roots.push(SearchRoot { dir: dir.into(), recursive: true });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Resolves `name`. Paths with more than one component, and absolute
    /// paths, are returned as-is when they exist.
    pub fn locate(&self, name: impl AsRef<Path>) -> Result<PathBuf> {
        let name = name.as_ref();
        if name.is_absolute() || name.components().count() > 1 {
            if name.is_file() {
                return Ok(name.to_path_buf());
            }
            bail!("resource {} does not exist", name.display());
        }

        for root in &self.roots {
            if !root.dir.is_dir() {
                log::trace!("resource root {} missing, skipped", root.dir.display());
                continue;
            }
            if let Some(found) = find_in(&root.dir, name, root.recursive) {
                log::debug!("resource {} resolved to {}", name.display(), found.display());
                return Ok(found);
            }
        }

        let searched: Vec<String> = self.roots.iter().map(|r| r.dir.display().to_string()).collect();
        bail!("resource {} not found (searched: {})", name.display(), searched.join(", "))
    }
}

fn find_in(dir: &Path, name: &Path, recursive: bool) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(rd) => rd.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        Err(e) => {
            log::warn!("cannot read {}: {e}", dir.display());
            return None;
        }
    };
    entries.sort();

    if let Some(hit) = entries
        .iter()
        .find(|p| p.is_file() && p.file_name() == Some(name.as_os_str()))
    {
        return Some(hit.clone());
    }
    if !recursive {
        return None;
    }
    entries
        .iter()
        .filter(|p| p.is_dir())
        .find_map(|sub| find_in(sub, name, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scratch(PathBuf);

    impl Scratch {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("gauge-locate-{tag}-{}", std::process::id()));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn touch(&self, rel: &str) -> PathBuf {
            let path = self.0.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"x").unwrap();
            path
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn first_root_wins() {
        let s = Scratch::new("order");
        s.touch("a/panel.png");
        let second = s.touch("b/panel.png");

        let loc = ResourceLocator::new().with_dir(s.0.join("missing")).with_dir(s.0.join("b")).with_dir(s.0.join("a"));
        assert_eq!(loc.locate("panel.png").unwrap(), second);
    }

    #[test]
    fn flat_root_ignores_subdirectories() {
        let s = Scratch::new("flat");
        let deep = s.touch("Resources/bitmaps/panel.png");

        assert!(ResourceLocator::new().with_dir(&s.0).locate("panel.png").is_err());
        assert_eq!(ResourceLocator::new().with_tree(&s.0).locate("panel.png").unwrap(), deep);
    }

    #[test]
    fn not_found_lists_searched_roots() {
        let s = Scratch::new("missing");
        let err = ResourceLocator::new().with_tree(&s.0).locate("nope.png").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nope.png"));
        assert!(msg.contains(&s.0.display().to_string()));
    }

    #[test]
    fn explicit_paths_bypass_roots() {
        let s = Scratch::new("explicit");
        let file = s.touch("x/panel.png");
        assert_eq!(ResourceLocator::new().locate(&file).unwrap(), file);
        assert!(ResourceLocator::new().locate(s.0.join("x/other.png")).is_err());
    }
}
