//! Clone catalog: the fixed, ordered set of clones being surveyed.
//!
//! ## Directory layout
//!
//! ```text
//! <root>/count            number of clones N
//! <root>/<i>/             one directory per clone, 0 <= i < N
//! <root>/<i>/ext_id       optional external identifier (defaults to "<i>")
//! <root>/<i>/pattern.pr   optional selection probability (defaults to 0)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

const COUNT_FILE: &str = "count";
const EXT_ID_FILE: &str = "ext_id";
const PR_FILE: &str = "pattern.pr";

/// A reference to one clone in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloneRef {
    pub index: usize,
    pub ext_id: String,
    pub dir: PathBuf,
    pub selection_pr: f64,
}

/// Ordered, read-only collection of clones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloneCatalog {
    clones: Vec<CloneRef>,
}

impl CloneCatalog {
    /// Build a catalog from clone refs.
    ///
    /// Each ref's `index` must equal its position.
    pub fn new(clones: Vec<CloneRef>) -> Result<Self> {
        for (pos, c) in clones.iter().enumerate() {
            if c.index != pos {
                bail!("clone at position {pos} has index {}", c.index);
            }
        }
        Ok(Self { clones })
    }

    /// Load a catalog from a clone directory tree.
    pub fn load_dir(root: &Path) -> Result<Self> {
        let count = read_count(root)?;
        let mut clones = Vec::with_capacity(count);

        for index in 0..count {
            let dir = root.join(index.to_string());
            if !dir.is_dir() {
                bail!("Missing clone directory: {}", dir.display());
            }
            let ext_id = read_ext_id(&dir)?.unwrap_or_else(|| index.to_string());
            let selection_pr = read_selection_pr(&dir);
            clones.push(CloneRef {
                index,
                ext_id,
                dir,
                selection_pr,
            });
        }

        tracing::debug!(root = %root.display(), count, "loaded clone catalog");
        Ok(Self { clones })
    }

    /// Number of clones.
    #[must_use]
    pub fn count(&self) -> usize {
        self.clones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clones.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CloneRef> {
        self.clones.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CloneRef> {
        self.clones.iter()
    }

    /// All valid clone indices, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        0..self.clones.len()
    }
}

fn read_count(root: &Path) -> Result<usize> {
    let path = root.join(COUNT_FILE);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read clone count: {}", path.display()))?;
    content
        .trim()
        .parse()
        .with_context(|| format!("Invalid clone count in {}", path.display()))
}

fn read_ext_id(dir: &Path) -> Result<Option<String>> {
    let path = dir.join(EXT_ID_FILE);
    match fs::read_to_string(&path) {
        Ok(content) => {
            let id = content.trim();
            Ok((!id.is_empty()).then(|| id.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// A missing or unparsable probability is logged and treated as zero.
fn read_selection_pr(dir: &Path) -> f64 {
    let path = dir.join(PR_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "no selection probability");
            return 0.0;
        }
    };
    match content.trim().parse::<f64>() {
        Ok(pr) if pr.is_finite() => pr,
        Ok(pr) => {
            tracing::warn!(path = %path.display(), pr, "non-finite selection probability");
            0.0
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid selection probability");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_clone(root: &Path, index: usize, ext_id: Option<&str>, pr: Option<&str>) {
        let dir = root.join(index.to_string());
        fs::create_dir_all(&dir).unwrap();
        if let Some(id) = ext_id {
            fs::write(dir.join(EXT_ID_FILE), id).unwrap();
        }
        if let Some(pr) = pr {
            fs::write(dir.join(PR_FILE), pr).unwrap();
        }
    }

    #[test]
    fn test_load_dir() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(COUNT_FILE), "3\n").unwrap();
        write_clone(root, 0, Some("alpha\n"), Some("0.25\n"));
        write_clone(root, 1, None, Some("0.5"));
        write_clone(root, 2, None, None);

        let catalog = CloneCatalog::load_dir(root).unwrap();
        assert_eq!(catalog.count(), 3);

        let first = catalog.get(0).unwrap();
        assert_eq!(first.ext_id, "alpha");
        assert!((first.selection_pr - 0.25).abs() < f64::EPSILON);
        assert_eq!(first.dir, root.join("0"));

        assert_eq!(catalog.get(1).unwrap().ext_id, "1");
        assert!(catalog.get(2).unwrap().selection_pr.abs() < f64::EPSILON);
        assert!(catalog.get(3).is_none());
    }

    #[test]
    fn test_load_dir_bad_probability_defaults_to_zero() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(COUNT_FILE), "1").unwrap();
        write_clone(root, 0, None, Some("not a number"));

        let catalog = CloneCatalog::load_dir(root).unwrap();
        assert!(catalog.get(0).unwrap().selection_pr.abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_dir_missing_count() {
        let dir = tempdir().unwrap();
        assert!(CloneCatalog::load_dir(dir.path()).is_err());
    }

    #[test]
    fn test_load_dir_missing_clone_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(COUNT_FILE), "2").unwrap();
        write_clone(root, 0, None, None);

        let err = CloneCatalog::load_dir(root).unwrap_err();
        assert!(err.to_string().contains("Missing clone directory"));
    }

    #[test]
    fn test_new_checks_positions() {
        let good = CloneRef {
            index: 0,
            ext_id: "a".to_string(),
            dir: PathBuf::from("/c/0"),
            selection_pr: 0.1,
        };
        let mut bad = good.clone();
        bad.index = 5;

        assert!(CloneCatalog::new(vec![good.clone()]).is_ok());
        assert!(CloneCatalog::new(vec![good, bad]).is_err());
        assert_eq!(CloneCatalog::default().indices().count(), 0);
    }
}
