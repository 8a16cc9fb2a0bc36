//! Immutable hierarchical path names.
//!
//! A [`Path`] is the unit of addressing shared by every component of the
//! naming server and every storage-side interface: it never borrows, is
//! cheap to clone, and orders the way a sorted directory listing should.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::Path as StdPath;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid path '{0}'")]
    InvalidPath(String),
    #[error("root has no parent")]
    RootHasNoParent,
    #[error("local directory '{0}' not found")]
    NotFound(String),
    #[error("local path '{0}' is not a directory")]
    NotADirectory(String),
}

type Result<T> = std::result::Result<T, PathError>;

/// An immutable sequence of non-empty path components.
///
/// The canonical string form always starts with `/`; the root path is the
/// singleton string `"/"`. Components may contain neither `/` nor `:`.
#[derive(Debug, Clone, Serialize, Deserialize, Hash)]
pub struct Path {
    components: Vec<String>,
}

fn validate_component(component: &str) -> Result<()> {
    if component.is_empty() || component.contains('/') || component.contains(':') {
        return Err(PathError::InvalidPath(component.to_string()));
    }
    Ok(())
}

impl Path {
    /// The root path `/`.
    pub fn root() -> Self {
        Path { components: Vec::new() }
    }

    /// Parses a canonical path string such as `/a/b/c`.
    ///
    /// Empty components (from repeated or trailing slashes) are collapsed.
    pub fn new(s: &str) -> Result<Self> {
        if s.is_empty() || !s.starts_with('/') {
            return Err(PathError::InvalidPath(s.to_string()));
        }
        if s.contains(':') {
            return Err(PathError::InvalidPath(s.to_string()));
        }
        let components = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect();
        Ok(Path { components })
    }

    /// Returns a new path with `component` appended.
    pub fn join(&self, component: &str) -> Result<Self> {
        validate_component(component)?;
        let mut components = self.components.clone();
        components.push(component.to_string());
        Ok(Path { components })
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// The parent of this path. Fails at the root.
    pub fn parent(&self) -> Result<Self> {
        if self.is_root() {
            return Err(PathError::RootHasNoParent);
        }
        let mut components = self.components.clone();
        components.pop();
        Ok(Path { components })
    }

    /// The final component of this path. Fails at the root.
    pub fn last(&self) -> Result<&str> {
        self.components.last().map(String::as_str).ok_or(PathError::RootHasNoParent)
    }

    /// A single-pass iterator over this path's components.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Whether `other`'s component sequence is a prefix of (or equal to) this path's.
    pub fn is_subpath(&self, other: &Path) -> bool {
        other.components.len() <= self.components.len()
            && other.components.iter().zip(self.components.iter()).all(|(a, b)| a == b)
    }

    /// Walks a local directory on disk, returning every contained file path
    /// relative to `root_dir` as a [`Path`].
    pub fn list(root_dir: &StdPath) -> Result<Vec<Path>> {
        if !root_dir.exists() {
            return Err(PathError::NotFound(root_dir.display().to_string()));
        }
        if !root_dir.is_dir() {
            return Err(PathError::NotADirectory(root_dir.display().to_string()));
        }
        let mut out = Vec::new();
        walk(root_dir, root_dir, &mut out)?;
        Ok(out)
    }
}

fn walk(root: &StdPath, dir: &StdPath, out: &mut Vec<Path>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .map_err(|_| PathError::NotFound(dir.display().to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|_| PathError::NotFound(dir.display().to_string()))?;
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, out)?;
        } else {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let mut p = Path::root();
            for component in relative.components() {
                let s = component.as_os_str().to_string_lossy();
                p = p.join(&s).map_err(|_| PathError::InvalidPath(s.to_string()))?;
            }
            out.push(p);
        }
    }
    Ok(())
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            write!(f, "/")
        } else {
            for c in &self.components {
                write!(f, "/{c}")?;
            }
            Ok(())
        }
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}
impl Eq for Path {}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Prefix orders before extension; otherwise lexical on the component sequence.
impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut a = self.components.iter();
        let mut b = other.components.iter();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(x), Some(y)) => match x.cmp(y) {
                    Ordering::Equal => continue,
                    other => return other,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_collapses_empty_components() {
        let p = Path::new("/a//b/").unwrap();
        assert_eq!(p.to_string(), "/a/b");
        assert_eq!(p.parent().unwrap().to_string(), "/a");
        assert_eq!(p.last().unwrap(), "b");
    }

    #[test]
    fn is_subpath() {
        let p = Path::new("/a/b/c").unwrap();
        assert!(p.is_subpath(&Path::new("/a").unwrap()));
        assert!(!p.is_subpath(&Path::new("/a/b/c/d").unwrap()));
        assert!(p.is_subpath(&p));
    }

    #[test]
    fn root_has_no_parent_or_last() {
        let root = Path::root();
        assert!(root.is_root());
        assert_eq!(root.parent(), Err(PathError::RootHasNoParent));
        assert_eq!(root.last(), Err(PathError::RootHasNoParent));
    }

    #[test]
    fn invalid_construction() {
        assert!(Path::new("").is_err());
        assert!(Path::new("a/b").is_err());
        assert!(Path::new("/a:b").is_err());
        assert!(Path::root().join("a/b").is_err());
        assert!(Path::root().join("").is_err());
    }

    #[test]
    fn ordering_prefix_before_extension() {
        let a = Path::new("/a").unwrap();
        let ab = Path::new("/a/b").unwrap();
        assert_eq!(a.cmp(&ab), Ordering::Less);
        assert_eq!(ab.cmp(&a), Ordering::Greater);
        assert_eq!(a.cmp(&a), Ordering::Equal);
    }

    #[test]
    fn parse_of_display_is_identity() {
        for s in ["/", "/a", "/a/b/c", "/x/y"] {
            let p = Path::new(s).unwrap();
            assert_eq!(Path::new(&p.to_string()).unwrap(), p);
        }
    }
}
