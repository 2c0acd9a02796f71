//! Root-relative paths inside a file tree.

use std::fmt;

/// Why a string could not become a [`Path`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A `..` component would climb above the tree root.
    #[error("path '{path}' escapes the tree root")]
    EscapesRoot { path: String },

    /// A component contains a character that cannot appear in a file name.
    #[error("bad component '{component}' (segment {position}): {message}")]
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
}

/// A normalized path relative to the root of a tree.
///
/// The root is the empty path. Parsing is lexical: `.` components are
/// dropped and `..` pops the previous component, so a parsed path can never
/// address anything outside the tree it is applied to.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    pub components: Vec<String>,
}

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Path {
            components: Vec::new(),
        }
    }

    /// Parse a slash-separated path string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use layerfs_core_store::Path;
    ///
    /// let path = Path::parse("/assets/./css/site.css").unwrap();
    /// assert_eq!(path.len(), 3);
    ///
    /// // Leading and trailing slashes are normalized
    /// assert_eq!(Path::parse("/foo/bar/").unwrap(), Path::parse("foo/bar").unwrap());
    ///
    /// // Climbing above the root is rejected
    /// assert!(Path::parse("../etc/passwd").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let mut components: Vec<String> = Vec::new();

        for (i, component) in s.split('/').enumerate() {
            match component {
                "" | "." => {}
                ".." => {
                    if components.pop().is_none() {
                        return Err(PathError::EscapesRoot {
                            path: s.to_string(),
                        });
                    }
                }
                c => {
                    Self::validate_component(c, i)?;
                    components.push(c.to_string());
                }
            }
        }

        Ok(Path { components })
    }

    fn validate_component(component: &str, position: usize) -> Result<(), PathError> {
        if component.contains('\0') {
            return Err(PathError::InvalidComponent {
                component: component.escape_default().to_string(),
                position,
                message: "contains a NUL byte".to_string(),
            });
        }
        Ok(())
    }

    /// True for `/`.
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Same as [`Path::is_root`].
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.components.iter()
    }

    /// The final component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// The containing directory. The root has no parent.
    pub fn parent(&self) -> Option<Path> {
        if self.components.is_empty() {
            return None;
        }
        Some(Path {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    /// Append a single name to this path.
    #[must_use]
    pub fn child(&self, name: &str) -> Path {
        let mut components = self.components.clone();
        components.push(name.to_string());
        Path { components }
    }

    /// `other` appended below this path.
    #[must_use]
    pub fn join(&self, other: &Path) -> Path {
        let mut components = self.components.clone();
        components.extend(other.components.iter().cloned());
        Path { components }
    }

    /// Whether `prefix` names this path or one of its ancestors.
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        prefix.components.len() <= self.components.len()
            && prefix.components == self.components[..prefix.components.len()]
    }

    /// This path relative to `prefix`, or `None` when it lies elsewhere.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Path> {
        if self.has_prefix(prefix) {
            Some(Path {
                components: self.components[prefix.components.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// Every proper ancestor, from the root down to the parent.
    pub fn ancestors(&self) -> impl Iterator<Item = Path> + '_ {
        (0..self.components.len()).map(move |n| Path {
            components: self.components[..n].to_vec(),
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.components.join("/"))
    }
}

impl std::ops::Index<usize> for Path {
    type Output = String;

    fn index(&self, i: usize) -> &Self::Output {
        &self.components[i]
    }
}

/// Build a [`Path`] from a literal, panicking if it does not parse.
///
/// # Example
///
/// ```rust
/// use layerfs_core_store::path;
///
/// let p = path!("static/index.html");
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::Path::parse($s).expect("invalid path literal")
    };
}
